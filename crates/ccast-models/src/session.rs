//! Chunked upload session bookkeeping.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::id::SessionId;
use crate::status::{InvalidTransition, SessionStatus};

/// Sessions stop accepting chunks once older than this many hours.
/// Enforced at chunk-write time only; stale rows are pruned out of band.
pub const SESSION_TTL_HOURS: i64 = 24;

/// Bookkeeping record for one in-progress chunked upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadSession {
    pub session_id: SessionId,

    /// Client-declared original filename.
    pub filename: String,

    /// Client-declared total size in bytes.
    pub file_size_bytes: u64,

    /// Number of chunks the client will send.
    pub total_chunks: u32,

    /// Indices received so far. Ordered so missing-chunk reports are
    /// deterministic; duplicates collapse.
    #[serde(default)]
    pub received_chunks: BTreeSet<u32>,

    #[serde(default)]
    pub status: SessionStatus,

    pub created_at: DateTime<Utc>,
}

/// Snapshot returned by progress queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadProgress {
    pub received: u32,
    pub total: u32,
    /// Percentage rounded to 2 decimal places.
    pub percentage: f64,
}

impl UploadSession {
    /// Create a fresh `pending` session with an empty received-set.
    pub fn new(filename: impl Into<String>, file_size_bytes: u64, total_chunks: u32) -> Self {
        Self {
            session_id: SessionId::new(),
            filename: filename.into(),
            file_size_bytes,
            total_chunks,
            received_chunks: BTreeSet::new(),
            status: SessionStatus::Pending,
            created_at: Utc::now(),
        }
    }

    /// Record a received chunk index. Returns `false` when the index had
    /// already been recorded (set semantics).
    pub fn record_chunk(&mut self, index: u32) -> bool {
        self.received_chunks.insert(index)
    }

    /// True once every index in `[0, total_chunks)` has been received.
    pub fn is_complete(&self) -> bool {
        self.received_chunks.len() as u32 == self.total_chunks
    }

    /// Ascending list of indices still missing from `[0, total_chunks)`.
    pub fn missing_chunks(&self) -> Vec<u32> {
        (0..self.total_chunks)
            .filter(|i| !self.received_chunks.contains(i))
            .collect()
    }

    /// Progress snapshot with 2-decimal rounding.
    pub fn progress(&self) -> UploadProgress {
        let received = self.received_chunks.len() as u32;
        let percentage = if self.total_chunks == 0 {
            0.0
        } else {
            let raw = 100.0 * received as f64 / self.total_chunks as f64;
            (raw * 100.0).round() / 100.0
        };
        UploadProgress {
            received,
            total: self.total_chunks,
            percentage,
        }
    }

    /// Expiry check against an explicit clock, for testability.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now - self.created_at > Duration::hours(SESSION_TTL_HOURS)
    }

    /// Expiry check against the wall clock.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Mark the session consumed by a successful assembly run.
    pub fn complete(&mut self) -> Result<(), InvalidTransition> {
        self.transition(SessionStatus::Completed)
    }

    /// Mark the session failed.
    pub fn fail(&mut self) -> Result<(), InvalidTransition> {
        self.transition(SessionStatus::Failed)
    }

    fn transition(&mut self, next: SessionStatus) -> Result<(), InvalidTransition> {
        if !self.status.can_transition_to(next) {
            return Err(InvalidTransition::new(
                "session",
                self.status.as_str(),
                next.as_str(),
            ));
        }
        self.status = next;
        Ok(())
    }
}
