//! Status machines for sessions, videos and quality renditions.
//!
//! The source of truth for legal transitions lives here: records in
//! [`crate::session`] and [`crate::video`] only mutate their status through
//! methods that consult these predicates, so an illegal transition surfaces
//! as an [`InvalidTransition`] error at the call site instead of a silently
//! corrupted string field.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Returned when a record is asked to perform a transition its current
/// state does not allow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("illegal {entity} transition: {from} -> {to}")]
pub struct InvalidTransition {
    pub entity: &'static str,
    pub from: &'static str,
    pub to: &'static str,
}

impl InvalidTransition {
    pub(crate) fn new(entity: &'static str, from: &'static str, to: &'static str) -> Self {
        Self { entity, from, to }
    }
}

/// Upload session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Accepting chunks
    #[default]
    Pending,
    /// Consumed by a successful assembly run
    Completed,
    /// Assembly aborted
    Failed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Pending => "pending",
            SessionStatus::Completed => "completed",
            SessionStatus::Failed => "failed",
        }
    }

    /// A session only ever leaves `pending`.
    pub fn can_transition_to(&self, next: SessionStatus) -> bool {
        matches!(
            (*self, next),
            (
                SessionStatus::Pending,
                SessionStatus::Completed | SessionStatus::Failed
            )
        )
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Video aggregate lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VideoStatus {
    /// Placeholder returned before assembly has run
    #[default]
    Pending,
    /// Assembled; quality jobs in flight
    Processing,
    /// Every quality rendition reached a terminal state
    Completed,
    /// Assembly-level failure
    Failed,
}

impl VideoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoStatus::Pending => "pending",
            VideoStatus::Processing => "processing",
            VideoStatus::Completed => "completed",
            VideoStatus::Failed => "failed",
        }
    }

    /// Check if this is a terminal state (no more automatic transitions).
    pub fn is_terminal(&self) -> bool {
        matches!(self, VideoStatus::Completed | VideoStatus::Failed)
    }

    pub fn can_transition_to(&self, next: VideoStatus) -> bool {
        matches!(
            (*self, next),
            (VideoStatus::Pending, VideoStatus::Processing)
                | (
                    VideoStatus::Processing,
                    VideoStatus::Completed | VideoStatus::Failed
                )
        )
    }
}

impl fmt::Display for VideoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-rendition lifecycle.
///
/// Unlike [`VideoStatus`], a failed rendition may re-enter `processing`
/// when the queue redelivers its transcode job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QualityStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
}

impl QualityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityStatus::Pending => "pending",
            QualityStatus::Processing => "processing",
            QualityStatus::Completed => "completed",
            QualityStatus::Failed => "failed",
        }
    }

    /// Check if this is a terminal state for aggregate accounting.
    pub fn is_terminal(&self) -> bool {
        matches!(self, QualityStatus::Completed | QualityStatus::Failed)
    }

    pub fn can_transition_to(&self, next: QualityStatus) -> bool {
        match (*self, next) {
            // restart covers redelivery of a crashed or failed job
            (QualityStatus::Pending, QualityStatus::Processing)
            | (QualityStatus::Processing, QualityStatus::Processing)
            | (QualityStatus::Failed, QualityStatus::Processing) => true,
            (QualityStatus::Processing, QualityStatus::Completed | QualityStatus::Failed) => true,
            _ => false,
        }
    }
}

impl fmt::Display for QualityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
