//! Unit-of-work shapes handed to the worker pool.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ccast_models::{JobId, QualityLevel, SessionId, VideoId};

/// Job to reassemble a completed upload session into a video asset.
///
/// Enqueued once per session by `completeUpload`. On success it fans out
/// one [`TranscodeJob`] per quality level and one [`GenerateThumbnailJob`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssembleSessionJob {
    pub job_id: JobId,
    pub session_id: SessionId,
    pub created_at: DateTime<Utc>,
}

impl AssembleSessionJob {
    pub fn new(session_id: SessionId) -> Self {
        Self {
            job_id: JobId::new(),
            session_id,
            created_at: Utc::now(),
        }
    }

    /// Generate idempotency key for deduplication.
    pub fn idempotency_key(&self) -> String {
        format!("assemble:{}", self.session_id)
    }
}

/// Job to transcode one video into one quality rendition.
///
/// The only unit of work in the pipeline that is retryable by default: a
/// failure re-raises so the transport redelivers it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscodeJob {
    pub job_id: JobId,
    pub video_id: VideoId,
    pub quality: QualityLevel,
    pub created_at: DateTime<Utc>,
}

impl TranscodeJob {
    pub fn new(video_id: VideoId, quality: QualityLevel) -> Self {
        Self {
            job_id: JobId::new(),
            video_id,
            quality,
            created_at: Utc::now(),
        }
    }

    /// Generate idempotency key for deduplication.
    pub fn idempotency_key(&self) -> String {
        format!("transcode:{}:{}", self.video_id, self.quality)
    }
}

/// Best-effort job to capture a poster frame for a video. Never requests
/// a retry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateThumbnailJob {
    pub job_id: JobId,
    pub video_id: VideoId,
    pub created_at: DateTime<Utc>,
}

impl GenerateThumbnailJob {
    pub fn new(video_id: VideoId) -> Self {
        Self {
            job_id: JobId::new(),
            video_id,
            created_at: Utc::now(),
        }
    }

    /// Generate idempotency key for deduplication.
    pub fn idempotency_key(&self) -> String {
        format!("thumbnail:{}", self.video_id)
    }
}

/// Closed set of unit-of-work shapes, dispatched by a single worker
/// entry point.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PipelineJob {
    /// Reassemble a completed upload session
    AssembleSession(AssembleSessionJob),
    /// Produce one quality rendition
    Transcode(TranscodeJob),
    /// Best-effort poster frame capture
    GenerateThumbnail(GenerateThumbnailJob),
}

impl PipelineJob {
    pub fn job_id(&self) -> &JobId {
        match self {
            PipelineJob::AssembleSession(j) => &j.job_id,
            PipelineJob::Transcode(j) => &j.job_id,
            PipelineJob::GenerateThumbnail(j) => &j.job_id,
        }
    }

    /// Short name used in logs and metrics fields.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineJob::AssembleSession(_) => "assemble_session",
            PipelineJob::Transcode(_) => "transcode",
            PipelineJob::GenerateThumbnail(_) => "generate_thumbnail",
        }
    }

    /// Video this job operates on, if it already exists.
    pub fn video_id(&self) -> Option<&VideoId> {
        match self {
            PipelineJob::AssembleSession(_) => None,
            PipelineJob::Transcode(j) => Some(&j.video_id),
            PipelineJob::GenerateThumbnail(j) => Some(&j.video_id),
        }
    }

    pub fn idempotency_key(&self) -> String {
        match self {
            PipelineJob::AssembleSession(j) => j.idempotency_key(),
            PipelineJob::Transcode(j) => j.idempotency_key(),
            PipelineJob::GenerateThumbnail(j) => j.idempotency_key(),
        }
    }

    /// Whether a failure of this job should be redelivered by the
    /// transport. Only transcode failures are retryable by default.
    pub fn retry_on_failure(&self) -> bool {
        matches!(self, PipelineJob::Transcode(_))
    }
}
