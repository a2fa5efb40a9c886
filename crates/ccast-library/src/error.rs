//! Library error types.
//!
//! Every caller-facing failure kind carries a stable machine-readable
//! code (see [`LibraryError::code`]) alongside the human message.

use thiserror::Error;

use ccast_models::{LessonId, SessionId, VideoId, VideoStatus};
use ccast_store::StoreError;

pub type LibraryResult<T> = Result<T, LibraryError>;

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("unknown upload session: {0}")]
    InvalidSession(SessionId),

    #[error("upload session expired: {0}")]
    ExpiredSession(SessionId),

    #[error("chunk index {index} out of range [0, {total})")]
    InvalidChunk { index: u32, total: u32 },

    #[error("upload incomplete, missing chunks: {missing:?}")]
    IncompleteUpload { missing: Vec<u32> },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("video not found: {0}")]
    VideoNotFound(VideoId),

    #[error("lesson not found: {0}")]
    LessonNotFound(LessonId),

    #[error("video not ready: status={status}, progress={progress}")]
    VideoNotReady { status: VideoStatus, progress: u8 },

    #[error("video is attached to {} lesson(s)", lessons.len())]
    VideoInUse { lessons: Vec<LessonId> },

    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    #[error("queue error: {0}")]
    Queue(#[from] ccast_queue::QueueError),
}

impl LibraryError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Stable machine-readable code for API surfaces and bulk-operation
    /// reports.
    pub fn code(&self) -> &'static str {
        match self {
            LibraryError::InvalidSession(_) => "invalid_session",
            LibraryError::ExpiredSession(_) => "expired_session",
            LibraryError::InvalidChunk { .. } => "invalid_chunk",
            LibraryError::IncompleteUpload { .. } => "incomplete_upload",
            LibraryError::InvalidArgument(_) => "invalid_argument",
            LibraryError::VideoNotFound(_) => "video_not_found",
            LibraryError::LessonNotFound(_) => "lesson_not_found",
            LibraryError::VideoNotReady { .. } => "video_not_ready",
            LibraryError::VideoInUse { .. } => "video_in_use",
            LibraryError::Store(_) => "storage_error",
            LibraryError::Queue(_) => "queue_error",
        }
    }
}
