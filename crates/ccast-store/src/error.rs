//! Storage error types.

use thiserror::Error;

use ccast_models::{InvalidTransition, LessonId, QualityLevel, SessionId, VideoId};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session not found: {0}")]
    SessionNotFound(SessionId),

    #[error("video not found: {0}")]
    VideoNotFound(VideoId),

    #[error("lesson not found: {0}")]
    LessonNotFound(LessonId),

    #[error("quality {quality} not found for video {video_id}")]
    QualityNotFound {
        video_id: VideoId,
        quality: QualityLevel,
    },

    #[error("chunk {index} missing for session {session_id}")]
    MissingChunk { session_id: SessionId, index: u32 },

    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
