//! Worker error types.

use thiserror::Error;

use ccast_models::{QualityLevel, SessionId, SessionStatus, VideoId};

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("session not found: {0}")]
    SessionNotFound(SessionId),

    #[error("session {session_id} is {status}, not pending")]
    SessionNotPending {
        session_id: SessionId,
        status: SessionStatus,
    },

    #[error("session {session_id} incomplete, missing chunks: {missing:?}")]
    IncompleteSession {
        session_id: SessionId,
        missing: Vec<u32>,
    },

    #[error("video not found: {0}")]
    VideoNotFound(VideoId),

    #[error("quality {quality} not found for video {video_id}")]
    QualityNotFound {
        video_id: VideoId,
        quality: QualityLevel,
    },

    #[error("media error: {0}")]
    Media(#[from] ccast_media::MediaError),

    #[error("storage error: {0}")]
    Store(#[from] ccast_store::StoreError),

    #[error("queue error: {0}")]
    Queue(#[from] ccast_queue::QueueError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
