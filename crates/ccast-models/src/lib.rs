//! Shared data models for the CourseCast media pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Opaque identifiers (sessions, videos, lessons, jobs)
//! - Upload sessions and chunk bookkeeping
//! - Videos, per-quality renditions and their status machines
//! - Lesson/video associations
//! - Fixed transcoding quality profiles

pub mod id;
pub mod lesson;
pub mod quality;
pub mod session;
pub mod status;
pub mod video;

// Re-export common types
pub use id::{JobId, LessonId, SessionId, VideoId};
pub use lesson::{Lesson, LessonVideoLink};
pub use quality::{QualityLevel, UnknownQuality};
pub use session::{UploadProgress, UploadSession, SESSION_TTL_HOURS};
pub use status::{InvalidTransition, QualityStatus, SessionStatus, VideoStatus};
pub use video::{Video, VideoQuality};
