//! Repository interface over sessions, videos, renditions and lessons.

use async_trait::async_trait;

use ccast_models::{
    Lesson, LessonId, LessonVideoLink, QualityLevel, SessionId, UploadSession, Video, VideoId,
    VideoQuality, VideoStatus,
};

use crate::error::StoreResult;

/// Terminal outcome a transcode job reports for one rendition.
#[derive(Debug, Clone)]
pub enum QualityOutcome {
    Completed {
        file_path: String,
        file_size_bytes: u64,
    },
    Failed {
        error: String,
    },
}

/// Snapshot of the parent video's aggregate state after a rendition
/// reached a terminal state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoAggregate {
    pub status: VideoStatus,
    pub processing_progress: u8,
    pub completed_qualities: u32,
    pub terminal_qualities: u32,
    pub total_qualities: u32,
}

/// Persistence boundary for the pipeline.
///
/// Implementations must make [`finalize_quality`](Catalog::finalize_quality)
/// an exclusive compare-and-update region keyed by video id: two sibling
/// transcode jobs finishing concurrently must serialize their
/// read-modify-write of the parent video, whatever the backing store. The
/// in-memory implementation keys a mutex per video; a SQL-backed one would
/// take a row lock.
#[async_trait]
pub trait Catalog: Send + Sync {
    // ---- upload sessions ----

    async fn insert_session(&self, session: UploadSession) -> StoreResult<()>;
    async fn get_session(&self, id: &SessionId) -> StoreResult<Option<UploadSession>>;
    /// Add a received chunk index (set semantics).
    async fn record_chunk(&self, id: &SessionId, index: u32) -> StoreResult<()>;
    /// Mark a pending session consumed by a successful assembly run.
    async fn complete_session(&self, id: &SessionId) -> StoreResult<()>;
    /// Mark a pending session failed.
    async fn fail_session(&self, id: &SessionId) -> StoreResult<()>;
    /// Remove the session row. Returns whether it existed.
    async fn delete_session(&self, id: &SessionId) -> StoreResult<bool>;

    // ---- videos ----

    /// Create the canonical video record and all of its rendition
    /// placeholders in one unit.
    async fn insert_video_with_qualities(
        &self,
        video: Video,
        qualities: Vec<VideoQuality>,
    ) -> StoreResult<()>;
    async fn get_video(&self, id: &VideoId) -> StoreResult<Option<Video>>;
    async fn list_videos(&self) -> StoreResult<Vec<Video>>;
    async fn update_display_name(&self, id: &VideoId, name: &str) -> StoreResult<()>;
    async fn set_thumbnail_path(&self, id: &VideoId, path: &str) -> StoreResult<()>;
    /// Remove the video and its rendition rows. Returns whether it existed.
    async fn delete_video(&self, id: &VideoId) -> StoreResult<bool>;

    // ---- renditions ----

    async fn get_quality(
        &self,
        video_id: &VideoId,
        quality: QualityLevel,
    ) -> StoreResult<Option<VideoQuality>>;
    async fn list_qualities(&self, video_id: &VideoId) -> StoreResult<Vec<VideoQuality>>;
    /// Move a rendition into `processing` with zero progress.
    async fn start_quality(&self, video_id: &VideoId, quality: QualityLevel) -> StoreResult<()>;
    /// Record incremental encoder progress.
    async fn set_quality_progress(
        &self,
        video_id: &VideoId,
        quality: QualityLevel,
        percent: u8,
    ) -> StoreResult<()>;
    /// Apply a terminal outcome to a rendition and recompute the parent
    /// video's aggregate state, all inside the per-video exclusive region.
    async fn finalize_quality(
        &self,
        video_id: &VideoId,
        quality: QualityLevel,
        outcome: QualityOutcome,
    ) -> StoreResult<VideoAggregate>;

    // ---- lessons & associations ----

    async fn insert_lesson(&self, lesson: Lesson) -> StoreResult<()>;
    async fn get_lesson(&self, id: &LessonId) -> StoreResult<Option<Lesson>>;
    /// Update the lesson's denormalized current-video pointer.
    async fn set_current_video(
        &self,
        lesson_id: &LessonId,
        video_id: Option<VideoId>,
    ) -> StoreResult<()>;
    /// Insert an association row if absent. Returns whether a row was
    /// inserted.
    async fn upsert_link(&self, lesson_id: &LessonId, video_id: &VideoId) -> StoreResult<bool>;
    /// Remove every association row for a lesson. Returns how many were
    /// removed.
    async fn clear_lesson_links(&self, lesson_id: &LessonId) -> StoreResult<u32>;
    async fn links_for_video(&self, video_id: &VideoId) -> StoreResult<Vec<LessonVideoLink>>;
    async fn count_links_for_video(&self, video_id: &VideoId) -> StoreResult<u32>;
}
