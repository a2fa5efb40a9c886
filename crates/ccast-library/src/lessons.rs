//! Binding ready assets to lessons.

use std::sync::Arc;

use tracing::info;

use ccast_models::{Lesson, LessonId, VideoId, VideoStatus};
use ccast_store::Catalog;

use crate::error::{LibraryError, LibraryResult};

/// Thin association manager over the catalog.
///
/// Attach re-points the lesson's denormalized current-video pointer and
/// inserts an association row if absent; prior rows are deliberately kept,
/// so a video a lesson has moved away from stays "in use" until the
/// lesson is detached.
pub struct LessonService {
    catalog: Arc<dyn Catalog>,
}

impl LessonService {
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        Self { catalog }
    }

    /// Attach a ready video to a lesson. Fails unless the video reached
    /// `completed`; idempotent on repeated attach of the same pair.
    pub async fn attach_video_to_lesson(
        &self,
        lesson_id: &LessonId,
        video_id: &VideoId,
    ) -> LibraryResult<()> {
        let video = self
            .catalog
            .get_video(video_id)
            .await?
            .ok_or_else(|| LibraryError::VideoNotFound(video_id.clone()))?;

        if video.status != VideoStatus::Completed {
            return Err(LibraryError::VideoNotReady {
                status: video.status,
                progress: video.processing_progress,
            });
        }

        self.require_lesson(lesson_id).await?;

        self.catalog
            .set_current_video(lesson_id, Some(video_id.clone()))
            .await?;
        let inserted = self.catalog.upsert_link(lesson_id, video_id).await?;

        info!(
            lesson_id = %lesson_id,
            video_id = %video_id,
            new_link = inserted,
            "attached video to lesson"
        );
        Ok(())
    }

    /// Clear the lesson's pointer and remove every association row for
    /// that lesson. A no-op when nothing was attached.
    pub async fn detach_video_from_lesson(&self, lesson_id: &LessonId) -> LibraryResult<()> {
        self.require_lesson(lesson_id).await?;

        self.catalog.set_current_video(lesson_id, None).await?;
        let removed = self.catalog.clear_lesson_links(lesson_id).await?;

        info!(lesson_id = %lesson_id, removed, "detached lesson");
        Ok(())
    }

    /// Lessons referencing a video through the association table,
    /// independent of any lesson's current pointer.
    pub async fn lessons_for_video(&self, video_id: &VideoId) -> LibraryResult<Vec<Lesson>> {
        self.catalog
            .get_video(video_id)
            .await?
            .ok_or_else(|| LibraryError::VideoNotFound(video_id.clone()))?;

        let mut lessons = Vec::new();
        for link in self.catalog.links_for_video(video_id).await? {
            if let Some(lesson) = self.catalog.get_lesson(&link.lesson_id).await? {
                lessons.push(lesson);
            }
        }
        Ok(lessons)
    }

    async fn require_lesson(&self, lesson_id: &LessonId) -> LibraryResult<Lesson> {
        self.catalog
            .get_lesson(lesson_id)
            .await?
            .ok_or_else(|| LibraryError::LessonNotFound(lesson_id.clone()))
    }
}
