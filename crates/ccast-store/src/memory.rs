//! In-process catalog implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use ccast_models::{
    Lesson, LessonId, LessonVideoLink, QualityLevel, QualityStatus, SessionId, UploadSession,
    Video, VideoId, VideoQuality,
};

use crate::catalog::{Catalog, QualityOutcome, VideoAggregate};
use crate::error::{StoreError, StoreResult};

#[derive(Default)]
struct Inner {
    sessions: HashMap<SessionId, UploadSession>,
    videos: HashMap<VideoId, Video>,
    qualities: HashMap<VideoId, Vec<VideoQuality>>,
    lessons: HashMap<LessonId, Lesson>,
    links: Vec<LessonVideoLink>,
}

/// Catalog backed by RwLock'd maps.
///
/// The per-video mutex registry is the serialization point required by
/// the [`Catalog`] contract: `finalize_quality` holds the video's mutex
/// across its read-modify-write so sibling completions apply in sequence.
#[derive(Default)]
pub struct MemoryCatalog {
    inner: RwLock<Inner>,
    video_locks: Mutex<HashMap<VideoId, Arc<Mutex<()>>>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    async fn video_lock(&self, video_id: &VideoId) -> Arc<Mutex<()>> {
        let mut locks = self.video_locks.lock().await;
        locks
            .entry(video_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn aggregate_of(video: &Video, qualities: &[VideoQuality]) -> VideoAggregate {
        let completed = qualities
            .iter()
            .filter(|q| q.status == QualityStatus::Completed)
            .count() as u32;
        let terminal = qualities.iter().filter(|q| q.is_terminal()).count() as u32;
        VideoAggregate {
            status: video.status,
            processing_progress: video.processing_progress,
            completed_qualities: completed,
            terminal_qualities: terminal,
            total_qualities: qualities.len() as u32,
        }
    }
}

#[async_trait]
impl Catalog for MemoryCatalog {
    async fn insert_session(&self, session: UploadSession) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        inner.sessions.insert(session.session_id.clone(), session);
        Ok(())
    }

    async fn get_session(&self, id: &SessionId) -> StoreResult<Option<UploadSession>> {
        Ok(self.inner.read().await.sessions.get(id).cloned())
    }

    async fn record_chunk(&self, id: &SessionId, index: u32) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        let session = inner
            .sessions
            .get_mut(id)
            .ok_or_else(|| StoreError::SessionNotFound(id.clone()))?;
        session.record_chunk(index);
        Ok(())
    }

    async fn complete_session(&self, id: &SessionId) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        let session = inner
            .sessions
            .get_mut(id)
            .ok_or_else(|| StoreError::SessionNotFound(id.clone()))?;
        session.complete()?;
        Ok(())
    }

    async fn fail_session(&self, id: &SessionId) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        let session = inner
            .sessions
            .get_mut(id)
            .ok_or_else(|| StoreError::SessionNotFound(id.clone()))?;
        session.fail()?;
        Ok(())
    }

    async fn delete_session(&self, id: &SessionId) -> StoreResult<bool> {
        Ok(self.inner.write().await.sessions.remove(id).is_some())
    }

    async fn insert_video_with_qualities(
        &self,
        video: Video,
        qualities: Vec<VideoQuality>,
    ) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        inner.qualities.insert(video.id.clone(), qualities);
        inner.videos.insert(video.id.clone(), video);
        Ok(())
    }

    async fn get_video(&self, id: &VideoId) -> StoreResult<Option<Video>> {
        Ok(self.inner.read().await.videos.get(id).cloned())
    }

    async fn list_videos(&self) -> StoreResult<Vec<Video>> {
        let inner = self.inner.read().await;
        let mut videos: Vec<Video> = inner.videos.values().cloned().collect();
        videos.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(videos)
    }

    async fn update_display_name(&self, id: &VideoId, name: &str) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        let video = inner
            .videos
            .get_mut(id)
            .ok_or_else(|| StoreError::VideoNotFound(id.clone()))?;
        video.set_display_name(name);
        Ok(())
    }

    async fn set_thumbnail_path(&self, id: &VideoId, path: &str) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        let video = inner
            .videos
            .get_mut(id)
            .ok_or_else(|| StoreError::VideoNotFound(id.clone()))?;
        video.set_thumbnail_path(path);
        Ok(())
    }

    async fn delete_video(&self, id: &VideoId) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;
        inner.qualities.remove(id);
        Ok(inner.videos.remove(id).is_some())
    }

    async fn get_quality(
        &self,
        video_id: &VideoId,
        quality: QualityLevel,
    ) -> StoreResult<Option<VideoQuality>> {
        let inner = self.inner.read().await;
        Ok(inner
            .qualities
            .get(video_id)
            .and_then(|qs| qs.iter().find(|q| q.quality == quality).cloned()))
    }

    async fn list_qualities(&self, video_id: &VideoId) -> StoreResult<Vec<VideoQuality>> {
        let inner = self.inner.read().await;
        Ok(inner.qualities.get(video_id).cloned().unwrap_or_default())
    }

    async fn start_quality(&self, video_id: &VideoId, quality: QualityLevel) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        let rendition = inner
            .qualities
            .get_mut(video_id)
            .and_then(|qs| qs.iter_mut().find(|q| q.quality == quality))
            .ok_or_else(|| StoreError::QualityNotFound {
                video_id: video_id.clone(),
                quality,
            })?;
        rendition.start()?;
        Ok(())
    }

    async fn set_quality_progress(
        &self,
        video_id: &VideoId,
        quality: QualityLevel,
        percent: u8,
    ) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        let rendition = inner
            .qualities
            .get_mut(video_id)
            .and_then(|qs| qs.iter_mut().find(|q| q.quality == quality))
            .ok_or_else(|| StoreError::QualityNotFound {
                video_id: video_id.clone(),
                quality,
            })?;
        rendition.set_progress(percent);
        Ok(())
    }

    async fn finalize_quality(
        &self,
        video_id: &VideoId,
        quality: QualityLevel,
        outcome: QualityOutcome,
    ) -> StoreResult<VideoAggregate> {
        let lock = self.video_lock(video_id).await;
        let _exclusive = lock.lock().await;

        let mut inner = self.inner.write().await;

        let rendition = inner
            .qualities
            .get_mut(video_id)
            .and_then(|qs| qs.iter_mut().find(|q| q.quality == quality))
            .ok_or_else(|| StoreError::QualityNotFound {
                video_id: video_id.clone(),
                quality,
            })?;

        match outcome {
            QualityOutcome::Completed {
                file_path,
                file_size_bytes,
            } => rendition.complete(file_path, file_size_bytes)?,
            QualityOutcome::Failed { error } => rendition.fail(error)?,
        }

        let snapshot = inner
            .qualities
            .get(video_id)
            .cloned()
            .unwrap_or_default();

        let video = inner
            .videos
            .get_mut(video_id)
            .ok_or_else(|| StoreError::VideoNotFound(video_id.clone()))?;
        video.recompute_from_qualities(&snapshot);

        Ok(Self::aggregate_of(video, &snapshot))
    }

    async fn insert_lesson(&self, lesson: Lesson) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        inner.lessons.insert(lesson.id.clone(), lesson);
        Ok(())
    }

    async fn get_lesson(&self, id: &LessonId) -> StoreResult<Option<Lesson>> {
        Ok(self.inner.read().await.lessons.get(id).cloned())
    }

    async fn set_current_video(
        &self,
        lesson_id: &LessonId,
        video_id: Option<VideoId>,
    ) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        let lesson = inner
            .lessons
            .get_mut(lesson_id)
            .ok_or_else(|| StoreError::LessonNotFound(lesson_id.clone()))?;
        lesson.current_video = video_id;
        lesson.updated_at = chrono::Utc::now();
        Ok(())
    }

    async fn upsert_link(&self, lesson_id: &LessonId, video_id: &VideoId) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;
        let exists = inner
            .links
            .iter()
            .any(|l| &l.lesson_id == lesson_id && &l.video_id == video_id);
        if exists {
            return Ok(false);
        }
        inner
            .links
            .push(LessonVideoLink::new(lesson_id.clone(), video_id.clone()));
        Ok(true)
    }

    async fn clear_lesson_links(&self, lesson_id: &LessonId) -> StoreResult<u32> {
        let mut inner = self.inner.write().await;
        let before = inner.links.len();
        inner.links.retain(|l| &l.lesson_id != lesson_id);
        Ok((before - inner.links.len()) as u32)
    }

    async fn links_for_video(&self, video_id: &VideoId) -> StoreResult<Vec<LessonVideoLink>> {
        let inner = self.inner.read().await;
        Ok(inner
            .links
            .iter()
            .filter(|l| &l.video_id == video_id)
            .cloned()
            .collect())
    }

    async fn count_links_for_video(&self, video_id: &VideoId) -> StoreResult<u32> {
        let inner = self.inner.read().await;
        Ok(inner.links.iter().filter(|l| &l.video_id == video_id).count() as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ccast_models::VideoStatus;

    fn processing_video() -> (Video, Vec<VideoQuality>) {
        let id = VideoId::new();
        let video = Video::from_assembly(
            id.clone(),
            "intro.mp4",
            4096,
            30.0,
            "1920x1080",
            "h264",
            "mp4",
            "/data/videos/x/original.mp4",
        );
        let qualities = VideoQuality::placeholders(&id);
        (video, qualities)
    }

    #[tokio::test]
    async fn finalize_updates_aggregate_per_rendition() {
        let catalog = MemoryCatalog::new();
        let (video, qualities) = processing_video();
        let id = video.id.clone();
        catalog
            .insert_video_with_qualities(video, qualities)
            .await
            .unwrap();

        for quality in QualityLevel::all() {
            catalog.start_quality(&id, quality).await.unwrap();
        }

        let agg = catalog
            .finalize_quality(
                &id,
                QualityLevel::Q360p,
                QualityOutcome::Completed {
                    file_path: "a".into(),
                    file_size_bytes: 1,
                },
            )
            .await
            .unwrap();
        assert_eq!(agg.processing_progress, 25);
        assert_eq!(agg.status, VideoStatus::Processing);

        let agg = catalog
            .finalize_quality(
                &id,
                QualityLevel::Q480p,
                QualityOutcome::Failed {
                    error: "boom".into(),
                },
            )
            .await
            .unwrap();
        assert_eq!(agg.processing_progress, 25);
        assert_eq!(agg.terminal_qualities, 2);

        for quality in [QualityLevel::Q720p, QualityLevel::Q1080p] {
            catalog
                .finalize_quality(
                    &id,
                    quality,
                    QualityOutcome::Completed {
                        file_path: quality.as_str().into(),
                        file_size_bytes: 1,
                    },
                )
                .await
                .unwrap();
        }

        let video = catalog.get_video(&id).await.unwrap().unwrap();
        assert_eq!(video.status, VideoStatus::Completed);
        assert_eq!(video.processing_progress, 75);
    }

    #[tokio::test]
    async fn concurrent_finalizes_never_lose_an_update() {
        let catalog = Arc::new(MemoryCatalog::new());
        let (video, qualities) = processing_video();
        let id = video.id.clone();
        catalog
            .insert_video_with_qualities(video, qualities)
            .await
            .unwrap();
        for quality in QualityLevel::all() {
            catalog.start_quality(&id, quality).await.unwrap();
        }

        let mut handles = Vec::new();
        for quality in QualityLevel::all() {
            let catalog = Arc::clone(&catalog);
            let id = id.clone();
            handles.push(tokio::spawn(async move {
                catalog
                    .finalize_quality(
                        &id,
                        quality,
                        QualityOutcome::Completed {
                            file_path: quality.as_str().into(),
                            file_size_bytes: 1,
                        },
                    )
                    .await
                    .unwrap()
            }));
        }

        let mut progresses: Vec<u8> = Vec::new();
        for handle in handles {
            progresses.push(handle.await.unwrap().processing_progress);
        }
        progresses.sort_unstable();
        // every intermediate aggregate is observed exactly once
        assert_eq!(progresses, vec![25, 50, 75, 100]);

        let video = catalog.get_video(&id).await.unwrap().unwrap();
        assert_eq!(video.status, VideoStatus::Completed);
        assert_eq!(video.processing_progress, 100);
    }

    #[tokio::test]
    async fn delete_video_removes_rendition_rows() {
        let catalog = MemoryCatalog::new();
        let (video, qualities) = processing_video();
        let id = video.id.clone();
        catalog
            .insert_video_with_qualities(video, qualities)
            .await
            .unwrap();

        assert!(catalog.delete_video(&id).await.unwrap());
        assert!(catalog.get_video(&id).await.unwrap().is_none());
        assert!(catalog.list_qualities(&id).await.unwrap().is_empty());
        assert!(!catalog.delete_video(&id).await.unwrap());
    }

    #[tokio::test]
    async fn link_rows_are_unique_per_pair() {
        let catalog = MemoryCatalog::new();
        let lesson = Lesson::new("Intro");
        let lesson_id = lesson.id.clone();
        catalog.insert_lesson(lesson).await.unwrap();
        let video_id = VideoId::new();

        assert!(catalog.upsert_link(&lesson_id, &video_id).await.unwrap());
        assert!(!catalog.upsert_link(&lesson_id, &video_id).await.unwrap());
        assert_eq!(catalog.count_links_for_video(&video_id).await.unwrap(), 1);

        assert_eq!(catalog.clear_lesson_links(&lesson_id).await.unwrap(), 1);
        assert_eq!(catalog.count_links_for_video(&video_id).await.unwrap(), 0);
    }
}
