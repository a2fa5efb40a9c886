//! Query/update/delete surface over finished and in-flight assets.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use tracing::info;

use ccast_models::{LessonId, QualityLevel, QualityStatus, Video, VideoId, VideoStatus};
use ccast_store::{AssetStore, Catalog};

use crate::error::{LibraryError, LibraryResult};

const MIN_PAGE_SIZE: usize = 1;
const MAX_PAGE_SIZE: usize = 100;
const DEFAULT_PAGE_SIZE: usize = 20;

/// Optional filters for [`VideoService::list_videos`].
#[derive(Debug, Clone, Default)]
pub struct VideoFilters {
    pub status: Option<VideoStatus>,
    /// Case-insensitive match against filename or display name.
    pub search: Option<String>,
    /// Only videos associated with this lesson.
    pub lesson_id: Option<LessonId>,
}

/// One row of a video listing, annotated with its association count.
#[derive(Debug, Clone)]
pub struct VideoListItem {
    pub video: Video,
    pub lesson_count: u32,
}

/// First page of a filtered listing.
#[derive(Debug, Clone)]
pub struct VideoPage {
    pub videos: Vec<VideoListItem>,
    /// Matches before pagination.
    pub total: usize,
    /// Server-clamped page size actually applied.
    pub page_size: usize,
}

/// Aggregate processing snapshot for one video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingReport {
    pub status: VideoStatus,
    pub progress: u8,
    pub completed_qualities: u32,
}

/// Playback URLs for the renditions that finished.
#[derive(Debug, Clone)]
pub struct VideoUrls {
    pub qualities: BTreeMap<QualityLevel, String>,
    pub thumbnail: Option<String>,
}

/// Per-item outcome of a bulk delete.
#[derive(Debug, Clone)]
pub struct BulkDeleteReport {
    pub deleted: Vec<VideoId>,
    pub failed: Vec<BulkDeleteFailure>,
}

#[derive(Debug, Clone)]
pub struct BulkDeleteFailure {
    pub id: VideoId,
    pub code: &'static str,
    pub reason: String,
}

/// Lifecycle surface over the catalog. Depends on storage only, never on
/// the workers.
pub struct VideoService {
    catalog: Arc<dyn Catalog>,
    assets: AssetStore,
    /// Public base the stored paths are exposed under.
    public_base: String,
}

impl VideoService {
    pub fn new(catalog: Arc<dyn Catalog>, assets: AssetStore, public_base: impl Into<String>) -> Self {
        Self {
            catalog,
            assets,
            public_base: public_base.into().trim_end_matches('/').to_string(),
        }
    }

    /// List videos matching `filters`, annotated with association counts.
    /// `page_size` is clamped server-side to `[1, 100]`, defaulting to 20.
    pub async fn list_videos(
        &self,
        filters: &VideoFilters,
        page_size: Option<usize>,
    ) -> LibraryResult<VideoPage> {
        let page_size = page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(MIN_PAGE_SIZE, MAX_PAGE_SIZE);

        let needle = filters.search.as_ref().map(|s| s.to_lowercase());

        let mut matches = Vec::new();
        for video in self.catalog.list_videos().await? {
            if let Some(status) = filters.status {
                if video.status != status {
                    continue;
                }
            }
            if let Some(ref needle) = needle {
                let haystack_hit = video.original_filename.to_lowercase().contains(needle)
                    || video.display_name.to_lowercase().contains(needle);
                if !haystack_hit {
                    continue;
                }
            }
            if let Some(ref lesson_id) = filters.lesson_id {
                let linked = self
                    .catalog
                    .links_for_video(&video.id)
                    .await?
                    .iter()
                    .any(|l| &l.lesson_id == lesson_id);
                if !linked {
                    continue;
                }
            }
            matches.push(video);
        }

        let total = matches.len();
        let mut videos = Vec::with_capacity(page_size.min(total));
        for video in matches.into_iter().take(page_size) {
            let lesson_count = self.catalog.count_links_for_video(&video.id).await?;
            videos.push(VideoListItem {
                video,
                lesson_count,
            });
        }

        Ok(VideoPage {
            videos,
            total,
            page_size,
        })
    }

    pub async fn get_video(&self, id: &VideoId) -> LibraryResult<Video> {
        self.require_video(id).await
    }

    /// Rename a video. Only the display name is mutable; technical
    /// metadata is immutable once assembly has written it.
    pub async fn update_display_name(&self, id: &VideoId, display_name: &str) -> LibraryResult<Video> {
        let trimmed = display_name.trim();
        if trimmed.is_empty() {
            return Err(LibraryError::invalid_argument(
                "display_name must not be empty",
            ));
        }

        self.require_video(id).await?;
        self.catalog.update_display_name(id, trimmed).await?;
        self.require_video(id).await
    }

    /// Delete a video, its rendition files, its thumbnail and all
    /// corresponding records. Refused while any lesson association exists.
    pub async fn delete_video(&self, id: &VideoId) -> LibraryResult<()> {
        let video = self.require_video(id).await?;

        let links = self.catalog.links_for_video(id).await?;
        if !links.is_empty() {
            let mut lessons: Vec<LessonId> = links.into_iter().map(|l| l.lesson_id).collect();
            lessons.sort();
            lessons.dedup();
            return Err(LibraryError::VideoInUse { lessons });
        }

        // best-effort per file: a missing file is not an error
        self.assets.remove_file(Path::new(&video.original_path)).await;
        if let Some(ref thumbnail) = video.thumbnail_path {
            self.assets.remove_file(Path::new(thumbnail)).await;
        }
        for quality in self.catalog.list_qualities(id).await? {
            if let Some(ref path) = quality.file_path {
                self.assets.remove_file(Path::new(path)).await;
            }
        }
        self.assets.delete_assets(id).await?;

        self.catalog.delete_video(id).await?;
        info!(video_id = %id, "deleted video");
        Ok(())
    }

    /// Delete many videos; each id is evaluated independently and one
    /// failure never aborts the rest.
    pub async fn bulk_delete_videos(&self, ids: &[VideoId]) -> LibraryResult<BulkDeleteReport> {
        let mut report = BulkDeleteReport {
            deleted: Vec::new(),
            failed: Vec::new(),
        };

        for id in ids {
            match self.delete_video(id).await {
                Ok(()) => report.deleted.push(id.clone()),
                Err(e) => report.failed.push(BulkDeleteFailure {
                    id: id.clone(),
                    code: e.code(),
                    reason: e.to_string(),
                }),
            }
        }

        Ok(report)
    }

    /// Aggregate processing snapshot: `progress = 100 * completed / 4`.
    pub async fn processing_progress(&self, id: &VideoId) -> LibraryResult<ProcessingReport> {
        let video = self.require_video(id).await?;
        let qualities = self.catalog.list_qualities(id).await?;

        let total = qualities.len().max(1) as u32;
        let completed = qualities
            .iter()
            .filter(|q| q.status == QualityStatus::Completed)
            .count() as u32;

        Ok(ProcessingReport {
            status: video.status,
            progress: (100 * completed / total) as u8,
            completed_qualities: completed,
        })
    }

    /// Playback URLs for completed renditions. A rendition whose output
    /// file vanished is skipped; nothing beyond existence is validated.
    pub async fn video_urls(&self, id: &VideoId) -> LibraryResult<VideoUrls> {
        let video = self.require_video(id).await?;

        let mut qualities = BTreeMap::new();
        for rendition in self.catalog.list_qualities(id).await? {
            if rendition.status != QualityStatus::Completed {
                continue;
            }
            let Some(ref path) = rendition.file_path else {
                continue;
            };
            if !tokio::fs::try_exists(path).await.unwrap_or(false) {
                continue;
            }
            qualities.insert(rendition.quality, self.public_url(id, path));
        }

        let thumbnail = video
            .thumbnail_path
            .as_ref()
            .map(|path| self.public_url(id, path));

        Ok(VideoUrls {
            qualities,
            thumbnail,
        })
    }

    fn public_url(&self, id: &VideoId, stored_path: &str) -> String {
        let file = Path::new(stored_path)
            .file_name()
            .map(|f| f.to_string_lossy().to_string())
            .unwrap_or_else(|| stored_path.to_string());
        format!("{}/videos/{}/{}", self.public_base, id, file)
    }

    async fn require_video(&self, id: &VideoId) -> LibraryResult<Video> {
        self.catalog
            .get_video(id)
            .await?
            .ok_or_else(|| LibraryError::VideoNotFound(id.clone()))
    }
}
