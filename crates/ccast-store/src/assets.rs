//! Per-video asset directory layout.
//!
//! One opaque directory per asset: `videos/<asset-id>/original.<ext>`,
//! `videos/<asset-id>/<quality>.mp4`, `videos/<asset-id>/thumbnail.jpg`.
//! The asset id is the video id.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::warn;

use ccast_models::{QualityLevel, VideoId};

use crate::config::StorageConfig;
use crate::error::{StoreError, StoreResult};

/// Fallback extension when the original filename carries none.
const DEFAULT_ORIGINAL_EXT: &str = "mp4";

#[derive(Debug, Clone)]
pub struct AssetStore {
    videos_dir: PathBuf,
}

impl AssetStore {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            videos_dir: config.videos_dir(),
        }
    }

    pub fn asset_dir(&self, video_id: &VideoId) -> PathBuf {
        self.videos_dir.join(video_id.as_str())
    }

    /// Path the assembled original is written to, keeping the uploaded
    /// file's extension.
    pub fn original_path(&self, video_id: &VideoId, original_filename: &str) -> PathBuf {
        let ext = Path::new(original_filename)
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| !e.is_empty())
            .unwrap_or(DEFAULT_ORIGINAL_EXT);
        self.asset_dir(video_id).join(format!("original.{ext}"))
    }

    pub fn quality_path(&self, video_id: &VideoId, quality: QualityLevel) -> PathBuf {
        self.asset_dir(video_id).join(quality.output_filename())
    }

    pub fn thumbnail_path(&self, video_id: &VideoId) -> PathBuf {
        self.asset_dir(video_id).join("thumbnail.jpg")
    }

    /// Remove one file, best-effort: a missing file is not an error and
    /// other failures are logged but swallowed.
    pub async fn remove_file(&self, path: &Path) {
        match fs::remove_file(path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("failed to remove {}: {}", path.display(), e),
        }
    }

    /// Remove the whole asset directory. Succeeds when already gone.
    pub async fn delete_assets(&self, video_id: &VideoId) -> StoreResult<()> {
        match fs::remove_dir_all(self.asset_dir(video_id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Io(e)),
        }
    }
}
