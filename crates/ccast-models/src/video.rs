//! Video assets and their per-quality renditions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::VideoId;
use crate::quality::QualityLevel;
use crate::status::{InvalidTransition, QualityStatus, VideoStatus};

/// One finished or finishing video asset.
///
/// Technical metadata (`duration_seconds`, `resolution`, `codec`, `format`)
/// is written once by assembly and immutable afterwards; only
/// `display_name` is user-mutable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Video {
    pub id: VideoId,
    pub original_filename: String,
    pub display_name: String,
    pub file_size_bytes: u64,

    pub duration_seconds: f64,
    /// "WxH"
    pub resolution: String,
    pub codec: String,
    pub format: String,

    pub original_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_path: Option<String>,

    #[serde(default)]
    pub status: VideoStatus,
    /// 0..=100, derived from terminal quality renditions.
    #[serde(default)]
    pub processing_progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Video {
    /// In-memory descriptor handed back by `completeUpload` before
    /// assembly has run. Not persisted.
    pub fn placeholder(original_filename: impl Into<String>, file_size_bytes: u64) -> Self {
        let filename = original_filename.into();
        let now = Utc::now();
        Self {
            id: VideoId::new(),
            display_name: filename.clone(),
            original_filename: filename,
            file_size_bytes,
            duration_seconds: 0.0,
            resolution: String::new(),
            codec: "unknown".to_string(),
            format: "unknown".to_string(),
            original_path: String::new(),
            thumbnail_path: None,
            status: VideoStatus::Pending,
            processing_progress: 0,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Canonical record created by the assembly worker, already
    /// `processing` with its technical metadata filled in.
    #[allow(clippy::too_many_arguments)]
    pub fn from_assembly(
        id: VideoId,
        original_filename: impl Into<String>,
        file_size_bytes: u64,
        duration_seconds: f64,
        resolution: impl Into<String>,
        codec: impl Into<String>,
        format: impl Into<String>,
        original_path: impl Into<String>,
    ) -> Self {
        let filename = original_filename.into();
        let now = Utc::now();
        Self {
            id,
            display_name: filename.clone(),
            original_filename: filename,
            file_size_bytes,
            duration_seconds,
            resolution: resolution.into(),
            codec: codec.into(),
            format: format.into(),
            original_path: original_path.into(),
            thumbnail_path: None,
            status: VideoStatus::Processing,
            processing_progress: 0,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Rename the asset. Technical metadata stays untouched.
    pub fn set_display_name(&mut self, name: impl Into<String>) {
        self.display_name = name.into();
        self.updated_at = Utc::now();
    }

    pub fn set_thumbnail_path(&mut self, path: impl Into<String>) {
        self.thumbnail_path = Some(path.into());
        self.updated_at = Utc::now();
    }

    /// Recompute aggregate `status`/`processing_progress` from the owned
    /// renditions. Must run inside the caller's per-video exclusive region.
    ///
    /// Invariant: `status == Completed` iff every rendition is terminal,
    /// with `processing_progress = 100 * completed / total`. A failed
    /// rendition counts toward terminality but not toward progress.
    pub fn recompute_from_qualities(&mut self, qualities: &[VideoQuality]) {
        let total = qualities.len().max(1) as u32;
        let completed = qualities
            .iter()
            .filter(|q| q.status == QualityStatus::Completed)
            .count() as u32;
        let terminal = qualities.iter().filter(|q| q.status.is_terminal()).count() as u32;

        self.processing_progress = (100 * completed / total) as u8;
        if terminal == total && self.status == VideoStatus::Processing {
            self.status = VideoStatus::Completed;
        }
        self.updated_at = Utc::now();
    }
}

/// One rendition of a video at a fixed quality level. Owned by exactly
/// one transcode job invocation at a time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoQuality {
    pub video_id: VideoId,
    pub quality: QualityLevel,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(default)]
    pub file_size_bytes: u64,

    #[serde(default)]
    pub status: QualityStatus,
    #[serde(default)]
    pub processing_progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    pub updated_at: DateTime<Utc>,
}

impl VideoQuality {
    /// `pending` placeholder created atomically with the parent video.
    pub fn placeholder(video_id: VideoId, quality: QualityLevel) -> Self {
        Self {
            video_id,
            quality,
            file_path: None,
            file_size_bytes: 0,
            status: QualityStatus::Pending,
            processing_progress: 0,
            error_message: None,
            updated_at: Utc::now(),
        }
    }

    /// All four placeholders for a new video.
    pub fn placeholders(video_id: &VideoId) -> Vec<VideoQuality> {
        QualityLevel::all()
            .into_iter()
            .map(|q| VideoQuality::placeholder(video_id.clone(), q))
            .collect()
    }

    /// Begin (or restart) transcoding. Resets progress to zero.
    pub fn start(&mut self) -> Result<(), InvalidTransition> {
        self.transition(QualityStatus::Processing)?;
        self.processing_progress = 0;
        Ok(())
    }

    /// Record incremental progress from the encoder. Only meaningful
    /// while `processing`; clamped to 100.
    pub fn set_progress(&mut self, percent: u8) {
        if self.status == QualityStatus::Processing {
            self.processing_progress = percent.min(100);
            self.updated_at = Utc::now();
        }
    }

    /// Record the produced output and finish successfully.
    pub fn complete(
        &mut self,
        file_path: impl Into<String>,
        file_size_bytes: u64,
    ) -> Result<(), InvalidTransition> {
        self.transition(QualityStatus::Completed)?;
        self.file_path = Some(file_path.into());
        self.file_size_bytes = file_size_bytes;
        self.processing_progress = 100;
        self.error_message = None;
        Ok(())
    }

    /// Record a transcode failure. Progress is left where the encoder
    /// stopped.
    pub fn fail(&mut self, error: impl Into<String>) -> Result<(), InvalidTransition> {
        self.transition(QualityStatus::Failed)?;
        self.error_message = Some(error.into());
        Ok(())
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    fn transition(&mut self, next: QualityStatus) -> Result<(), InvalidTransition> {
        if !self.status.can_transition_to(next) {
            return Err(InvalidTransition::new(
                "video_quality",
                self.status.as_str(),
                next.as_str(),
            ));
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }
}
