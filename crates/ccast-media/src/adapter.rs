//! The media tool interface the rest of the pipeline depends on.

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use ccast_models::QualityLevel;

use crate::error::MediaResult;

/// Technical metadata extracted from an assembled file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaProbe {
    /// Duration in seconds. `0.0` when the probe output carried none.
    pub duration_seconds: f64,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Video codec name, `"unknown"` when absent from probe output
    pub codec: String,
    /// Container format name, `"unknown"` when absent
    pub format: String,
}

impl MediaProbe {
    /// "WxH" form stored on the video record.
    pub fn resolution(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

/// Callback receiving percent-complete updates (0..=100) while the tool
/// runs.
pub type ProgressFn = Box<dyn Fn(u8) + Send + Sync>;

/// Boundary to the external media inspection/transcoding tool.
///
/// Any tool with equivalent probe/transcode/thumbnail semantics is
/// substitutable; workers and tests only see this trait.
#[async_trait]
pub trait MediaAdapter: Send + Sync {
    /// Probe a file for duration, resolution, codec and container format.
    async fn extract_metadata(&self, path: &Path) -> MediaResult<MediaProbe>;

    /// Transcode `input` into `output` at the given quality profile,
    /// streaming percent-complete through `on_progress`.
    async fn transcode_video(
        &self,
        input: &Path,
        output: &Path,
        quality: QualityLevel,
        on_progress: ProgressFn,
    ) -> MediaResult<()>;

    /// Capture a single frame at `at_seconds` into `output`.
    async fn generate_thumbnail(
        &self,
        input: &Path,
        output: &Path,
        at_seconds: f64,
    ) -> MediaResult<()>;
}
