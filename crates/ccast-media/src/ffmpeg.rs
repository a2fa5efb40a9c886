//! Production [`MediaAdapter`] backed by ffmpeg/ffprobe subprocesses.

use std::path::Path;

use async_trait::async_trait;

use ccast_models::QualityLevel;

use crate::adapter::{MediaAdapter, MediaProbe, ProgressFn};
use crate::error::MediaResult;
use crate::{probe, thumbnail, transcode};

/// Spawns `ffprobe`/`ffmpeg` for every operation. Stateless; clone-cheap.
#[derive(Debug, Clone, Default)]
pub struct FfmpegAdapter {
    /// Wall-clock cap applied to transcode runs, if any.
    transcode_timeout_secs: Option<u64>,
}

impl FfmpegAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_transcode_timeout(mut self, secs: u64) -> Self {
        self.transcode_timeout_secs = Some(secs);
        self
    }
}

#[async_trait]
impl MediaAdapter for FfmpegAdapter {
    async fn extract_metadata(&self, path: &Path) -> MediaResult<MediaProbe> {
        probe::probe_file(path).await
    }

    async fn transcode_video(
        &self,
        input: &Path,
        output: &Path,
        quality: QualityLevel,
        on_progress: ProgressFn,
    ) -> MediaResult<()> {
        transcode::transcode_to_quality(
            input,
            output,
            quality,
            on_progress,
            self.transcode_timeout_secs,
        )
        .await
    }

    async fn generate_thumbnail(
        &self,
        input: &Path,
        output: &Path,
        at_seconds: f64,
    ) -> MediaResult<()> {
        thumbnail::capture_frame(input, output, at_seconds).await
    }
}
