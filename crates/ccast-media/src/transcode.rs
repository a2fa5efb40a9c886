//! Quality-profile transcoding.

use std::path::Path;

use ccast_models::QualityLevel;

use crate::adapter::ProgressFn;
use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::probe::probe_file;

/// Video codec used for every rendition.
pub const RENDITION_VIDEO_CODEC: &str = "libx264";
/// Audio codec used for every rendition.
pub const RENDITION_AUDIO_CODEC: &str = "aac";
/// Audio bitrate used for every rendition.
pub const RENDITION_AUDIO_BITRATE: &str = "128k";
/// Encoder preset.
pub const RENDITION_PRESET: &str = "fast";

/// Build the output arguments for one quality profile.
pub fn profile_command(input: &Path, output: &Path, quality: QualityLevel) -> FfmpegCommand {
    FfmpegCommand::new(input, output)
        .video_filter(format!("scale={}:{}", quality.width(), quality.height()))
        .video_codec(RENDITION_VIDEO_CODEC)
        .output_args(["-preset", RENDITION_PRESET])
        .video_bitrate(quality.video_bitrate())
        .audio_codec(RENDITION_AUDIO_CODEC)
        .audio_bitrate(RENDITION_AUDIO_BITRATE)
        .output_args(["-movflags", "+faststart"])
}

/// Transcode `input` into `output` at `quality`, reporting percent
/// complete through `on_progress`.
///
/// The input is probed first so encoder timestamps can be mapped to a
/// percentage; an unknown duration degrades to a single 100 report at
/// the end.
pub async fn transcode_to_quality(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    quality: QualityLevel,
    on_progress: ProgressFn,
    timeout_secs: Option<u64>,
) -> MediaResult<()> {
    let input = input.as_ref();
    let output = output.as_ref();

    if !input.exists() {
        return Err(MediaError::FileNotFound(input.to_path_buf()));
    }

    if let Some(parent) = output.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let duration_ms = (probe_file(input).await?.duration_seconds * 1000.0) as i64;

    let cmd = profile_command(input, output, quality);
    let mut runner = FfmpegRunner::new();
    if let Some(secs) = timeout_secs {
        runner = runner.with_timeout(secs);
    }

    runner
        .run_with_progress(&cmd, move |progress| {
            if progress.is_complete {
                on_progress(100);
            } else {
                on_progress(progress.percent(duration_ms));
            }
        })
        .await
}
