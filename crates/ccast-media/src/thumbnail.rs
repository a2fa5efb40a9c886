//! Thumbnail capture.

use std::path::Path;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Width thumbnails are scaled to; height keeps aspect.
pub const THUMBNAIL_SCALE_WIDTH: u32 = 480;

/// Capture a single frame at `at_seconds` into `output`.
pub async fn capture_frame(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    at_seconds: f64,
) -> MediaResult<()> {
    let input = input.as_ref();
    let output = output.as_ref();

    if !input.exists() {
        return Err(MediaError::FileNotFound(input.to_path_buf()));
    }

    if let Some(parent) = output.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let cmd = FfmpegCommand::new(input, output)
        .seek(at_seconds)
        .single_frame()
        .video_filter(format!("scale={}:-2", THUMBNAIL_SCALE_WIDTH));

    FfmpegRunner::new().run(&cmd).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_input_is_rejected() {
        let err = capture_frame("/nonexistent/in.mp4", "/tmp/thumb.jpg", 5.0)
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }
}
