//! Thumbnail worker: best-effort poster frame capture.

use std::path::Path;

use tracing::{info, warn};

use ccast_media::MediaAdapter;
use ccast_queue::GenerateThumbnailJob;
use ccast_store::Catalog;

use crate::context::PipelineContext;
use crate::error::WorkerResult;

/// Seconds into the video to capture when it is long enough.
const CAPTURE_AT_SECS: f64 = 5.0;
/// Fallback capture point for short videos.
const SHORT_CAPTURE_AT_SECS: f64 = 1.0;

/// Capture timestamp rule: the 5-second mark for videos of 5 seconds or
/// longer, the 1-second mark for shorter ones. An unknown duration
/// (probed as zero) takes the 5-second branch.
pub fn capture_timestamp(duration_seconds: f64) -> f64 {
    if duration_seconds > 0.0 && duration_seconds < CAPTURE_AT_SECS {
        SHORT_CAPTURE_AT_SECS
    } else {
        CAPTURE_AT_SECS
    }
}

/// Run one thumbnail unit of work. Always best effort: every failure is
/// logged and swallowed, and the video's status/progress are never
/// touched.
pub async fn run_thumbnail(ctx: &PipelineContext, job: &GenerateThumbnailJob) {
    if let Err(e) = try_capture(ctx, job).await {
        warn!(
            video_id = %job.video_id,
            "thumbnail generation failed, leaving video without one: {}", e
        );
    }
}

async fn try_capture(ctx: &PipelineContext, job: &GenerateThumbnailJob) -> WorkerResult<()> {
    let Some(video) = ctx.catalog.get_video(&job.video_id).await? else {
        warn!(video_id = %job.video_id, "video gone, skipping thumbnail");
        return Ok(());
    };

    let at_seconds = capture_timestamp(video.duration_seconds);
    let output = ctx.assets.thumbnail_path(&job.video_id);

    ctx.media
        .generate_thumbnail(Path::new(&video.original_path), &output, at_seconds)
        .await?;

    ctx.catalog
        .set_thumbnail_path(&job.video_id, &output.to_string_lossy())
        .await?;

    info!(video_id = %job.video_id, at_seconds, "thumbnail captured");
    Ok(())
}
