//! Transcode worker: produce one quality rendition of one video.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};

use ccast_media::{MediaAdapter, ProgressFn};
use ccast_models::{QualityLevel, QualityStatus, VideoId, VideoStatus};
use ccast_queue::TranscodeJob;
use ccast_store::{Catalog, QualityOutcome};

use crate::context::PipelineContext;
use crate::error::{WorkerError, WorkerResult};

/// Run one transcode unit of work.
///
/// On success the rendition's output path and size are persisted and the
/// parent aggregate recomputed. On failure the rendition is marked
/// `failed` and the error re-raised so the transport retries this
/// specific (video, quality) unit. Either way the parent recomputation
/// happens inside the catalog's per-video exclusive region.
pub async fn run_transcode(ctx: &PipelineContext, job: &TranscodeJob) -> WorkerResult<()> {
    let rendition = ctx
        .catalog
        .get_quality(&job.video_id, job.quality)
        .await?
        .ok_or_else(|| WorkerError::QualityNotFound {
            video_id: job.video_id.clone(),
            quality: job.quality,
        })?;

    // redelivery after a success has nothing left to do
    if rendition.status == QualityStatus::Completed {
        info!(
            video_id = %job.video_id,
            quality = %job.quality,
            "rendition already completed, skipping"
        );
        return Ok(());
    }

    let video = ctx
        .catalog
        .get_video(&job.video_id)
        .await?
        .ok_or_else(|| WorkerError::VideoNotFound(job.video_id.clone()))?;

    ctx.catalog.start_quality(&job.video_id, job.quality).await?;

    let output = ctx.assets.quality_path(&job.video_id, job.quality);
    let progress = spawn_progress_sink(Arc::clone(&ctx.catalog), job.video_id.clone(), job.quality);

    let result = ctx
        .media
        .transcode_video(
            Path::new(&video.original_path),
            &output,
            job.quality,
            progress.callback,
        )
        .await;

    // callback dropped with the call above; drain what was reported
    let _ = progress.task.await;

    match result {
        Ok(()) => {
            let file_size_bytes = tokio::fs::metadata(&output)
                .await
                .map(|m| m.len())
                .unwrap_or(0);

            let aggregate = ctx
                .catalog
                .finalize_quality(
                    &job.video_id,
                    job.quality,
                    QualityOutcome::Completed {
                        file_path: output.to_string_lossy().into_owned(),
                        file_size_bytes,
                    },
                )
                .await?;

            info!(
                video_id = %job.video_id,
                quality = %job.quality,
                progress = aggregate.processing_progress,
                "rendition completed"
            );
            if aggregate.status == VideoStatus::Completed {
                info!(video_id = %job.video_id, "video processing completed");
            }
            Ok(())
        }
        Err(e) => {
            if let Err(mark_err) = ctx
                .catalog
                .finalize_quality(
                    &job.video_id,
                    job.quality,
                    QualityOutcome::Failed {
                        error: e.to_string(),
                    },
                )
                .await
            {
                warn!(
                    video_id = %job.video_id,
                    quality = %job.quality,
                    "could not mark rendition failed: {}", mark_err
                );
            }
            Err(e.into())
        }
    }
}

struct ProgressSink {
    callback: ProgressFn,
    task: tokio::task::JoinHandle<()>,
}

/// Bridge the adapter's synchronous percent callback into catalog
/// writes. Only forward increases; the encoder may repeat a percentage.
fn spawn_progress_sink(
    catalog: Arc<dyn Catalog>,
    video_id: VideoId,
    quality: QualityLevel,
) -> ProgressSink {
    let (tx, mut rx) = mpsc::unbounded_channel::<u8>();

    let task = tokio::spawn(async move {
        let mut last_written: Option<u8> = None;
        while let Some(percent) = rx.recv().await {
            if last_written.is_some_and(|p| percent <= p) {
                continue;
            }
            last_written = Some(percent);
            if let Err(e) = catalog
                .set_quality_progress(&video_id, quality, percent)
                .await
            {
                warn!(
                    video_id = %video_id,
                    quality = %quality,
                    "failed to persist progress: {}", e
                );
            }
        }
    });

    ProgressSink {
        callback: Box::new(move |percent| {
            let _ = tx.send(percent);
        }),
        task,
    }
}
