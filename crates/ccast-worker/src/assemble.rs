//! Assembly worker: turn a completed upload session into a video asset.

use tracing::{info, warn};

use ccast_media::MediaAdapter;
use ccast_models::{QualityLevel, SessionStatus, UploadSession, Video, VideoId, VideoQuality};
use ccast_queue::{
    AssembleSessionJob, GenerateThumbnailJob, JobDispatcher, PipelineJob, TranscodeJob,
};
use ccast_store::Catalog;

use crate::context::PipelineContext;
use crate::error::{WorkerError, WorkerResult};

/// Run one assembly unit of work.
///
/// Steps, in order: re-validate the session, concatenate chunks
/// byte-exact into the original asset path, probe the result, create the
/// video record with its rendition placeholders in one unit, delete the
/// chunk blobs, mark the session completed, then fan out the transcode
/// and thumbnail jobs.
///
/// Any failure before the fan-out marks the session `failed` and
/// surfaces the error.
pub async fn run_assembly(ctx: &PipelineContext, job: &AssembleSessionJob) -> WorkerResult<()> {
    let session = ctx
        .catalog
        .get_session(&job.session_id)
        .await?
        .ok_or_else(|| WorkerError::SessionNotFound(job.session_id.clone()))?;

    if session.status != SessionStatus::Pending {
        return Err(WorkerError::SessionNotPending {
            session_id: session.session_id,
            status: session.status,
        });
    }

    let video_id = match assemble(ctx, &session).await {
        Ok(video_id) => video_id,
        Err(e) => {
            if let Err(mark_err) = ctx.catalog.fail_session(&job.session_id).await {
                warn!(
                    session_id = %job.session_id,
                    "could not mark session failed: {}", mark_err
                );
            }
            return Err(e);
        }
    };

    fan_out(ctx, &video_id).await?;

    info!(
        session_id = %job.session_id,
        video_id = %video_id,
        "assembled session into video"
    );
    Ok(())
}

async fn assemble(ctx: &PipelineContext, session: &UploadSession) -> WorkerResult<VideoId> {
    // a second delivery may observe a received-set that no longer covers
    // the declared range
    let missing = session.missing_chunks();
    if !missing.is_empty() {
        return Err(WorkerError::IncompleteSession {
            session_id: session.session_id.clone(),
            missing,
        });
    }

    let video_id = VideoId::new();
    let original = ctx.assets.original_path(&video_id, &session.filename);

    let assembled_bytes = ctx
        .chunks
        .assemble_into(&session.session_id, session.total_chunks, &original)
        .await?;

    let probe = ctx.media.extract_metadata(&original).await?;

    let video = Video::from_assembly(
        video_id.clone(),
        &session.filename,
        assembled_bytes,
        probe.duration_seconds,
        probe.resolution(),
        probe.codec,
        probe.format,
        original.to_string_lossy(),
    );
    let qualities = VideoQuality::placeholders(&video_id);
    ctx.catalog
        .insert_video_with_qualities(video, qualities)
        .await?;

    ctx.chunks.delete_session(&session.session_id).await?;
    ctx.catalog.complete_session(&session.session_id).await?;

    Ok(video_id)
}

async fn fan_out(ctx: &PipelineContext, video_id: &VideoId) -> WorkerResult<()> {
    for quality in QualityLevel::all() {
        ctx.dispatcher
            .dispatch(PipelineJob::Transcode(TranscodeJob::new(
                video_id.clone(),
                quality,
            )))
            .await?;
    }
    ctx.dispatcher
        .dispatch(PipelineJob::GenerateThumbnail(GenerateThumbnailJob::new(
            video_id.clone(),
        )))
        .await?;
    Ok(())
}
