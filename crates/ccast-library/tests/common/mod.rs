//! Shared fixtures for the library test suites.
#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use ccast_models::{QualityLevel, Video, VideoId, VideoQuality};
use ccast_queue::{JobDispatcher, PipelineJob, QueueResult};
use ccast_store::Catalog;

/// Dispatcher double that records every enqueued job.
#[derive(Default)]
pub struct RecordingDispatcher {
    pub jobs: Mutex<Vec<PipelineJob>>,
}

#[async_trait]
impl JobDispatcher for RecordingDispatcher {
    async fn dispatch(&self, job: PipelineJob) -> QueueResult<String> {
        let mut jobs = self.jobs.lock().await;
        jobs.push(job);
        Ok(format!("msg-{}", jobs.len()))
    }
}

/// Insert a video whose four renditions all completed, with real files
/// on disk so URL and deletion paths can be exercised.
pub async fn seed_completed_video(
    catalog: &Arc<dyn Catalog>,
    assets: &ccast_store::AssetStore,
) -> VideoId {
    let video_id = VideoId::new();
    let original = assets.original_path(&video_id, "lecture.mp4");
    tokio::fs::create_dir_all(original.parent().unwrap())
        .await
        .unwrap();
    tokio::fs::write(&original, b"original bytes").await.unwrap();

    let mut video = Video::from_assembly(
        video_id.clone(),
        "lecture.mp4",
        14,
        42.0,
        "1920x1080",
        "h264",
        "mp4",
        original.to_string_lossy(),
    );

    let mut qualities = VideoQuality::placeholders(&video_id);
    for rendition in qualities.iter_mut() {
        let path = assets.quality_path(&video_id, rendition.quality);
        tokio::fs::write(&path, rendition.quality.as_str())
            .await
            .unwrap();
        rendition.start().unwrap();
        rendition
            .complete(path.to_string_lossy(), rendition.quality.as_str().len() as u64)
            .unwrap();
    }
    video.recompute_from_qualities(&qualities);

    catalog
        .insert_video_with_qualities(video, qualities)
        .await
        .unwrap();
    video_id
}

/// Insert a video still mid-transcode: two renditions done, two running.
pub async fn seed_processing_video(catalog: &Arc<dyn Catalog>) -> VideoId {
    let video_id = VideoId::new();
    let mut video = Video::from_assembly(
        video_id.clone(),
        "draft.mp4",
        14,
        42.0,
        "1920x1080",
        "h264",
        "mp4",
        "/nonexistent/original.mp4",
    );

    let mut qualities = VideoQuality::placeholders(&video_id);
    for rendition in qualities.iter_mut() {
        rendition.start().unwrap();
    }
    for rendition in qualities
        .iter_mut()
        .filter(|q| matches!(q.quality, QualityLevel::Q360p | QualityLevel::Q480p))
    {
        rendition.complete("done", 1).unwrap();
    }

    video.recompute_from_qualities(&qualities);

    catalog
        .insert_video_with_qualities(video, qualities)
        .await
        .unwrap();
    video_id
}
