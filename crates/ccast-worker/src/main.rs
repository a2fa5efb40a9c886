//! CourseCast pipeline worker binary.

use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ccast_media::FfmpegAdapter;
use ccast_queue::{JobQueue, QueueConfig};
use ccast_store::{AssetStore, ChunkStore, MemoryCatalog, StorageConfig};
use ccast_worker::{JobExecutor, PipelineContext, WorkerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    init_tracing();

    info!("starting ccast-worker");

    let worker_config = WorkerConfig::from_env();
    let storage_config = StorageConfig::from_env();
    let queue_config = QueueConfig::from_env();
    info!(?worker_config, ?storage_config, "worker configuration");

    let queue = JobQueue::new(queue_config.clone()).context("create job queue")?;
    let dispatcher = Arc::new(JobQueue::new(queue_config).context("create dispatcher")?);

    let mut media = FfmpegAdapter::new();
    if let Some(timeout) = worker_config.transcode_timeout {
        media = media.with_transcode_timeout(timeout.as_secs());
    }

    let ctx = Arc::new(PipelineContext::new(
        Arc::new(MemoryCatalog::new()),
        ChunkStore::new(&storage_config),
        AssetStore::new(&storage_config),
        Arc::new(media),
        dispatcher,
    ));

    let executor = Arc::new(JobExecutor::new(worker_config, queue, ctx));

    let signal_executor = Arc::clone(&executor);
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("received shutdown signal");
        signal_executor.shutdown();
    });

    executor.run().await.context("executor run")?;

    info!("worker shutdown complete");
    Ok(())
}

fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("ccast=info".parse().expect("valid directive"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}
