//! Queue executor: the single entry point dispatching every unit of work.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn, Instrument};
use uuid::Uuid;

use ccast_queue::{JobQueue, PipelineJob};

use crate::assemble::run_assembly;
use crate::config::WorkerConfig;
use crate::context::PipelineContext;
use crate::error::WorkerResult;
use crate::logging::JobLog;
use crate::thumbnail::run_thumbnail;
use crate::transcode::run_transcode;

/// Consumes pipeline jobs with bounded concurrency.
pub struct JobExecutor {
    config: WorkerConfig,
    queue: Arc<JobQueue>,
    ctx: Arc<PipelineContext>,
    job_semaphore: Arc<Semaphore>,
    shutdown: tokio::sync::watch::Sender<bool>,
    consumer_name: String,
}

impl JobExecutor {
    pub fn new(config: WorkerConfig, queue: JobQueue, ctx: Arc<PipelineContext>) -> Self {
        let job_semaphore = Arc::new(Semaphore::new(config.max_concurrent_jobs));
        let (shutdown, _) = tokio::sync::watch::channel(false);
        let consumer_name = format!("worker-{}", Uuid::new_v4());

        Self {
            config,
            queue: Arc::new(queue),
            ctx,
            job_semaphore,
            shutdown,
            consumer_name,
        }
    }

    /// Run until shutdown is signalled, then drain in-flight jobs.
    pub async fn run(&self) -> WorkerResult<()> {
        info!(
            consumer = %self.consumer_name,
            max_concurrent_jobs = self.config.max_concurrent_jobs,
            "starting job executor"
        );

        self.queue.init().await?;

        let mut shutdown_rx = self.shutdown.subscribe();
        let claim_task = self.spawn_claim_loop();

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("shutdown signal received, stopping executor");
                        break;
                    }
                }
                result = self.consume_batch() => {
                    if let Err(e) = result {
                        error!("error consuming jobs: {}", e);
                        tokio::time::sleep(Duration::from_secs(5)).await;
                    }
                }
            }
        }

        claim_task.abort();

        info!("waiting for in-flight jobs to drain");
        let _ = tokio::time::timeout(self.config.shutdown_timeout, self.wait_for_jobs()).await;

        info!("job executor stopped");
        Ok(())
    }

    /// Signal shutdown.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }

    /// Periodically claim deliveries stranded by crashed consumers.
    fn spawn_claim_loop(&self) -> tokio::task::JoinHandle<()> {
        let queue = Arc::clone(&self.queue);
        let ctx = Arc::clone(&self.ctx);
        let semaphore = Arc::clone(&self.job_semaphore);
        let consumer_name = self.consumer_name.clone();
        let claim_interval = self.config.claim_interval;
        let min_idle_ms = self.config.claim_min_idle.as_millis() as u64;
        let mut shutdown_rx = self.shutdown.subscribe();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(claim_interval);
            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            break;
                        }
                    }
                    _ = interval.tick() => {
                        match queue.claim_pending(&consumer_name, min_idle_ms, 5).await {
                            Ok(jobs) if !jobs.is_empty() => {
                                info!("claimed {} stranded jobs", jobs.len());
                                for (message_id, job) in jobs {
                                    let Ok(permit) =
                                        Arc::clone(&semaphore).acquire_owned().await
                                    else {
                                        return;
                                    };
                                    let ctx = Arc::clone(&ctx);
                                    let queue = Arc::clone(&queue);
                                    tokio::spawn(async move {
                                        let _permit = permit;
                                        Self::execute_job(ctx, queue, message_id, job).await;
                                    });
                                }
                            }
                            Ok(_) => {}
                            Err(e) => warn!("failed to claim stranded jobs: {}", e),
                        }
                    }
                }
            }
        })
    }

    /// Pull up to the free slot count of new deliveries and spawn them.
    async fn consume_batch(&self) -> WorkerResult<()> {
        let available = self.job_semaphore.available_permits();
        if available == 0 {
            tokio::time::sleep(Duration::from_millis(100)).await;
            return Ok(());
        }

        let jobs = self
            .queue
            .consume(&self.consumer_name, 1000, available.min(5))
            .await?;

        if jobs.is_empty() {
            return Ok(());
        }

        debug!("consumed {} jobs", jobs.len());

        for (message_id, job) in jobs {
            // acquisition only fails when the semaphore closed at shutdown
            let Ok(permit) = Arc::clone(&self.job_semaphore).acquire_owned().await else {
                return Ok(());
            };
            let ctx = Arc::clone(&self.ctx);
            let queue = Arc::clone(&self.queue);

            tokio::spawn(async move {
                let _permit = permit;
                Self::execute_job(ctx, queue, message_id, job).await;
            });
        }

        Ok(())
    }

    /// Execute one delivery, then ack, retry or dead-letter it.
    ///
    /// Only transcode failures are retryable by default; assembly
    /// failures go straight to the dead-letter stream after the session
    /// was marked failed, and thumbnails never fail.
    async fn execute_job(
        ctx: Arc<PipelineContext>,
        queue: Arc<JobQueue>,
        message_id: String,
        job: PipelineJob,
    ) {
        let log = JobLog::for_job(&job);
        log.start();

        let result = Self::process_job(&ctx, &job).instrument(log.span()).await;

        match result {
            Ok(()) => {
                log.done();
                if let Err(e) = queue.ack(&message_id).await {
                    error!("failed to ack {}: {}", message_id, e);
                }
                if let Err(e) = queue.clear_dedup(&job).await {
                    warn!("failed to clear dedup key: {}", e);
                }
            }
            Err(e) => {
                log.fail(&e.to_string());

                let exhausted = if job.retry_on_failure() {
                    let attempts = queue.increment_retry(&message_id).await.unwrap_or(u32::MAX);
                    if attempts < queue.max_retries() {
                        info!(
                            "job will be redelivered (attempt {}/{})",
                            attempts,
                            queue.max_retries()
                        );
                        false
                    } else {
                        warn!("job exceeded max retries ({})", queue.max_retries());
                        true
                    }
                } else {
                    true
                };

                if exhausted {
                    if let Err(dlq_err) = queue.dlq(&message_id, &job, &e.to_string()).await {
                        error!("failed to dead-letter {}: {}", message_id, dlq_err);
                    }
                    if let Err(e) = queue.clear_dedup(&job).await {
                        warn!("failed to clear dedup key: {}", e);
                    }
                }
            }
        }
    }

    /// Dispatch one unit of work to its handler.
    async fn process_job(ctx: &PipelineContext, job: &PipelineJob) -> WorkerResult<()> {
        match job {
            PipelineJob::AssembleSession(j) => run_assembly(ctx, j).await,
            PipelineJob::Transcode(j) => run_transcode(ctx, j).await,
            PipelineJob::GenerateThumbnail(j) => {
                // best effort by contract
                run_thumbnail(ctx, j).await;
                Ok(())
            }
        }
    }

    async fn wait_for_jobs(&self) {
        loop {
            if self.job_semaphore.available_permits() == self.config.max_concurrent_jobs {
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }
}
