//! Enqueue seam between services/workers and the transport.

use async_trait::async_trait;

use crate::error::QueueResult;
use crate::job::PipelineJob;
use crate::queue::JobQueue;

/// Anything that can hand a unit of work to the worker pool. The
/// transport behind it is assumed to deliver each accepted job at least
/// once.
#[async_trait]
pub trait JobDispatcher: Send + Sync {
    /// Enqueue one job, returning a transport-assigned message id.
    async fn dispatch(&self, job: PipelineJob) -> QueueResult<String>;
}

#[async_trait]
impl JobDispatcher for JobQueue {
    async fn dispatch(&self, job: PipelineJob) -> QueueResult<String> {
        self.enqueue(job).await
    }
}
