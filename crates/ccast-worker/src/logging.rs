//! Structured job logging.

use tracing::{error, info, warn, Span};

use ccast_queue::PipelineJob;

/// Per-job logger carrying the identifiers every line should have.
#[derive(Debug, Clone)]
pub struct JobLog {
    job_id: String,
    kind: &'static str,
}

impl JobLog {
    pub fn for_job(job: &PipelineJob) -> Self {
        Self {
            job_id: job.job_id().to_string(),
            kind: job.kind(),
        }
    }

    pub fn start(&self) {
        info!(job_id = %self.job_id, kind = self.kind, "job started");
    }

    pub fn done(&self) {
        info!(job_id = %self.job_id, kind = self.kind, "job completed");
    }

    pub fn warn(&self, message: &str) {
        warn!(job_id = %self.job_id, kind = self.kind, "{}", message);
    }

    pub fn fail(&self, message: &str) {
        error!(job_id = %self.job_id, kind = self.kind, "job failed: {}", message);
    }

    /// Span to instrument the handler's future with.
    pub fn span(&self) -> Span {
        tracing::info_span!("job", job_id = %self.job_id, kind = self.kind)
    }
}
