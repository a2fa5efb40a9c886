//! CourseCast pipeline workers.
//!
//! This crate provides:
//! - The single job entry point dispatching the three unit-of-work shapes
//! - Assembly, transcode and thumbnail handlers
//! - A queue executor with bounded concurrency, retry/DLQ bookkeeping and
//!   graceful shutdown

pub mod assemble;
pub mod config;
pub mod context;
pub mod error;
pub mod executor;
pub mod logging;
pub mod thumbnail;
pub mod transcode;

pub use config::WorkerConfig;
pub use context::PipelineContext;
pub use error::{WorkerError, WorkerResult};
pub use executor::JobExecutor;
pub use logging::JobLog;
