//! Pipeline job queue.
//!
//! This crate provides:
//! - The three unit-of-work shapes as one closed [`PipelineJob`] enum
//! - [`JobDispatcher`]: the enqueue interface services depend on
//! - [`JobQueue`]: the Redis Streams transport with consumer groups,
//!   idempotency dedup, retry counting and a dead-letter stream

pub mod dispatch;
pub mod error;
pub mod job;
pub mod queue;

pub use dispatch::JobDispatcher;
pub use error::{QueueError, QueueResult};
pub use job::{AssembleSessionJob, GenerateThumbnailJob, PipelineJob, TranscodeJob};
pub use queue::{JobQueue, QueueConfig};
