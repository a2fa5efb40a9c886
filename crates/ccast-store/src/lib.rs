//! Storage for the CourseCast media pipeline.
//!
//! This crate provides:
//! - [`ChunkStore`]: filesystem blob storage for in-flight upload fragments
//! - [`AssetStore`]: the per-video asset directory layout
//! - [`Catalog`]: the repository interface over sessions, videos,
//!   renditions and lesson associations
//! - [`MemoryCatalog`]: the in-process implementation

pub mod assets;
pub mod catalog;
pub mod chunks;
pub mod config;
pub mod error;
pub mod memory;

pub use assets::AssetStore;
pub use catalog::{Catalog, QualityOutcome, VideoAggregate};
pub use chunks::ChunkStore;
pub use config::StorageConfig;
pub use error::{StoreError, StoreResult};
pub use memory::MemoryCatalog;
