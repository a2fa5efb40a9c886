//! Shared handles for the job handlers.

use std::sync::Arc;

use ccast_media::MediaAdapter;
use ccast_queue::JobDispatcher;
use ccast_store::{AssetStore, Catalog, ChunkStore};

/// Everything a job handler needs, bundled once per worker process.
pub struct PipelineContext {
    pub catalog: Arc<dyn Catalog>,
    pub chunks: ChunkStore,
    pub assets: AssetStore,
    pub media: Arc<dyn MediaAdapter>,
    pub dispatcher: Arc<dyn JobDispatcher>,
}

impl PipelineContext {
    pub fn new(
        catalog: Arc<dyn Catalog>,
        chunks: ChunkStore,
        assets: AssetStore,
        media: Arc<dyn MediaAdapter>,
        dispatcher: Arc<dyn JobDispatcher>,
    ) -> Self {
        Self {
            catalog,
            chunks,
            assets,
            media,
            dispatcher,
        }
    }
}
