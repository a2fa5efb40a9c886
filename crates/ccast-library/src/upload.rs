//! Chunked upload session lifecycle.

use std::sync::Arc;

use tracing::{debug, info};

use ccast_models::{SessionId, UploadProgress, UploadSession, Video};
use ccast_queue::{AssembleSessionJob, JobDispatcher, PipelineJob};
use ccast_store::{Catalog, ChunkStore};

use crate::error::{LibraryError, LibraryResult};

/// Owns session lifecycle and chunk bookkeeping.
pub struct UploadService {
    catalog: Arc<dyn Catalog>,
    chunks: ChunkStore,
    dispatcher: Arc<dyn JobDispatcher>,
}

impl UploadService {
    pub fn new(
        catalog: Arc<dyn Catalog>,
        chunks: ChunkStore,
        dispatcher: Arc<dyn JobDispatcher>,
    ) -> Self {
        Self {
            catalog,
            chunks,
            dispatcher,
        }
    }

    /// Create a fresh `pending` session with an empty received-set.
    pub async fn initialize_upload(
        &self,
        filename: &str,
        file_size_bytes: u64,
        total_chunks: u32,
    ) -> LibraryResult<UploadSession> {
        if file_size_bytes == 0 {
            return Err(LibraryError::invalid_argument(
                "file_size_bytes must be positive",
            ));
        }
        if total_chunks == 0 {
            return Err(LibraryError::invalid_argument(
                "total_chunks must be positive",
            ));
        }

        let session = UploadSession::new(filename, file_size_bytes, total_chunks);
        self.catalog.insert_session(session.clone()).await?;

        info!(
            session_id = %session.session_id,
            filename,
            total_chunks,
            "initialized upload session"
        );
        Ok(session)
    }

    /// Store one fragment. Idempotent per `(session, index)`: overwriting
    /// is safe and re-adding the index to the received-set is a no-op.
    pub async fn store_chunk(
        &self,
        session_id: &SessionId,
        chunk_index: u32,
        chunk_bytes: &[u8],
    ) -> LibraryResult<()> {
        let session = self.require_session(session_id).await?;

        if session.is_expired() {
            return Err(LibraryError::ExpiredSession(session_id.clone()));
        }
        if chunk_index >= session.total_chunks {
            return Err(LibraryError::InvalidChunk {
                index: chunk_index,
                total: session.total_chunks,
            });
        }

        self.chunks
            .write_chunk(session_id, chunk_index, chunk_bytes)
            .await?;
        self.catalog.record_chunk(session_id, chunk_index).await?;

        debug!(session_id = %session_id, chunk_index, "stored chunk");
        Ok(())
    }

    /// Progress snapshot for a session.
    pub async fn upload_progress(&self, session_id: &SessionId) -> LibraryResult<UploadProgress> {
        Ok(self.require_session(session_id).await?.progress())
    }

    /// Gate completion on the received-set covering `[0, total)` and hand
    /// the session to the assembly worker.
    ///
    /// Returns an in-memory placeholder descriptor for immediate client
    /// feedback; the canonical video record is created by assembly.
    pub async fn complete_upload(&self, session_id: &SessionId) -> LibraryResult<Video> {
        let session = self.require_session(session_id).await?;

        let missing = session.missing_chunks();
        if !missing.is_empty() {
            return Err(LibraryError::IncompleteUpload { missing });
        }

        self.dispatcher
            .dispatch(PipelineJob::AssembleSession(AssembleSessionJob::new(
                session_id.clone(),
            )))
            .await?;

        info!(session_id = %session_id, "upload complete, assembly enqueued");
        Ok(Video::placeholder(
            session.filename,
            session.file_size_bytes,
        ))
    }

    /// Drop a session and everything it stored.
    pub async fn cancel_upload(&self, session_id: &SessionId) -> LibraryResult<()> {
        self.require_session(session_id).await?;

        self.chunks.delete_session(session_id).await?;
        self.catalog.delete_session(session_id).await?;

        info!(session_id = %session_id, "upload cancelled");
        Ok(())
    }

    async fn require_session(&self, session_id: &SessionId) -> LibraryResult<UploadSession> {
        self.catalog
            .get_session(session_id)
            .await?
            .ok_or_else(|| LibraryError::InvalidSession(session_id.clone()))
    }
}
