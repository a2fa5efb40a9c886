//! Content-addressed chunk storage for in-flight uploads.
//!
//! Fragments live at `temp/uploads/<sessionId>/chunk_<index>`. Writes are
//! idempotent: re-storing an index overwrites the same blob.

use std::path::PathBuf;

use tokio::fs;
use tokio::io::AsyncWriteExt;

use ccast_models::SessionId;

use crate::config::StorageConfig;
use crate::error::{StoreError, StoreResult};

#[derive(Debug, Clone)]
pub struct ChunkStore {
    uploads_dir: PathBuf,
}

impl ChunkStore {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            uploads_dir: config.uploads_dir(),
        }
    }

    /// Directory holding one session's fragments.
    pub fn session_dir(&self, session_id: &SessionId) -> PathBuf {
        self.uploads_dir.join(session_id.as_str())
    }

    /// Path of one fragment.
    pub fn chunk_path(&self, session_id: &SessionId, index: u32) -> PathBuf {
        self.session_dir(session_id).join(format!("chunk_{index}"))
    }

    /// Write one fragment. Overwrites any previous blob at the same index.
    pub async fn write_chunk(
        &self,
        session_id: &SessionId,
        index: u32,
        bytes: &[u8],
    ) -> StoreResult<()> {
        let path = self.chunk_path(session_id, index);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, bytes).await?;
        Ok(())
    }

    /// Concatenate chunks `0..total` into `dest`, byte-exact and strictly
    /// in index order. Returns the number of bytes written.
    pub async fn assemble_into(
        &self,
        session_id: &SessionId,
        total: u32,
        dest: &std::path::Path,
    ) -> StoreResult<u64> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut out = fs::File::create(dest).await?;
        let mut written: u64 = 0;

        for index in 0..total {
            let path = self.chunk_path(session_id, index);
            let bytes = fs::read(&path).await.map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    StoreError::MissingChunk {
                        session_id: session_id.clone(),
                        index,
                    }
                } else {
                    StoreError::Io(e)
                }
            })?;
            out.write_all(&bytes).await?;
            written += bytes.len() as u64;
        }

        out.flush().await?;
        Ok(written)
    }

    /// Delete every stored fragment for a session, directory-level.
    /// Succeeds when nothing was ever stored.
    pub async fn delete_session(&self, session_id: &SessionId) -> StoreResult<()> {
        match fs::remove_dir_all(self.session_dir(session_id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> ChunkStore {
        ChunkStore::new(&StorageConfig::new(dir.path()))
    }

    #[tokio::test]
    async fn assembles_byte_exact_regardless_of_write_order() {
        let dir = TempDir::new().unwrap();
        let chunks = store(&dir);
        let session = SessionId::new();

        // stored out of order
        chunks.write_chunk(&session, 2, b"cccc").await.unwrap();
        chunks.write_chunk(&session, 0, b"aa").await.unwrap();
        chunks.write_chunk(&session, 1, b"b").await.unwrap();

        let dest = dir.path().join("out.bin");
        let written = chunks.assemble_into(&session, 3, &dest).await.unwrap();

        assert_eq!(written, 7);
        assert_eq!(fs::read(&dest).await.unwrap(), b"aabcccc");
    }

    #[tokio::test]
    async fn rewriting_a_chunk_overwrites_in_place() {
        let dir = TempDir::new().unwrap();
        let chunks = store(&dir);
        let session = SessionId::new();

        chunks.write_chunk(&session, 0, b"old").await.unwrap();
        chunks.write_chunk(&session, 0, b"new!").await.unwrap();

        let dest = dir.path().join("out.bin");
        chunks.assemble_into(&session, 1, &dest).await.unwrap();
        assert_eq!(fs::read(&dest).await.unwrap(), b"new!");
    }

    #[tokio::test]
    async fn assembly_reports_the_missing_index() {
        let dir = TempDir::new().unwrap();
        let chunks = store(&dir);
        let session = SessionId::new();

        chunks.write_chunk(&session, 0, b"a").await.unwrap();
        chunks.write_chunk(&session, 2, b"c").await.unwrap();

        let dest = dir.path().join("out.bin");
        let err = chunks.assemble_into(&session, 3, &dest).await.unwrap_err();
        match err {
            StoreError::MissingChunk { index, .. } => assert_eq!(index, 1),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn delete_session_tolerates_empty_sessions() {
        let dir = TempDir::new().unwrap();
        let chunks = store(&dir);
        let session = SessionId::new();

        // never stored anything
        chunks.delete_session(&session).await.unwrap();

        chunks.write_chunk(&session, 0, b"a").await.unwrap();
        chunks.delete_session(&session).await.unwrap();
        assert!(!chunks.session_dir(&session).exists());
    }
}
