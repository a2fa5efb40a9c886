//! Upload session lifecycle.

mod common;

use std::sync::Arc;

use tempfile::TempDir;

use ccast_library::{LibraryError, UploadService};
use ccast_models::{SessionId, UploadSession, VideoStatus};
use ccast_queue::PipelineJob;
use ccast_store::{Catalog, ChunkStore, MemoryCatalog, StorageConfig};

use common::RecordingDispatcher;

struct Fixture {
    _dir: TempDir,
    service: UploadService,
    catalog: Arc<dyn Catalog>,
    chunks: ChunkStore,
    dispatcher: Arc<RecordingDispatcher>,
}

fn fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    let config = StorageConfig::new(dir.path());
    let catalog: Arc<dyn Catalog> = Arc::new(MemoryCatalog::new());
    let chunks = ChunkStore::new(&config);
    let dispatcher = Arc::new(RecordingDispatcher::default());

    let service = UploadService::new(
        Arc::clone(&catalog),
        chunks.clone(),
        Arc::clone(&dispatcher) as Arc<dyn ccast_queue::JobDispatcher>,
    );

    Fixture {
        _dir: dir,
        service,
        catalog,
        chunks,
        dispatcher,
    }
}

#[tokio::test]
async fn initialize_rejects_non_positive_declarations() {
    let f = fixture();

    let err = f.service.initialize_upload("a.mp4", 0, 3).await.unwrap_err();
    assert_eq!(err.code(), "invalid_argument");

    let err = f.service.initialize_upload("a.mp4", 10, 0).await.unwrap_err();
    assert_eq!(err.code(), "invalid_argument");
}

#[tokio::test]
async fn chunk_writes_validate_session_and_index() {
    let f = fixture();

    let missing = SessionId::from_string("no-such-session");
    let err = f.service.store_chunk(&missing, 0, b"x").await.unwrap_err();
    assert!(matches!(err, LibraryError::InvalidSession(_)));

    let session = f.service.initialize_upload("a.mp4", 10, 3).await.unwrap();
    let err = f
        .service
        .store_chunk(&session.session_id, 3, b"x")
        .await
        .unwrap_err();
    match err {
        LibraryError::InvalidChunk { index, total } => {
            assert_eq!((index, total), (3, 3));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn expired_sessions_refuse_chunk_writes() {
    let f = fixture();

    let mut session = UploadSession::new("late.mp4", 10, 2);
    session.created_at = chrono::Utc::now() - chrono::Duration::hours(25);
    let session_id = session.session_id.clone();
    f.catalog.insert_session(session).await.unwrap();

    let err = f.service.store_chunk(&session_id, 0, b"x").await.unwrap_err();
    assert_eq!(err.code(), "expired_session");
}

#[tokio::test]
async fn progress_reflects_the_received_set() {
    let f = fixture();
    let session = f.service.initialize_upload("a.mp4", 10, 3).await.unwrap();
    let id = &session.session_id;

    f.service.store_chunk(id, 1, b"bb").await.unwrap();
    let progress = f.service.upload_progress(id).await.unwrap();
    assert_eq!(progress.received, 1);
    assert_eq!(progress.total, 3);
    assert_eq!(progress.percentage, 33.33);

    // duplicate write is a set no-op
    f.service.store_chunk(id, 1, b"bb").await.unwrap();
    assert_eq!(f.service.upload_progress(id).await.unwrap().received, 1);
}

#[tokio::test]
async fn completion_gate_reports_exact_missing_indices() {
    let f = fixture();
    let session = f.service.initialize_upload("a.mp4", 10, 5).await.unwrap();
    let id = &session.session_id;

    for index in [0u32, 1, 3] {
        f.service.store_chunk(id, index, b"x").await.unwrap();
    }

    let err = f.service.complete_upload(id).await.unwrap_err();
    match err {
        LibraryError::IncompleteUpload { missing } => assert_eq!(missing, vec![2, 4]),
        other => panic!("unexpected error: {other}"),
    }
    // nothing was enqueued
    assert!(f.dispatcher.jobs.lock().await.is_empty());
}

#[tokio::test]
async fn completion_enqueues_assembly_and_returns_placeholder() {
    let f = fixture();
    let session = f.service.initialize_upload("a.mp4", 10, 2).await.unwrap();
    let id = &session.session_id;

    f.service.store_chunk(id, 0, b"aa").await.unwrap();
    f.service.store_chunk(id, 1, b"bb").await.unwrap();

    let placeholder = f.service.complete_upload(id).await.unwrap();
    assert_eq!(placeholder.status, VideoStatus::Pending);
    assert_eq!(placeholder.processing_progress, 0);
    assert_eq!(placeholder.original_filename, "a.mp4");

    let jobs = f.dispatcher.jobs.lock().await;
    assert_eq!(jobs.len(), 1);
    match &jobs[0] {
        PipelineJob::AssembleSession(job) => assert_eq!(&job.session_id, id),
        other => panic!("unexpected job: {other:?}"),
    }
}

#[tokio::test]
async fn cancel_removes_chunks_and_the_session_row() {
    let f = fixture();
    let session = f.service.initialize_upload("a.mp4", 10, 2).await.unwrap();
    let id = &session.session_id;

    f.service.store_chunk(id, 0, b"aa").await.unwrap();
    assert!(f.chunks.session_dir(id).exists());

    f.service.cancel_upload(id).await.unwrap();
    assert!(!f.chunks.session_dir(id).exists());
    assert!(f.catalog.get_session(id).await.unwrap().is_none());

    let err = f.service.cancel_upload(id).await.unwrap_err();
    assert!(matches!(err, LibraryError::InvalidSession(_)));
}

#[tokio::test]
async fn cancel_succeeds_with_zero_stored_chunks() {
    let f = fixture();
    let session = f.service.initialize_upload("a.mp4", 10, 2).await.unwrap();
    f.service.cancel_upload(&session.session_id).await.unwrap();
}
