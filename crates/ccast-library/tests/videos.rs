//! Video lifecycle service.

mod common;

use std::path::Path;
use std::sync::Arc;

use tempfile::TempDir;

use ccast_library::{LibraryError, VideoFilters, VideoService};
use ccast_models::{Lesson, QualityLevel, VideoId, VideoStatus};
use ccast_store::{AssetStore, Catalog, MemoryCatalog, StorageConfig};

use common::{seed_completed_video, seed_processing_video};

struct Fixture {
    _dir: TempDir,
    service: VideoService,
    catalog: Arc<dyn Catalog>,
    assets: AssetStore,
}

fn fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    let config = StorageConfig::new(dir.path());
    let catalog: Arc<dyn Catalog> = Arc::new(MemoryCatalog::new());
    let assets = AssetStore::new(&config);

    let service = VideoService::new(Arc::clone(&catalog), assets.clone(), "/media");

    Fixture {
        _dir: dir,
        service,
        catalog,
        assets,
    }
}

async fn attach_lesson(catalog: &Arc<dyn Catalog>, video_id: &VideoId) -> ccast_models::LessonId {
    let lesson = Lesson::new("Unit 1");
    let lesson_id = lesson.id.clone();
    catalog.insert_lesson(lesson).await.unwrap();
    catalog.upsert_link(&lesson_id, video_id).await.unwrap();
    lesson_id
}

#[tokio::test]
async fn get_and_update_display_name() {
    let f = fixture();
    let id = seed_completed_video(&f.catalog, &f.assets).await;

    let err = f
        .service
        .update_display_name(&id, "   ")
        .await
        .unwrap_err();
    assert_eq!(err.code(), "invalid_argument");

    let updated = f
        .service
        .update_display_name(&id, "  Week 1 intro  ")
        .await
        .unwrap();
    assert_eq!(updated.display_name, "Week 1 intro");
    // technical metadata untouched
    assert_eq!(updated.resolution, "1920x1080");

    let missing = VideoId::from_string("missing");
    let err = f.service.get_video(&missing).await.unwrap_err();
    assert!(matches!(err, LibraryError::VideoNotFound(_)));
}

#[tokio::test]
async fn delete_refuses_while_associated_and_leaves_files() {
    let f = fixture();
    let id = seed_completed_video(&f.catalog, &f.assets).await;
    let lesson_id = attach_lesson(&f.catalog, &id).await;

    let err = f.service.delete_video(&id).await.unwrap_err();
    match err {
        LibraryError::VideoInUse { lessons } => assert_eq!(lessons, vec![lesson_id]),
        other => panic!("unexpected error: {other}"),
    }

    // records and files untouched
    assert!(f.catalog.get_video(&id).await.unwrap().is_some());
    assert!(f.assets.asset_dir(&id).exists());
    assert!(f.assets.quality_path(&id, QualityLevel::Q720p).exists());
}

#[tokio::test]
async fn delete_removes_rows_and_all_four_files() {
    let f = fixture();
    let id = seed_completed_video(&f.catalog, &f.assets).await;

    f.service.delete_video(&id).await.unwrap();

    assert!(f.catalog.get_video(&id).await.unwrap().is_none());
    assert!(f.catalog.list_qualities(&id).await.unwrap().is_empty());
    assert!(!f.assets.asset_dir(&id).exists());
}

#[tokio::test]
async fn delete_tolerates_already_missing_files() {
    let f = fixture();
    let id = seed_completed_video(&f.catalog, &f.assets).await;

    tokio::fs::remove_file(f.assets.quality_path(&id, QualityLevel::Q360p))
        .await
        .unwrap();

    f.service.delete_video(&id).await.unwrap();
    assert!(f.catalog.get_video(&id).await.unwrap().is_none());
}

#[tokio::test]
async fn bulk_delete_evaluates_each_id_independently() {
    let f = fixture();
    let deletable = seed_completed_video(&f.catalog, &f.assets).await;
    let in_use = seed_completed_video(&f.catalog, &f.assets).await;
    attach_lesson(&f.catalog, &in_use).await;
    let missing = VideoId::from_string("missing");

    let report = f
        .service
        .bulk_delete_videos(&[deletable.clone(), missing.clone(), in_use.clone()])
        .await
        .unwrap();

    assert_eq!(report.deleted, vec![deletable]);
    assert_eq!(report.failed.len(), 2);

    let failure_codes: Vec<(&VideoId, &str)> =
        report.failed.iter().map(|fail| (&fail.id, fail.code)).collect();
    assert!(failure_codes.contains(&(&missing, "video_not_found")));
    assert!(failure_codes.contains(&(&in_use, "video_in_use")));

    // the in-use video survived
    assert!(f.catalog.get_video(&in_use).await.unwrap().is_some());
}

#[tokio::test]
async fn processing_progress_counts_completed_renditions() {
    let f = fixture();
    let id = seed_processing_video(&f.catalog).await;

    let report = f.service.processing_progress(&id).await.unwrap();
    assert_eq!(report.status, VideoStatus::Processing);
    assert_eq!(report.completed_qualities, 2);
    assert_eq!(report.progress, 50);
}

#[tokio::test]
async fn urls_include_only_completed_renditions_with_files() {
    let f = fixture();
    let completed = seed_completed_video(&f.catalog, &f.assets).await;

    // one completed rendition lost its file
    tokio::fs::remove_file(f.assets.quality_path(&completed, QualityLevel::Q1080p))
        .await
        .unwrap();

    let urls = f.service.video_urls(&completed).await.unwrap();
    assert_eq!(urls.qualities.len(), 3);
    assert_eq!(
        urls.qualities.get(&QualityLevel::Q720p).unwrap(),
        &format!("/media/videos/{completed}/720p.mp4")
    );
    assert!(!urls.qualities.contains_key(&QualityLevel::Q1080p));
    assert!(urls.thumbnail.is_none());

    // thumbnail appears once recorded
    let thumb = f.assets.thumbnail_path(&completed);
    tokio::fs::write(&thumb, b"jpg").await.unwrap();
    f.catalog
        .set_thumbnail_path(&completed, &thumb.to_string_lossy())
        .await
        .unwrap();
    let urls = f.service.video_urls(&completed).await.unwrap();
    assert_eq!(
        urls.thumbnail.unwrap(),
        format!("/media/videos/{completed}/thumbnail.jpg")
    );

    let in_flight = seed_processing_video(&f.catalog).await;
    let urls = f.service.video_urls(&in_flight).await.unwrap();
    // its two completed renditions point at paths that do not exist
    assert!(!Path::new("done").exists());
    assert!(urls.qualities.is_empty());
}

#[tokio::test]
async fn listing_filters_and_clamps_page_size() {
    let f = fixture();
    let completed = seed_completed_video(&f.catalog, &f.assets).await;
    let processing = seed_processing_video(&f.catalog).await;
    let lesson_id = attach_lesson(&f.catalog, &completed).await;

    f.service
        .update_display_name(&completed, "Ownership deep dive")
        .await
        .unwrap();

    let all = f.service.list_videos(&VideoFilters::default(), None).await.unwrap();
    assert_eq!(all.total, 2);
    assert_eq!(all.page_size, 20);

    let page = f
        .service
        .list_videos(&VideoFilters::default(), Some(100_000))
        .await
        .unwrap();
    assert_eq!(page.page_size, 100);

    let only_processing = f
        .service
        .list_videos(
            &VideoFilters {
                status: Some(VideoStatus::Processing),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();
    assert_eq!(only_processing.total, 1);
    assert_eq!(only_processing.videos[0].video.id, processing);

    let by_search = f
        .service
        .list_videos(
            &VideoFilters {
                search: Some("OWNERSHIP".into()),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();
    assert_eq!(by_search.total, 1);
    assert_eq!(by_search.videos[0].video.id, completed);
    assert_eq!(by_search.videos[0].lesson_count, 1);

    let by_lesson = f
        .service
        .list_videos(
            &VideoFilters {
                lesson_id: Some(lesson_id),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();
    assert_eq!(by_lesson.total, 1);
    assert_eq!(by_lesson.videos[0].video.id, completed);
}
