//! Library services over the CourseCast catalog.
//!
//! This crate provides the caller-facing surface of the pipeline:
//! - [`UploadService`]: chunked upload session lifecycle
//! - [`VideoService`]: query/update/delete over finished and in-flight
//!   assets
//! - [`LessonService`]: binding ready assets to lessons

pub mod error;
pub mod lessons;
pub mod upload;
pub mod videos;

pub use error::{LibraryError, LibraryResult};
pub use lessons::LessonService;
pub use upload::UploadService;
pub use videos::{
    BulkDeleteReport, ProcessingReport, VideoFilters, VideoListItem, VideoPage, VideoService,
    VideoUrls,
};
