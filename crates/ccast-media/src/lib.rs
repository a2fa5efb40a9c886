//! External media tool adapter.
//!
//! This crate is the single boundary to the media inspection/transcoding
//! tool. It provides:
//! - [`MediaAdapter`]: the async interface the workers depend on
//! - [`FfmpegAdapter`]: the production implementation spawning
//!   `ffprobe`/`ffmpeg` subprocesses
//! - FFmpeg command building and `-progress` stream parsing

pub mod adapter;
pub mod command;
pub mod error;
pub mod ffmpeg;
pub mod probe;
pub mod thumbnail;
pub mod transcode;

pub use adapter::{MediaAdapter, MediaProbe, ProgressFn};
pub use error::{MediaError, MediaResult};
pub use ffmpeg::FfmpegAdapter;
