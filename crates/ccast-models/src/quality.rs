//! Fixed transcoding quality profiles.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of renditions derived from every source video.
pub const QUALITY_COUNT: u32 = 4;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown quality level: {0}")]
pub struct UnknownQuality(pub String);

/// One fixed encode profile a source video is transcoded into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityLevel {
    #[serde(rename = "360p")]
    Q360p,
    #[serde(rename = "480p")]
    Q480p,
    #[serde(rename = "720p")]
    Q720p,
    #[serde(rename = "1080p")]
    Q1080p,
}

impl QualityLevel {
    /// All levels, ascending.
    pub fn all() -> [QualityLevel; QUALITY_COUNT as usize] {
        [
            QualityLevel::Q360p,
            QualityLevel::Q480p,
            QualityLevel::Q720p,
            QualityLevel::Q1080p,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QualityLevel::Q360p => "360p",
            QualityLevel::Q480p => "480p",
            QualityLevel::Q720p => "720p",
            QualityLevel::Q1080p => "1080p",
        }
    }

    /// Target frame width in pixels.
    pub fn width(&self) -> u32 {
        match self {
            QualityLevel::Q360p => 640,
            QualityLevel::Q480p => 854,
            QualityLevel::Q720p => 1280,
            QualityLevel::Q1080p => 1920,
        }
    }

    /// Target frame height in pixels.
    pub fn height(&self) -> u32 {
        match self {
            QualityLevel::Q360p => 360,
            QualityLevel::Q480p => 480,
            QualityLevel::Q720p => 720,
            QualityLevel::Q1080p => 1080,
        }
    }

    /// Target video bitrate in FFmpeg notation.
    pub fn video_bitrate(&self) -> &'static str {
        match self {
            QualityLevel::Q360p => "800k",
            QualityLevel::Q480p => "1400k",
            QualityLevel::Q720p => "2800k",
            QualityLevel::Q1080p => "5000k",
        }
    }

    /// "WxH" form used in probe output and logs.
    pub fn resolution(&self) -> String {
        format!("{}x{}", self.width(), self.height())
    }

    /// File name of this rendition inside the asset directory.
    pub fn output_filename(&self) -> String {
        format!("{}.mp4", self.as_str())
    }
}

impl fmt::Display for QualityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for QualityLevel {
    type Err = UnknownQuality;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "360p" => Ok(QualityLevel::Q360p),
            "480p" => Ok(QualityLevel::Q480p),
            "720p" => Ok(QualityLevel::Q720p),
            "1080p" => Ok(QualityLevel::Q1080p),
            other => Err(UnknownQuality(other.to_string())),
        }
    }
}
