//! Lesson records and lesson/video associations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{LessonId, VideoId};

/// Minimal lesson shape the association manager needs. Full lesson CRUD
/// lives outside this pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lesson {
    pub id: LessonId,
    pub title: String,

    /// Denormalized pointer to the lesson's current video. Distinct from
    /// the association rows: re-pointing a lesson does not remove prior
    /// [`LessonVideoLink`]s.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_video: Option<VideoId>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Lesson {
    pub fn new(title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: LessonId::new(),
            title: title.into(),
            current_video: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Many-to-many association row between a lesson and a video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonVideoLink {
    pub lesson_id: LessonId,
    pub video_id: VideoId,
    pub attached_at: DateTime<Utc>,
}

impl LessonVideoLink {
    pub fn new(lesson_id: LessonId, video_id: VideoId) -> Self {
        Self {
            lesson_id,
            video_id,
            attached_at: Utc::now(),
        }
    }
}
