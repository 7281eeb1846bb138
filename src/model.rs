use serde::{Deserialize, Serialize};

pub use video_id::*;

mod video_id;

/// A registered video. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Video {
    pub id: VideoId,
    pub title: String,
}

impl Video {
    /// The `[id, title]` pair used by listings.
    pub fn into_pair(self) -> (VideoId, String) {
        (self.id, self.title)
    }
}

/// How many times a video has been viewed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewRecord {
    pub video_id: VideoId,
    pub view_count: u64,
}

/// Result of viewing a video: its title and the counter after the view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewed {
    pub title: String,
    pub views: u64,
}
