use serde::{Deserialize, Serialize};

use crate::metadata::IllustrationLocation;

/// Posted to the thumbnail lane after any Video metadata upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThumbnailJob {
    pub track_id: i64,
    pub duration: Option<u64>,
    pub path: String,
}

/// Derived at metadata-push time; drives the cover-save step of C3.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IllustrationJob {
    pub location: IllustrationLocation,
    pub illustration_path: Option<String>,
    pub track_path: String,
    pub track_id: i64,
    pub stream_index: Option<u32>,
}
