use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub admin: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub metadata: PageMetadata,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PageMetadata {
    pub next: Option<String>,
}

/// Five mutually-nonexclusive filters accepted by `GET /files`.
#[derive(Debug, Clone, Default)]
pub struct FileSelector {
    pub library: Option<String>,
    pub album: Option<String>,
    pub release: Option<String>,
    pub song: Option<String>,
    pub track: Option<String>,
}

impl FileSelector {
    /// Renders to query pairs, omitting unset fields.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(v) = &self.library {
            pairs.push(("library", v.clone()));
        }
        if let Some(v) = &self.album {
            pairs.push(("album", v.clone()));
        }
        if let Some(v) = &self.release {
            pairs.push(("release", v.clone()));
        }
        if let Some(v) = &self.song {
            pairs.push(("song", v.clone()));
        }
        if let Some(v) = &self.track {
            pairs.push(("track", v.clone()));
        }
        pairs
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveMode {
    Create,
    Update,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IllustrationKind {
    Cover,
    Thumbnail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SaveMetadataResponse {
    #[serde(rename = "trackId")]
    pub track_id: i64,
    #[serde(rename = "songId")]
    pub song_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HasLyricsResponse {
    pub plain: bool,
    pub synced: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteFilesRequest {
    pub ids: Vec<i64>,
}
