use serde::{Deserialize, Serialize};

/// The catalog's canonical unit. Read-only from the scanner's point of
/// view: libraries are created/renamed through the catalog's own admin
/// surface, never by this daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Library {
    pub id: i64,
    pub name: String,
    pub slug: String,
    /// Relative to `INTERNAL_DATA_DIR`.
    pub path: String,
}

/// The catalog's view of one on-disk file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub id: i64,
    /// Relative to the owning library's `path`.
    pub path: String,
    pub checksum: String,
    #[serde(rename = "libraryId")]
    pub library_id: i64,
}
