use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Built-in compilation keyword, unioned case-insensitively with
/// `compilations.artists` for the isCompilation heuristic (spec.md §9).
pub const BUILTIN_COMPILATION_KEYWORD: &str = "Various Artists";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompilationSettings {
    pub artists: Vec<String>,
    #[serde(rename = "useID3CompTag", default)]
    pub use_id3_comp_tag: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataSource {
    Path,
    Embedded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataOrder {
    Only,
    Preferred,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataSettings {
    pub source: MetadataSource,
    pub order: MetadataOrder,
}

/// Immutable for the lifetime of the process once loaded at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSettings {
    pub compilations: CompilationSettings,
    #[serde(rename = "trackRegex")]
    pub track_regex: Vec<String>,
    pub metadata: MetadataSettings,
    #[serde(rename = "useEmbeddedThumbnails", default)]
    pub use_embedded_thumbnails: bool,
}

impl UserSettings {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let bytes = std::fs::read(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let settings: UserSettings = serde_json::from_slice(&bytes)?;
        let problems = settings.validate();
        if !problems.is_empty() {
            return Err(ConfigError::Invalid(problems));
        }
        Ok(settings)
    }

    /// Aggregates every validation failure instead of stopping at the
    /// first one, matching spec.md §6: "Validation aggregates all errors
    /// before exiting".
    fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if self.track_regex.is_empty() {
            problems.push("trackRegex is empty".to_string());
        }
        for pattern in &self.track_regex {
            if let Err(e) = Regex::new(pattern) {
                problems.push(format!("invalid trackRegex '{pattern}': {e}"));
            }
        }
        for artist in &self.compilations.artists {
            if artist.trim().is_empty() {
                problems.push("compilations.artists contains an empty string".to_string());
                break;
            }
        }

        problems
    }

    pub fn compiled_track_regex(&self) -> Result<Vec<Regex>, ConfigError> {
        self.track_regex
            .iter()
            .map(|p| Regex::new(p).map_err(ConfigError::from))
            .collect()
    }

    /// Case-insensitive compilation-artist keywords, built-in ∪ configured.
    pub fn compilation_keywords(&self) -> Vec<String> {
        let mut keywords: Vec<String> = self
            .compilations
            .artists
            .iter()
            .map(|a| a.to_lowercase())
            .collect();
        keywords.push(BUILTIN_COMPILATION_KEYWORD.to_lowercase());
        keywords
    }
}
