use chrono::{DateTime, Utc};
use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::lyrics::{PlainLyrics, SyncedLyrics};
use crate::settings::UserSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackType {
    Audio,
    Video,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IllustrationLocation {
    #[default]
    None,
    Embedded,
    Inline,
}

/// The extractor's output for a single file. Builder defaults mirror an
/// "unset" scalar (`-1` for `index`/`discIndex`, `None` for everything
/// else) so merge (§4.2, primary ⊕ secondary) can tell empty from zero.
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(default, setter(into, strip_option))]
pub struct Metadata {
    #[builder(setter(strip_option = false))]
    pub is_compilation: bool,

    pub artist: Option<String>,
    pub sort_artist: Option<String>,
    pub album_artist: Option<String>,
    pub sort_album_artist: Option<String>,

    pub album: Option<String>,
    pub sort_album: Option<String>,
    pub release: Option<String>,

    pub name: Option<String>,
    pub sort_name: Option<String>,

    pub album_release_date: Option<DateTime<Utc>>,
    pub release_release_date: Option<DateTime<Utc>>,

    #[builder(setter(strip_option = false))]
    pub index: i32,
    #[builder(setter(strip_option = false))]
    pub disc_index: i32,
    pub disc_name: Option<String>,

    pub bitrate: Option<u32>,
    pub bpm: Option<f64>,
    pub duration: Option<u64>,

    pub r#type: Option<TrackType>,

    #[builder(setter(strip_option = false))]
    pub genres: Vec<String>,

    pub discogs_id: Option<String>,
    pub label: Option<String>,

    #[builder(setter(strip_option = false))]
    pub plain_lyrics: PlainLyrics,
    #[builder(setter(strip_option = false))]
    pub synced_lyrics: SyncedLyrics,

    #[builder(setter(strip_option = false))]
    pub illustration_location: IllustrationLocation,
    pub illustration_stream_index: Option<u32>,
    pub illustration_path: Option<String>,

    pub registration_date: Option<DateTime<Utc>>,
    pub checksum: Option<String>,
    pub path: Option<String>,
    pub fingerprint: Option<String>,
}

impl Default for Metadata {
    fn default() -> Self {
        Metadata {
            is_compilation: false,
            artist: None,
            sort_artist: None,
            album_artist: None,
            sort_album_artist: None,
            album: None,
            sort_album: None,
            release: None,
            name: None,
            sort_name: None,
            album_release_date: None,
            release_release_date: None,
            index: -1,
            disc_index: -1,
            disc_name: None,
            bitrate: None,
            bpm: None,
            duration: None,
            r#type: None,
            genres: Vec::new(),
            discogs_id: None,
            label: None,
            plain_lyrics: PlainLyrics::default(),
            synced_lyrics: SyncedLyrics::default(),
            illustration_location: IllustrationLocation::None,
            illustration_stream_index: None,
            illustration_path: None,
            registration_date: None,
            checksum: None,
            path: None,
            fingerprint: None,
        }
    }
}

impl Metadata {
    /// Fills every empty field of `self` (the primary source) from
    /// `secondary`, never overwriting a non-empty primary value. `-1` on
    /// `index`/`discIndex` counts as empty, per §4.2.
    pub fn merge_from(mut self, secondary: Metadata) -> Self {
        macro_rules! fill_opt {
            ($field:ident) => {
                if self.$field.is_none() {
                    self.$field = secondary.$field;
                }
            };
        }

        fill_opt!(artist);
        fill_opt!(sort_artist);
        fill_opt!(album_artist);
        fill_opt!(sort_album_artist);
        fill_opt!(album);
        fill_opt!(sort_album);
        fill_opt!(release);
        fill_opt!(name);
        fill_opt!(sort_name);
        fill_opt!(album_release_date);
        fill_opt!(release_release_date);
        fill_opt!(disc_name);
        fill_opt!(bitrate);
        fill_opt!(bpm);
        fill_opt!(duration);
        fill_opt!(r#type);
        fill_opt!(discogs_id);
        fill_opt!(label);
        fill_opt!(illustration_stream_index);
        fill_opt!(illustration_path);
        fill_opt!(fingerprint);

        if self.index < 0 {
            self.index = secondary.index;
        }
        if self.disc_index < 0 {
            self.disc_index = secondary.disc_index;
        }
        if self.genres.is_empty() {
            self.genres = secondary.genres;
        }
        if self.plain_lyrics.is_empty() {
            self.plain_lyrics = secondary.plain_lyrics;
        }
        if self.synced_lyrics.is_empty() {
            self.synced_lyrics = secondary.synced_lyrics;
        }
        if self.illustration_location == IllustrationLocation::None {
            self.illustration_location = secondary.illustration_location;
        }
        if !self.is_compilation {
            self.is_compilation = secondary.is_compilation;
        }

        self
    }

    /// Album/release back-fill, compilation detection, and the
    /// albumArtist clear described in §3/§4.2. Does not touch `path`,
    /// `registrationDate`, or `checksum` — the caller attaches those.
    pub fn sanitize(&mut self, settings: &UserSettings) {
        if self.album.as_deref().unwrap_or("").is_empty() && self.release.as_deref().is_some_and(|r| !r.is_empty()) {
            self.album = self.release.clone();
        } else if self.release.as_deref().unwrap_or("").is_empty() && self.album.as_deref().is_some_and(|a| !a.is_empty()) {
            self.release = self.album.clone();
        }

        let keywords = settings.compilation_keywords();
        let matches_keyword = |v: &Option<String>| {
            v.as_deref()
                .map(|s| keywords.iter().any(|k| k == &s.to_lowercase()))
                .unwrap_or(false)
        };
        if matches_keyword(&self.artist) || matches_keyword(&self.album_artist) {
            self.is_compilation = true;
        }

        if self.is_compilation {
            self.album_artist = None;
        } else {
            if self.artist.as_deref().unwrap_or("").is_empty() {
                self.artist = self.album_artist.clone();
            }
            if self.album_artist.as_deref().unwrap_or("").is_empty() {
                self.album_artist = self.artist.clone();
            }
        }
    }

    pub fn mark_registration(&mut self, path: String, checksum: String) {
        self.path = Some(path);
        self.checksum = Some(checksum);
        self.registration_date = Some(Utc::now());
    }

    /// Aggregates every failed invariant instead of stopping at the first.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.name.as_deref().unwrap_or("").is_empty() {
            errors.push(ValidationError::MissingRequired("name"));
        }
        if self.r#type.is_none() {
            errors.push(ValidationError::MissingRequired("type"));
        }
        if self.registration_date.is_none() {
            errors.push(ValidationError::MissingRequired("registrationDate"));
        }
        if self.checksum.as_deref().unwrap_or("").is_empty() {
            errors.push(ValidationError::MissingRequired("checksum"));
        }
        if self.path.as_deref().unwrap_or("").is_empty() {
            errors.push(ValidationError::MissingRequired("path"));
        }

        if !self.is_compilation
            && self.artist.as_deref().unwrap_or("").is_empty()
            && self.album_artist.as_deref().unwrap_or("").is_empty()
        {
            errors.push(ValidationError::MissingArtist);
        }

        if let Some(id) = &self.discogs_id {
            if !id.is_empty() && !id.chars().all(|c| c.is_ascii_digit()) {
                errors.push(ValidationError::NonNumericDiscogsId(id.clone()));
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{CompilationSettings, MetadataOrder, MetadataSettings, MetadataSource};

    fn settings() -> UserSettings {
        UserSettings {
            compilations: CompilationSettings { artists: vec!["Compilations".into()], use_id3_comp_tag: false },
            track_regex: vec![".*".into()],
            metadata: MetadataSettings { source: MetadataSource::Path, order: MetadataOrder::Preferred },
            use_embedded_thumbnails: false,
        }
    }

    #[test]
    fn merge_fills_empty_primary_fields_only() {
        let primary = Metadata { artist: Some("Keep".into()), ..Default::default() };
        let secondary = Metadata { artist: Some("Discard".into()), album: Some("From Secondary".into()), ..Default::default() };
        let merged = primary.merge_from(secondary);
        assert_eq!(merged.artist.as_deref(), Some("Keep"));
        assert_eq!(merged.album.as_deref(), Some("From Secondary"));
    }

    #[test]
    fn merge_treats_negative_index_as_empty() {
        let primary = Metadata { index: -1, ..Default::default() };
        let secondary = Metadata { index: 4, ..Default::default() };
        assert_eq!(primary.merge_from(secondary).index, 4);
    }

    #[test]
    fn sanitize_backfills_album_and_release() {
        let mut m = Metadata { release: Some("Reissue".into()), ..Default::default() };
        m.sanitize(&settings());
        assert_eq!(m.album.as_deref(), Some("Reissue"));
    }

    #[test]
    fn sanitize_detects_compilation_and_clears_album_artist() {
        let mut m = Metadata { album_artist: Some("Compilations".into()), artist: Some("Solo".into()), ..Default::default() };
        m.sanitize(&settings());
        assert!(m.is_compilation);
        assert!(m.album_artist.is_none());
    }

    #[test]
    fn sanitize_backfills_artist_and_album_artist_for_non_compilations() {
        let mut m = Metadata { artist: Some("Band".into()), ..Default::default() };
        m.sanitize(&settings());
        assert_eq!(m.album_artist.as_deref(), Some("Band"));
    }

    #[test]
    fn validate_flags_missing_artist_for_non_compilation() {
        let m = Metadata { name: Some("Song".into()), r#type: Some(TrackType::Audio), registration_date: Some(Utc::now()), checksum: Some("c".into()), path: Some("p".into()), ..Default::default() };
        assert!(m.validate().contains(&ValidationError::MissingArtist));
    }

    #[test]
    fn validate_allows_missing_artist_for_compilation() {
        let m = Metadata { is_compilation: true, name: Some("Song".into()), r#type: Some(TrackType::Audio), registration_date: Some(Utc::now()), checksum: Some("c".into()), path: Some("p".into()), ..Default::default() };
        assert!(!m.validate().contains(&ValidationError::MissingArtist));
    }

    #[test]
    fn validate_rejects_non_numeric_discogs_id() {
        let mut m = Metadata { is_compilation: true, name: Some("Song".into()), r#type: Some(TrackType::Audio), registration_date: Some(Utc::now()), checksum: Some("c".into()), path: Some("p".into()), ..Default::default() };
        m.discogs_id = Some("abc".into());
        assert!(matches!(m.validate()[0], ValidationError::NonNumericDiscogsId(_)));
    }
}
