mod embedded;
mod fingerprint;
mod lyrics;
mod path;

use std::path::Path;

use regex::Regex;
use scanner_core::{Metadata, MetadataOrder, MetadataSource, UserSettings, ValidationError};
use tracing::warn;

use self::lyrics::ParsedLyrics;

/// Result of extracting one file: the merged, sanitized, validated
/// metadata, plus every non-fatal error collected along the way.
pub struct ExtractionResult {
    pub metadata: Metadata,
    pub errors: Vec<String>,
}

/// Runs the configured source(s), merges per `order`, sanitizes, attaches
/// the LRC sidecar, fingerprints, and stamps registration fields. Does
/// NOT validate — callers decide when to call [`Metadata::validate`]
/// (typically just before upload).
pub fn extract(path: &Path, settings: &UserSettings, track_regex: &[Regex]) -> ExtractionResult {
    let mut errors = Vec::new();

    let probe_result = scanner_probe::probe(path);
    let probe = match &probe_result {
        Ok(p) => Some(p),
        Err(e) => {
            errors.push(format!("ffprobe failed: {e}"));
            None
        }
    };

    let (mut metadata, order_errors) = match settings.metadata.source {
        MetadataSource::Path => {
            let (primary, mut e) = path::extract_path(path, track_regex);
            if settings.metadata.order == MetadataOrder::Preferred {
                if let Some(probe) = probe {
                    let (secondary, mut se) = embedded::extract_embedded(probe, settings);
                    e.append(&mut se);
                    (primary.merge_from(secondary), e)
                } else {
                    (primary, e)
                }
            } else {
                (primary, e)
            }
        }
        MetadataSource::Embedded => {
            let Some(probe) = probe else {
                return ExtractionResult { metadata: Metadata::default(), errors };
            };
            let (primary, mut e) = embedded::extract_embedded(probe, settings);
            if settings.metadata.order == MetadataOrder::Preferred {
                let (secondary, mut se) = path::extract_path(path, track_regex);
                e.append(&mut se);
                (primary.merge_from(secondary), e)
            } else {
                (primary, e)
            }
        }
    };
    errors.extend(order_errors);

    metadata.sanitize(settings);
    attach_lrc_sidecar(&mut metadata, path, settings);

    let is_video = metadata.r#type == Some(scanner_core::TrackType::Video);
    metadata.fingerprint = fingerprint::fingerprint(path, is_video, metadata.duration);

    match scanner_core::checksum::compute(path) {
        Ok(checksum) => metadata.mark_registration(path.to_string_lossy().into_owned(), checksum),
        Err(e) => errors.push(format!("failed to compute checksum: {e}")),
    }

    ExtractionResult { metadata, errors }
}

pub fn validate(metadata: &Metadata) -> Vec<ValidationError> {
    metadata.validate()
}

/// If `<basename>.lrc` exists next to `path` and tag-derived synced
/// lyrics are empty, parses it. A [`ParsedLyrics::Synced`] result always
/// wins; a [`ParsedLyrics::Plain`] one is applied only when the
/// configured source is `path` or the order is `preferred` (§4.2).
fn attach_lrc_sidecar(metadata: &mut Metadata, path: &Path, settings: &UserSettings) {
    if !metadata.synced_lyrics.is_empty() {
        return;
    }
    let Some(lrc_path) = sibling_lrc_path(path) else { return };
    let Ok(text) = std::fs::read_to_string(&lrc_path) else { return };

    match lyrics::parse_lrc(&text) {
        ParsedLyrics::Synced(synced) => {
            metadata.plain_lyrics = synced.to_plain();
            metadata.synced_lyrics = synced;
        }
        ParsedLyrics::Plain(plain) => {
            let applies = settings.metadata.source == MetadataSource::Path || settings.metadata.order == MetadataOrder::Preferred;
            if applies {
                metadata.plain_lyrics = plain;
            }
        }
    }
}

fn sibling_lrc_path(path: &Path) -> Option<std::path::PathBuf> {
    let stem = path.file_stem()?;
    Some(path.with_file_name(stem).with_extension("lrc"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanner_core::{CompilationSettings, MetadataSettings};

    fn settings() -> UserSettings {
        UserSettings {
            compilations: CompilationSettings { artists: vec![], use_id3_comp_tag: false },
            track_regex: vec![r"(?P<Artist>[^/]+)/(?P<Track>[^/]+)\.\w+$".into()],
            metadata: MetadataSettings { source: MetadataSource::Path, order: MetadataOrder::Only },
            use_embedded_thumbnails: false,
        }
    }

    #[test]
    fn extracts_path_only_and_stamps_registration() {
        let dir = tempfile::tempdir().unwrap();
        let artist_dir = dir.path().join("SomeArtist");
        std::fs::create_dir_all(&artist_dir).unwrap();
        let file = artist_dir.join("Song.mp3");
        std::fs::write(&file, b"not really audio").unwrap();

        let regexes: Vec<Regex> = settings().track_regex.iter().map(|p| Regex::new(p).unwrap()).collect();
        let result = extract(&file, &settings(), &regexes);
        assert_eq!(result.metadata.artist.as_deref(), Some("SomeArtist"));
        assert!(result.metadata.registration_date.is_some());
        assert!(result.metadata.checksum.is_some());
    }

    #[test]
    fn lrc_sidecar_is_picked_up_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let artist_dir = dir.path().join("SomeArtist");
        std::fs::create_dir_all(&artist_dir).unwrap();
        let file = artist_dir.join("Song.mp3");
        std::fs::write(&file, b"not really audio").unwrap();
        std::fs::write(artist_dir.join("Song.lrc"), "[00:01.00]Hello").unwrap();

        let regexes: Vec<Regex> = settings().track_regex.iter().map(|p| Regex::new(p).unwrap()).collect();
        let result = extract(&file, &settings(), &regexes);
        assert!(!result.metadata.synced_lyrics.is_empty());
    }
}
