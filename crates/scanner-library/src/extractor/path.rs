use std::path::Path;

use chrono::{NaiveDate, TimeZone, Utc};
use regex::Regex;
use scanner_core::{Metadata, MetadataBuilder, TrackType};

/// Runs the configured `trackRegex` list against `path`'s full string
/// form, first match wins. Named captures recognized:
/// `AlbumArtist, Artist, Release, Album, Label, Year, DiscName, Disc,
/// Index, Track, Genre, DiscogsId, BPM`. `Track` is the track title
/// (mapped onto `Metadata::name`); `Index` is the track number.
pub fn extract_path(path: &Path, regexes: &[Regex]) -> (Metadata, Vec<String>) {
    let mut errors = Vec::new();
    let full_path = path.to_string_lossy();

    let Some(captures) = regexes.iter().find_map(|re| re.captures(&full_path)) else {
        errors.push("file did not match any regexes".to_string());
        return (Metadata::default(), errors);
    };

    let mut builder = MetadataBuilder::default();
    let named = |name: &str| captures.name(name).map(|m| m.as_str().to_string()).filter(|s| !s.is_empty());

    if let Some(v) = named("AlbumArtist") {
        builder.album_artist(v);
    }
    if let Some(v) = named("Artist") {
        builder.artist(v);
    }
    if let Some(v) = named("Release") {
        builder.release(v);
    }
    if let Some(v) = named("Album") {
        builder.album(v);
    }
    if let Some(v) = named("Label") {
        builder.label(v);
    }
    if let Some(v) = named("DiscName") {
        builder.disc_name(v);
    }
    if let Some(v) = named("DiscogsId") {
        builder.discogs_id(v);
    }
    if let Some(v) = named("Track") {
        builder.name(v);
    }
    if let Some(v) = named("Genre") {
        builder.genres(vec![v]);
    }

    if let Some(v) = named("Year") {
        match v.parse::<i32>() {
            Ok(year) => {
                if let Some(date) = NaiveDate::from_ymd_opt(year, 1, 1) {
                    builder.release_release_date(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap()));
                }
            }
            Err(_) => errors.push(format!("could not parse Year capture '{v}'")),
        }
    }
    if let Some(v) = named("Disc") {
        match v.parse::<i32>() {
            Ok(n) => {
                builder.disc_index(n);
            }
            Err(_) => errors.push(format!("could not parse Disc capture '{v}'")),
        }
    }
    if let Some(v) = named("Index") {
        match v.parse::<i32>() {
            Ok(n) => {
                builder.index(n);
            }
            Err(_) => errors.push(format!("could not parse Index capture '{v}'")),
        }
    }
    if let Some(v) = named("BPM") {
        match v.parse::<f64>() {
            Ok(n) => {
                builder.bpm(n);
            }
            Err(_) => errors.push(format!("could not parse BPM capture '{v}'")),
        }
    }

    match type_from_extension(path) {
        Some(t) => {
            builder.r#type(t);
        }
        None => errors.push("could not identify the MIME of the file".to_string()),
    }

    if let Some(illustration) = find_inline_illustration(path) {
        builder.illustration_path(illustration);
        builder.illustration_location(scanner_core::IllustrationLocation::Inline);
    }

    (builder.build().unwrap_or_default(), errors)
}

fn type_from_extension(path: &Path) -> Option<TrackType> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    let mime = mime_guess::from_ext(&ext).first()?;
    match mime.type_() {
        mime_guess::mime::VIDEO => Some(TrackType::Video),
        mime_guess::mime::AUDIO => Some(TrackType::Audio),
        _ => None,
    }
}

/// Finds a sibling file named `cover.*` or `artwork.*` (case-insensitive)
/// next to `path`.
fn find_inline_illustration(path: &Path) -> Option<String> {
    let dir = path.parent()?;
    let re = Regex::new(r"(?i)^(cover|artwork)\..*$").unwrap();
    let entries = std::fs::read_dir(dir).ok()?;
    for entry in entries.flatten() {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if re.is_match(&name) {
            return Some(entry.path().to_string_lossy().into_owned());
        }
    }
    None
}
