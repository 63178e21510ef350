use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use scanner_core::{IllustrationLocation, Metadata, MetadataBuilder, TrackType, UserSettings};
use scanner_probe::ProbeOutput;

use super::lyrics::{parse_lrc, ParsedLyrics};

/// Builds a [`Metadata`] from an already-run ffprobe output, per the key
/// mapping table in §4.2.
pub fn extract_embedded(probe: &ProbeOutput, settings: &UserSettings) -> (Metadata, Vec<String>) {
    let mut errors = Vec::new();
    let mut b = MetadataBuilder::default();

    if let Some(v) = probe.first_tag(&["artist", "tope"]) {
        b.artist(v);
    }
    if let Some(v) = probe.first_tag(&["sort_artist"]) {
        b.sort_artist(v);
    }
    if let Some(v) = probe.first_tag(&["album"]) {
        b.album(v.clone());
        if let Some(sort) = probe.first_tag(&["sort_album"]) {
            b.sort_album(sort);
        }
    }
    if let Some(v) = probe.first_tag(&["album_artist", "albumartist"]) {
        b.album_artist(v);
    }
    if let Some(v) = probe.first_tag(&["sort_album_artist"]) {
        b.sort_album_artist(v);
    }
    if let Some(v) = probe.first_tag(&["title"]) {
        b.name(v);
    }
    if let Some(v) = probe.first_tag(&["sort_name", "sort_title"]) {
        b.sort_name(v);
    }
    if let Some(v) = probe.first_tag(&["label", "tpub", "publisher"]) {
        b.label(v);
    }
    if let Some(v) = probe.first_tag(&["discsubtitle"]) {
        b.disc_name(v);
    }
    if let Some(v) = probe.first_tag(&["genres", "genre", "tcon"]) {
        let genres: Vec<String> = v.split([';', '\\', ',']).map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect();
        b.genres(genres);
    }

    if settings.compilations.use_id3_comp_tag {
        if let Some(v) = probe.first_tag(&["compilation", "compilations", "itunescompilation"]) {
            b.is_compilation(parse_bool_or_int(&v));
        }
    }

    if let Some(v) = probe.first_tag(&["track", "trck"]) {
        match parse_integer_before_slash(&v) {
            Some(n) => {
                b.index(n);
            }
            None => errors.push(format!("could not parse track number '{v}'")),
        }
    }
    if let Some(v) = probe.first_tag(&["disc", "tpos"]) {
        match parse_integer_before_slash(&v) {
            Some(n) => {
                b.disc_index(n);
            }
            None => errors.push(format!("could not parse disc number '{v}'")),
        }
    }
    if let Some(v) = probe.first_tag(&["bpm", "tbp"]) {
        match v.parse::<f64>() {
            Ok(n) => {
                b.bpm(n);
            }
            Err(_) => errors.push(format!("could not parse bpm '{v}'")),
        }
    }

    let lyrics_tag = probe.first_tag(&["lyrics", "uslt"]).or_else(|| probe.tag_with_prefix(&["lyrics-", "uslt::"]));
    if let Some(text) = lyrics_tag {
        match parse_lrc(&text) {
            ParsedLyrics::Synced(synced) => {
                b.plain_lyrics(synced.to_plain());
                b.synced_lyrics(synced);
            }
            ParsedLyrics::Plain(plain) => {
                b.plain_lyrics(plain);
            }
        }
    }

    if let Some(v) = probe.first_tag(&["originaldate", "originalyear", "tory", "tor", "xdor", "tdor"]) {
        match parse_date(&v) {
            Some(d) => {
                b.album_release_date(d);
            }
            None => errors.push(format!("could not parse album release date '{v}'")),
        }
    }
    if let Some(v) = probe.first_tag(&["date", "year", "tye", "tyer", "tdrl"]) {
        match parse_date(&v) {
            Some(d) => {
                b.release_release_date(d);
            }
            None => errors.push(format!("could not parse release date '{v}'")),
        }
    }

    if let Some(kbps) = probe.bitrate_kbps {
        b.bitrate(kbps);
    }
    if let Some(secs) = probe.duration_secs {
        b.duration(secs);
    }

    let track_type = infer_type(probe);
    if let Some(t) = track_type {
        b.r#type(t);
    }

    if let Some(stream_idx) = probe.attached_picture_stream() {
        let suppress_for_video = matches!(track_type, Some(TrackType::Video)) && !settings.use_embedded_thumbnails;
        if !suppress_for_video {
            b.illustration_location(IllustrationLocation::Embedded);
            b.illustration_stream_index(stream_idx);
        }
    }

    (b.build().unwrap_or_default(), errors)
}

fn infer_type(probe: &ProbeOutput) -> Option<TrackType> {
    if probe.streams.iter().any(|s| s.codec_type == "video" && !s.attached_pic) {
        Some(TrackType::Video)
    } else if probe.streams.iter().any(|s| s.codec_type == "audio") {
        Some(TrackType::Audio)
    } else {
        None
    }
}

fn parse_bool_or_int(v: &str) -> bool {
    match v.trim().to_lowercase().as_str() {
        "true" => true,
        "false" => false,
        other => other.parse::<i64>().map(|n| n == 1).unwrap_or(false),
    }
}

fn parse_integer_before_slash(v: &str) -> Option<i32> {
    v.split('/').next()?.trim().parse().ok()
}

/// Tries `YYYY-MM-DD`, `YYYY`, `YYYY-MM-DD HH:MM:SS`, then RFC-3339, in
/// that order; first format that succeeds wins.
fn parse_date(v: &str) -> Option<DateTime<Utc>> {
    let v = v.trim();
    if let Ok(d) = NaiveDate::parse_from_str(v, "%Y-%m-%d") {
        return Some(Utc.from_utc_datetime(&d.and_hms_opt(0, 0, 0)?));
    }
    if let Ok(year) = v.parse::<i32>() {
        let d = NaiveDate::from_ymd_opt(year, 1, 1)?;
        return Some(Utc.from_utc_datetime(&d.and_hms_opt(0, 0, 0)?));
    }
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(v, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&dt));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(v) {
        return Some(dt.with_timezone(&Utc));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanner_core::{CompilationSettings, MetadataOrder, MetadataSettings, MetadataSource};
    use scanner_probe::StreamInfo;
    use std::collections::HashMap;

    fn settings(use_id3: bool) -> UserSettings {
        UserSettings {
            compilations: CompilationSettings { artists: vec![], use_id3_comp_tag: use_id3 },
            track_regex: vec![".*".into()],
            metadata: MetadataSettings { source: MetadataSource::Embedded, order: MetadataOrder::Only },
            use_embedded_thumbnails: true,
        }
    }

    fn probe_with(tags: &[(&str, &str)], streams: Vec<StreamInfo>) -> ProbeOutput {
        let mut map = HashMap::new();
        for (k, v) in tags {
            map.insert(k.to_string(), v.to_string());
        }
        ProbeOutput { tags: map, streams, duration_secs: Some(200), bitrate_kbps: Some(256) }
    }

    #[test]
    fn extracts_basic_tags() {
        let probe = probe_with(
            &[("artist", "Band"), ("album", "Record"), ("title", "Track")],
            vec![StreamInfo { index: 0, codec_type: "audio".into(), attached_pic: false }],
        );
        let (m, errors) = extract_embedded(&probe, &settings(false));
        assert!(errors.is_empty());
        assert_eq!(m.artist.as_deref(), Some("Band"));
        assert_eq!(m.album.as_deref(), Some("Record"));
        assert_eq!(m.name.as_deref(), Some("Track"));
        assert_eq!(m.r#type, Some(TrackType::Audio));
    }

    #[test]
    fn splits_genres_on_separators() {
        let probe = probe_with(&[("genre", "Rock; Pop, Jazz")], vec![]);
        let (m, _) = extract_embedded(&probe, &settings(false));
        assert_eq!(m.genres, vec!["Rock".to_string(), "Pop".to_string(), "Jazz".to_string()]);
    }

    #[test]
    fn track_number_parses_before_slash() {
        let probe = probe_with(&[("track", "3/12")], vec![]);
        let (m, errors) = extract_embedded(&probe, &settings(false));
        assert!(errors.is_empty());
        assert_eq!(m.index, 3);
    }

    #[test]
    fn embedded_picture_suppressed_for_video_without_flag() {
        let mut settings = settings(false);
        settings.use_embedded_thumbnails = false;
        let probe = probe_with(
            &[],
            vec![
                StreamInfo { index: 0, codec_type: "video".into(), attached_pic: false },
                StreamInfo { index: 1, codec_type: "video".into(), attached_pic: true },
            ],
        );
        let (m, _) = extract_embedded(&probe, &settings);
        assert_eq!(m.illustration_location, IllustrationLocation::None);
    }

    #[test]
    fn date_formats_parsed_in_order() {
        assert!(parse_date("2006-05-01").is_some());
        assert!(parse_date("2006").is_some());
        assert!(parse_date("2006-05-01 10:00:00").is_some());
        assert!(parse_date("2006-05-01T10:00:00Z").is_some());
        assert!(parse_date("not a date").is_none());
    }
}
