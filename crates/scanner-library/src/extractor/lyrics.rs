use once_cell::sync::Lazy;
use regex::Regex;
use scanner_core::{PlainLyrics, SyncedLine, SyncedLyrics};

pub enum ParsedLyrics {
    Synced(SyncedLyrics),
    Plain(PlainLyrics),
}

static OFFSET_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[offset:\s*([+-]?\d+)\]$").unwrap());
static TIMESTAMP_PREFIX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[(\d{2}):(\d{2})\.(\d{2})\](.*)$").unwrap());
static METADATA_TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[[A-Za-z]+:[^\]]*\]$").unwrap());

/// Parses an LRC file. Any line that doesn't fit the grammar aborts the
/// whole parse and returns the unmodified lines as [`PlainLyrics`],
/// per §4.2.
pub fn parse_lrc(text: &str) -> ParsedLyrics {
    let lines: Vec<&str> = text.lines().collect();
    let mut offset_ms: i64 = 0;
    let mut entries = Vec::new();

    for raw_line in &lines {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(caps) = OFFSET_RE.captures(line) {
            offset_ms = caps[1].parse().unwrap_or(0);
            continue;
        }

        if let Some(mut timestamped) = parse_timestamped_line(line) {
            entries.append(&mut timestamped);
            continue;
        }

        if METADATA_TAG_RE.is_match(line) {
            continue;
        }

        return ParsedLyrics::Plain(PlainLyrics(lines.iter().map(|l| l.to_string()).collect()));
    }

    let entries: Vec<SyncedLine> = entries
        .into_iter()
        .map(|(ms, content)| SyncedLine { timestamp: (ms as f64 - offset_ms as f64) / 1000.0, content })
        .collect();
    ParsedLyrics::Synced(SyncedLyrics::new(entries))
}

/// A line may carry one or more chained `[MM:SS.cc]` prefixes sharing the
/// same trailing text; each accumulates as its own entry.
fn parse_timestamped_line(line: &str) -> Option<Vec<(i64, String)>> {
    let caps = TIMESTAMP_PREFIX_RE.captures(line)?;
    let minutes: i64 = caps[1].parse().ok()?;
    let seconds: i64 = caps[2].parse().ok()?;
    let centiseconds: i64 = caps[3].parse().ok()?;
    let ms = (minutes * 60 + seconds) * 1000 + centiseconds * 10;
    let rest = caps[4].to_string();

    let mut entries = parse_timestamped_line(&rest).unwrap_or_default();
    let content = entries.last().map(|(_, c)| c.clone()).unwrap_or(rest);
    entries.push((ms, content));
    Some(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_timestamp_line() {
        match parse_lrc("[00:12.34]Hello world") {
            ParsedLyrics::Synced(lyrics) => {
                assert_eq!(lyrics.0.len(), 1);
                assert!((lyrics.0[0].timestamp - 12.34).abs() < 1e-9);
                assert_eq!(lyrics.0[0].content, "Hello world");
            }
            ParsedLyrics::Plain(_) => panic!("expected synced lyrics"),
        }
    }

    #[test]
    fn chained_timestamps_share_text() {
        match parse_lrc("[00:01.00][00:05.00]Repeated line") {
            ParsedLyrics::Synced(lyrics) => {
                assert_eq!(lyrics.0.len(), 2);
                assert_eq!(lyrics.0[0].content, "Repeated line");
                assert_eq!(lyrics.0[1].content, "Repeated line");
            }
            ParsedLyrics::Plain(_) => panic!("expected synced lyrics"),
        }
    }

    #[test]
    fn offset_shifts_timestamps_earlier() {
        match parse_lrc("[offset:500]\n[00:10.00]Line") {
            ParsedLyrics::Synced(lyrics) => {
                assert!((lyrics.0[0].timestamp - 9.5).abs() < 1e-9);
            }
            ParsedLyrics::Plain(_) => panic!("expected synced lyrics"),
        }
    }

    #[test]
    fn unrecognized_line_aborts_to_plain() {
        match parse_lrc("not a valid lrc line\nsecond line") {
            ParsedLyrics::Plain(lyrics) => {
                assert_eq!(lyrics.0, vec!["not a valid lrc line".to_string(), "second line".to_string()]);
            }
            ParsedLyrics::Synced(_) => panic!("expected plain lyrics"),
        }
    }

    #[test]
    fn metadata_tag_is_ignored() {
        match parse_lrc("[ar:Some Artist]\n[00:01.00]Line") {
            ParsedLyrics::Synced(lyrics) => assert_eq!(lyrics.0.len(), 1),
            ParsedLyrics::Plain(_) => panic!("expected synced lyrics"),
        }
    }
}
