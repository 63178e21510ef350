//! Shells out to `ffprobe` to read embedded container/stream tags. Mirrors
//! the way `fpcalc` and `ffmpeg` are invoked elsewhere in this workspace:
//! locate the binary, run it, parse its JSON stdout into a typed error.

use std::collections::HashMap;
use std::path::Path;
use std::process::Command;

use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("ffprobe not found on PATH")]
    BinaryNotFound,

    #[error("failed to run ffprobe: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("ffprobe exited with status {status}: {stderr}")]
    NonZeroExit { status: i32, stderr: String },

    #[error("failed to parse ffprobe output: {0}")]
    Parse(#[from] serde_json::Error),
}

#[cfg(not(windows))]
const FFPROBE_PATHS: &[&str] = &["ffprobe", "/usr/bin/ffprobe", "/usr/local/bin/ffprobe"];
#[cfg(windows)]
const FFPROBE_PATHS: &[&str] = &["ffprobe", r"C:\ffmpeg\bin\ffprobe.exe"];

fn find_ffprobe() -> Option<&'static str> {
    FFPROBE_PATHS
        .iter()
        .find(|p| Command::new(p).arg("-version").output().map(|o| o.status.success()).unwrap_or(false))
        .copied()
}

#[derive(Debug, Clone, Default)]
pub struct StreamInfo {
    pub index: u32,
    pub codec_type: String,
    /// Set when the stream's disposition has `attached_pic = 1`.
    pub attached_pic: bool,
}

/// Merged view over container + stream tags, plus the per-stream table
/// needed to locate an attached-picture stream.
#[derive(Debug, Clone, Default)]
pub struct ProbeOutput {
    /// Lowercased keys. Values from format tags win over stream tags when
    /// both set the same key, per the collection order in §4.2.
    pub tags: HashMap<String, String>,
    pub streams: Vec<StreamInfo>,
    pub duration_secs: Option<u64>,
    pub bitrate_kbps: Option<u32>,
}

impl ProbeOutput {
    /// Tries each key in order, returning the first one that resolves to a
    /// non-empty string.
    pub fn first_tag(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|k| self.tags.get(*k)).filter(|v| !v.is_empty()).cloned()
    }

    /// Tags not present under any of `keys` but starting with one of
    /// `prefixes` (used for the `lyrics-*` / `uslt::*` fallback).
    pub fn tag_with_prefix(&self, prefixes: &[&str]) -> Option<String> {
        self.tags
            .iter()
            .find(|(k, v)| !v.is_empty() && prefixes.iter().any(|p| k.starts_with(p)))
            .map(|(_, v)| v.clone())
    }

    /// Index of the first stream whose disposition marks it as the
    /// attached cover picture, if any.
    pub fn attached_picture_stream(&self) -> Option<u32> {
        self.streams.iter().find(|s| s.attached_pic).map(|s| s.index)
    }
}

pub fn probe(path: &Path) -> Result<ProbeOutput, ProbeError> {
    let ffprobe = find_ffprobe().ok_or(ProbeError::BinaryNotFound)?;

    let output = Command::new(ffprobe)
        .args(["-v", "quiet", "-print_format", "json", "-show_format", "-show_streams"])
        .arg(path)
        .output()
        .map_err(ProbeError::Spawn)?;

    if !output.status.success() {
        return Err(ProbeError::NonZeroExit {
            status: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    let raw: RawProbe = serde_json::from_slice(&output.stdout)?;
    Ok(raw.into())
}

#[derive(Debug, Deserialize)]
struct RawProbe {
    #[serde(default)]
    format: RawFormat,
    #[serde(default)]
    streams: Vec<RawStream>,
}

#[derive(Debug, Default, Deserialize)]
struct RawFormat {
    duration: Option<String>,
    bit_rate: Option<String>,
    #[serde(default)]
    tags: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct RawStream {
    index: u32,
    #[serde(default, rename = "codec_type")]
    codec_type: String,
    #[serde(default)]
    tags: HashMap<String, String>,
    #[serde(default)]
    disposition: HashMap<String, i64>,
}

impl From<RawProbe> for ProbeOutput {
    fn from(raw: RawProbe) -> Self {
        let mut tags = HashMap::new();
        for stream in &raw.streams {
            for (k, v) in &stream.tags {
                tags.insert(k.to_lowercase(), v.clone());
            }
        }
        for (k, v) in &raw.format.tags {
            tags.insert(k.to_lowercase(), v.clone());
        }

        let streams = raw
            .streams
            .iter()
            .map(|s| StreamInfo {
                index: s.index,
                codec_type: s.codec_type.clone(),
                attached_pic: s.disposition.get("attached_pic").copied().unwrap_or(0) == 1,
            })
            .collect();

        ProbeOutput {
            tags,
            streams,
            duration_secs: raw.format.duration.and_then(|d| d.parse::<f64>().ok()).map(|d| d as u64),
            bitrate_kbps: raw.format.bit_rate.and_then(|b| b.parse::<u64>().ok()).map(|b| (b / 1000) as u32),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ProbeOutput {
        let raw: RawProbe = serde_json::from_str(
            r#"{
                "format": {"duration": "123.4", "bit_rate": "320000", "tags": {"ARTIST": "Format Artist"}},
                "streams": [
                    {"index": 0, "codec_type": "audio", "tags": {"artist": "Stream Artist"}},
                    {"index": 1, "codec_type": "video", "disposition": {"attached_pic": 1}}
                ]
            }"#,
        )
        .unwrap();
        raw.into()
    }

    #[test]
    fn format_tags_win_over_stream_tags() {
        let out = sample();
        assert_eq!(out.tags.get("artist"), Some(&"Format Artist".to_string()));
    }

    #[test]
    fn duration_and_bitrate_are_derived() {
        let out = sample();
        assert_eq!(out.duration_secs, Some(123));
        assert_eq!(out.bitrate_kbps, Some(320));
    }

    #[test]
    fn finds_attached_picture_stream() {
        let out = sample();
        assert_eq!(out.attached_picture_stream(), Some(1));
    }

    #[test]
    fn first_tag_tries_keys_in_order() {
        let out = sample();
        assert_eq!(out.first_tag(&["missing", "artist"]), Some("Format Artist".to_string()));
    }
}
