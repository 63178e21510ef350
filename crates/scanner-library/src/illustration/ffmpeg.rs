use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use once_cell::sync::Lazy;
use regex::Regex;

use super::error::ThumbnailError;

#[cfg(not(windows))]
const FFMPEG_PATHS: &[&str] = &["ffmpeg", "/usr/bin/ffmpeg", "/usr/local/bin/ffmpeg"];
#[cfg(windows)]
const FFMPEG_PATHS: &[&str] = &["ffmpeg"];

fn find_ffmpeg() -> Option<&'static str> {
    FFMPEG_PATHS
        .iter()
        .find(|p| Command::new(p).arg("-version").output().map(|o| o.status.success()).unwrap_or(false))
        .copied()
}

fn run(args: &[&str]) -> Result<Output, ThumbnailError> {
    let ffmpeg = find_ffmpeg().ok_or(ThumbnailError::BinaryNotFound)?;
    Command::new(ffmpeg).args(args).output().map_err(ThumbnailError::Spawn)
}

fn check(output: Output) -> Result<Output, ThumbnailError> {
    if !output.status.success() {
        return Err(ThumbnailError::NonZeroExit {
            status: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(output)
}

const FRAME_FILTER: &str = "yadif,scale='if(gt(sar,1),iw*sar,iw)':'if(gt(sar,1),ih,ih/sar)',cropdetect";

/// Extracts all I-frames from the first 5 minutes into `<out_dir>/frame-%04d.jpg`,
/// returning the combined stderr (for crop-directive parsing by the caller).
pub fn extract_iframes(path: &Path, out_dir: &Path) -> Result<String, ThumbnailError> {
    let pattern = out_dir.join("frame-%04d.jpg");
    let output = check(run(&[
        "-y",
        "-i",
        &path.to_string_lossy(),
        "-t",
        "300",
        "-vf",
        &format!("select='eq(pict_type,I)',{FRAME_FILTER}"),
        "-vsync",
        "vfr",
        pattern.to_str().unwrap_or_default(),
    ])?)?;
    Ok(String::from_utf8_lossy(&output.stderr).into_owned())
}

/// Extracts a single frame at `timestamp_secs`, de-interlaced/scaled with
/// cropdetect, used for the middle-frame fallback.
pub fn extract_frame_at(path: &Path, timestamp_secs: f64, out_path: &Path) -> Result<String, ThumbnailError> {
    let output = check(run(&[
        "-y",
        "-ss",
        &timestamp_secs.to_string(),
        "-i",
        &path.to_string_lossy(),
        "-frames:v",
        "1",
        "-vf",
        FRAME_FILTER,
        out_path.to_str().unwrap_or_default(),
    ])?)?;
    Ok(String::from_utf8_lossy(&output.stderr).into_owned())
}

static CROP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"crop=(\d+):(\d+):(-?\d+):(-?\d+)").unwrap());

/// Parses the last valid `crop=w:h:x:y` directive from ffmpeg's
/// cropdetect stderr. Width and height must be positive.
pub fn last_crop_directive(stderr: &str) -> Option<(u32, u32, i32, i32)> {
    CROP_RE
        .captures_iter(stderr)
        .filter_map(|c| {
            let w: i64 = c[1].parse().ok()?;
            let h: i64 = c[2].parse().ok()?;
            let x: i32 = c[3].parse().ok()?;
            let y: i32 = c[4].parse().ok()?;
            if w > 0 && h > 0 { Some((w as u32, h as u32, x, y)) } else { None }
        })
        .last()
}

/// Applies a crop to an already-extracted frame, returning JPEG bytes.
pub fn apply_crop(frame_path: &Path, crop: (u32, u32, i32, i32), out_path: &Path) -> Result<(), ThumbnailError> {
    let (w, h, x, y) = crop;
    check(run(&[
        "-y",
        "-i",
        &frame_path.to_string_lossy(),
        "-vf",
        &format!("crop={w}:{h}:{x}:{y}"),
        out_path.to_str().unwrap_or_default(),
    ])?)?;
    Ok(())
}

/// Pipes the indicated attached-picture stream through ffmpeg,
/// re-encoding to MJPEG bytes on stdout.
pub fn extract_embedded_stream_jpeg(path: &Path, stream_index: u32) -> Result<Vec<u8>, ThumbnailError> {
    let ffmpeg = find_ffmpeg().ok_or(ThumbnailError::BinaryNotFound)?;
    let output = Command::new(ffmpeg)
        .args(["-y", "-i", &path.to_string_lossy(), "-map", &format!("0:{stream_index}"), "-frames:v", "1", "-f", "mjpeg", "pipe:1"])
        .output()
        .map_err(ThumbnailError::Spawn)?;
    Ok(check(output)?.stdout)
}

pub fn list_frames(dir: &Path) -> Vec<PathBuf> {
    let mut frames: Vec<PathBuf> = std::fs::read_dir(dir)
        .map(|entries| entries.flatten().map(|e| e.path()).filter(|p| p.extension().is_some_and(|e| e == "jpg")).collect())
        .unwrap_or_default();
    frames.sort();
    frames
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_last_crop_directive() {
        let stderr = "crop=100:200:0:0\nsome noise\ncrop=640:480:10:-5\n";
        assert_eq!(last_crop_directive(stderr), Some((640, 480, 10, -5)));
    }

    #[test]
    fn rejects_non_positive_crop_dimensions() {
        let stderr = "crop=0:480:10:5\n";
        assert_eq!(last_crop_directive(stderr), None);
    }

    #[test]
    fn no_crop_directive_returns_none() {
        assert_eq!(last_crop_directive("nothing here"), None);
    }
}
