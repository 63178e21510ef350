use std::path::Path;

use tracing::warn;

use super::error::ThumbnailError;
use super::{face, ffmpeg};

/// Builds a Video thumbnail per §4.3: the face-aware frame first, the
/// middle frame otherwise. The scoped temporary directory is removed on
/// every exit path, success or failure.
pub fn build_thumbnail_bytes(path: &Path, duration_secs: Option<u64>) -> Result<Vec<u8>, ThumbnailError> {
    let tmp = tempfile::tempdir().map_err(ThumbnailError::from)?;

    let result = face_aware_frame(path, tmp.path()).or_else(|_| middle_frame(path, duration_secs, tmp.path()));

    tmp.close().ok();
    result
}

fn face_aware_frame(path: &Path, tmp_dir: &Path) -> Result<Vec<u8>, ThumbnailError> {
    let stderr = ffmpeg::extract_iframes(path, tmp_dir)?;
    let frames = ffmpeg::list_frames(tmp_dir);
    let chosen = face::first_single_face_frame(&frames).ok_or(ThumbnailError::NoFaceFrame)?;

    match ffmpeg::last_crop_directive(&stderr) {
        Some(crop) => {
            let cropped = tmp_dir.join("cropped.jpg");
            ffmpeg::apply_crop(&chosen, crop, &cropped)?;
            std::fs::read(&cropped).map_err(ThumbnailError::from)
        }
        None => std::fs::read(&chosen).map_err(ThumbnailError::from),
    }
}

fn middle_frame(path: &Path, duration_secs: Option<u64>, tmp_dir: &Path) -> Result<Vec<u8>, ThumbnailError> {
    let timestamp = match duration_secs {
        Some(d) if d > 0 => d as f64 / 2.0,
        _ => 5.0,
    };
    let frame_path = tmp_dir.join("middle.jpg");
    let stderr = ffmpeg::extract_frame_at(path, timestamp, &frame_path)?;

    match ffmpeg::last_crop_directive(&stderr) {
        Some(crop) => {
            let cropped = tmp_dir.join("middle-cropped.jpg");
            ffmpeg::apply_crop(&frame_path, crop, &cropped)?;
            std::fs::read(&cropped).map_err(ThumbnailError::from)
        }
        None => std::fs::read(&frame_path).map_err(ThumbnailError::from),
    }
}

/// When `useEmbeddedThumbnails` is on and an embedded picture stream
/// exists, it is preferred over an extracted frame, optionally checked
/// against the video's aspect ratio within a 5% tolerance.
pub fn prefer_embedded(
    path: &Path,
    stream_index: u32,
    video_aspect_ratio: Option<f64>,
    picture_aspect_ratio: Option<f64>,
) -> Result<Vec<u8>, ThumbnailError> {
    if let (Some(video), Some(pic)) = (video_aspect_ratio, picture_aspect_ratio) {
        if ((video - pic) / video).abs() > 0.05 {
            warn!(video, pic, "embedded picture aspect ratio mismatch, falling back to extracted frame");
            return Err(ThumbnailError::NoSource);
        }
    }
    ffmpeg::extract_embedded_stream_jpeg(path, stream_index)
}
