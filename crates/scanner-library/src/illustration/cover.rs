use scanner_core::IllustrationLocation;

use super::error::ThumbnailError;
use super::ffmpeg;

/// Produces the cover image bytes for an `IllustrationJob`, per §4.3:
/// `Embedded` pipes the indicated stream through ffmpeg; `Inline` reads
/// the sibling file directly.
pub fn build_cover_bytes(
    location: IllustrationLocation,
    track_path: &str,
    illustration_path: Option<&str>,
    stream_index: Option<u32>,
) -> Result<Vec<u8>, ThumbnailError> {
    match location {
        IllustrationLocation::Embedded => {
            let idx = stream_index.ok_or(ThumbnailError::NoSource)?;
            ffmpeg::extract_embedded_stream_jpeg(std::path::Path::new(track_path), idx)
        }
        IllustrationLocation::Inline => {
            let path = illustration_path.ok_or(ThumbnailError::NoSource)?;
            std::fs::read(path).map_err(ThumbnailError::from)
        }
        IllustrationLocation::None => Err(ThumbnailError::NoSource),
    }
}
