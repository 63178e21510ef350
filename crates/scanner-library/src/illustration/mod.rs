mod cover;
mod error;
mod face;
mod ffmpeg;
mod thumbnail;

use std::path::Path;

pub use error::ThumbnailError;
use scanner_core::{IllustrationJob, ThumbnailJob};

use crate::catalog::{CatalogClient, IllustrationKind};

/// Builds the cover image and uploads it. Failures are the caller's to
/// log; they never bubble past metadata upload, per §4.3/§9.
pub async fn process_illustration_job(catalog: &CatalogClient, job: IllustrationJob) -> Result<(), crate::catalog::CatalogError> {
    let bytes = tokio::task::spawn_blocking(move || {
        cover::build_cover_bytes(job.location, &job.track_path, job.illustration_path.as_deref(), job.stream_index)
    })
    .await;

    let bytes = match bytes {
        Ok(Ok(bytes)) => bytes,
        Ok(Err(_)) | Err(_) => return Ok(()),
    };

    catalog.post_illustration(job.track_id, IllustrationKind::Cover, bytes).await
}

/// Builds a face-aware (or middle-frame) thumbnail and uploads it.
pub async fn process_thumbnail_job(catalog: &CatalogClient, job: ThumbnailJob) -> Result<(), crate::catalog::CatalogError> {
    let path = job.path.clone();
    let duration = job.duration;
    let bytes = tokio::task::spawn_blocking(move || thumbnail::build_thumbnail_bytes(Path::new(&path), duration)).await;

    let bytes = match bytes {
        Ok(Ok(bytes)) => bytes,
        Ok(Err(_)) | Err(_) => return Ok(()),
    };

    catalog.post_illustration(job.track_id, IllustrationKind::Thumbnail, bytes).await
}
