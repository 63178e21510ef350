use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use scanner_core::{IllustrationJob, Library, TrackType};
use tracing::{info, warn};

use crate::catalog::{FileSelector, SaveMode};
use crate::extractor;
use crate::tasks::TaskEngine;

use super::context::PipelineContext;
use super::walk::{self, MediaClass};

/// Fixed per §4.5: bounds memory and subprocess load, and the next
/// chunk never starts until the previous chunk's results are drained.
const CHUNK_SIZE: usize = 5;

pub async fn run_scan(ctx: &PipelineContext, engine: &Arc<TaskEngine>, library: &Library) -> anyhow::Result<()> {
    let registered = ctx.catalog.get_all_files(&FileSelector { library: Some(library.slug.clone()), ..Default::default() }).await?;
    let registered_paths: HashSet<String> = registered.into_iter().map(|f| f.path).collect();

    let root = ctx.paths.library_path(&library.path);
    let on_disk = walk::walk_library(&root).await?;

    let new_paths: Vec<PathBuf> = on_disk
        .into_iter()
        .filter(|p| !walk::is_hidden(p))
        .filter(|p| {
            let relative = relative_path(&root, p);
            !registered_paths.contains(&relative)
        })
        .filter(|p| match walk::media_class(p) {
            MediaClass::Audio | MediaClass::Video => true,
            MediaClass::Image => false,
            MediaClass::Other => {
                warn!(path = %p.display(), "unrecognized media type, skipping");
                false
            }
        })
        .collect();

    let total = new_paths.len();
    let mut successes = 0usize;
    let mut failures = 0usize;

    for (chunk_index, chunk) in new_paths.chunks(CHUNK_SIZE).enumerate() {
        let results: Vec<_> = stream::iter(chunk.iter().cloned())
            .map(|path| {
                let ctx = ctx.clone();
                async move {
                    let result = extractor::extract(&path, &ctx.settings, &ctx.track_regex);
                    (path, result)
                }
            })
            .buffer_unordered(CHUNK_SIZE)
            .collect()
            .await;

        for (path, result) in results {
            let errors = extractor::validate(&result.metadata);
            if !errors.is_empty() {
                warn!(path = %path.display(), errors = ?errors, "validation failed, skipping file");
                failures += 1;
                continue;
            }

            match ctx.catalog.save_metadata(&result.metadata, SaveMode::Create).await {
                Ok(saved) => {
                    successes += 1;
                    if result.metadata.illustration_location != scanner_core::IllustrationLocation::None {
                        let job = IllustrationJob {
                            location: result.metadata.illustration_location,
                            illustration_path: result.metadata.illustration_path.clone(),
                            track_path: path.to_string_lossy().into_owned(),
                            track_id: saved.track_id,
                            stream_index: result.metadata.illustration_stream_index,
                        };
                        if let Err(e) = crate::illustration::process_illustration_job(&ctx.catalog, job).await {
                            warn!(error = %e, "illustration upload failed");
                        }
                    }
                    if result.metadata.r#type == Some(TrackType::Video) {
                        engine.queue_thumbnail(scanner_core::ThumbnailJob {
                            track_id: saved.track_id,
                            duration: result.metadata.duration,
                            path: path.to_string_lossy().into_owned(),
                        });
                    }
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to save metadata");
                    failures += 1;
                }
            }
        }

        let done = ((chunk_index + 1) * CHUNK_SIZE).min(total);
        engine.set_progress(done as u64, total.max(1) as u64).await;
    }

    info!(library = library.id, successes, failures, "scan complete");
    Ok(())
}

fn relative_path(root: &std::path::Path, path: &std::path::Path) -> String {
    path.strip_prefix(root).unwrap_or(path).to_string_lossy().into_owned()
}
