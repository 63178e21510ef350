use std::collections::HashMap;
use std::sync::Arc;

use scanner_core::TrackType;
use tracing::{info, warn};

use crate::catalog::{FileSelector, SaveMode};
use crate::extractor;
use crate::tasks::TaskEngine;

use super::context::PipelineContext;

pub async fn run_refresh(ctx: &PipelineContext, engine: &Arc<TaskEngine>, selector: FileSelector, force: bool) -> anyhow::Result<()> {
    let files = ctx.catalog.get_all_files(&selector).await?;
    let libraries: HashMap<i64, scanner_core::Library> = ctx.catalog.get_all_libraries().await?.into_iter().map(|l| (l.id, l)).collect();

    let total = files.len().max(1);
    let mut skipped = 0usize;
    let mut refreshed = 0usize;

    for (i, file) in files.iter().enumerate() {
        let Some(library) = libraries.get(&file.library_id) else {
            warn!(file_id = file.id, "no library found for file, skipping");
            continue;
        };
        let path = ctx.paths.library_path(&library.path).join(&file.path);

        if !force {
            match scanner_core::checksum::compute(&path) {
                Ok(checksum) if checksum == file.checksum => {
                    skipped += 1;
                    engine.set_progress((i + 1) as u64, total as u64).await;
                    continue;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to compute checksum, refreshing anyway");
                }
            }
        }

        let result = extractor::extract(&path, &ctx.settings, &ctx.track_regex);
        let errors = extractor::validate(&result.metadata);
        if !errors.is_empty() {
            warn!(path = %path.display(), errors = ?errors, "validation failed, skipping file");
            engine.set_progress((i + 1) as u64, total as u64).await;
            continue;
        }

        match ctx.catalog.save_metadata(&result.metadata, SaveMode::Update).await {
            Ok(saved) => {
                refreshed += 1;
                if result.metadata.illustration_location != scanner_core::IllustrationLocation::None {
                    let job = scanner_core::IllustrationJob {
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
            Err(e) => warn!(path = %path.display(), error = %e, "failed to save refreshed metadata"),
        }

        engine.set_progress((i + 1) as u64, total as u64).await;
    }

    info!(refreshed, skipped, "refresh complete");
    Ok(())
}
