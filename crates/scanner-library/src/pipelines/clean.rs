use std::collections::HashSet;
use std::sync::Arc;

use scanner_core::Library;
use tracing::info;

use crate::catalog::FileSelector;
use crate::tasks::TaskEngine;

use super::context::PipelineContext;
use super::walk;

pub async fn run_clean(ctx: &PipelineContext, engine: &Arc<TaskEngine>, library: &Library) -> anyhow::Result<()> {
    engine.set_progress(25, 100).await;
    let registered = ctx.catalog.get_all_files(&FileSelector { library: Some(library.slug.clone()), ..Default::default() }).await?;

    engine.set_progress(50, 100).await;
    let root = ctx.paths.library_path(&library.path);
    let on_disk: HashSet<String> = walk::walk_library(&root)
        .await?
        .into_iter()
        .map(|p| p.strip_prefix(&root).unwrap_or(&p).to_string_lossy().into_owned())
        .collect();

    engine.set_progress(75, 100).await;
    let missing: Vec<i64> = registered.iter().filter(|f| !on_disk.contains(&f.path)).map(|f| f.id).collect();

    if !missing.is_empty() {
        ctx.catalog.delete_files(&missing).await?;
    }

    engine.set_progress(100, 100).await;
    info!(library = library.id, removed = missing.len(), "clean complete");
    Ok(())
}
