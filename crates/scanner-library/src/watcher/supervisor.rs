use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use scanner_core::{Library, TaskType};
use tokio::sync::{mpsc, Mutex};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::pipelines::{self, PipelineContext};
use crate::tasks::{Task, TaskEngine};

use super::effect::EffectType;

const POLL_PERIOD: Duration = Duration::from_secs(5);

struct LiveWatcher {
    _watcher: RecommendedWatcher,
    path: PathBuf,
}

pub struct FsEvent {
    library_id: i64,
    effect: EffectType,
}

/// Owns the set of live native watchers, reconciling it against
/// `getAllLibraries()` every ~5 seconds, and bridges their raw events
/// into task-engine enqueues. Never terminates on poll failure.
pub struct WatcherSupervisor {
    ctx: PipelineContext,
    engine: Arc<TaskEngine>,
    live: Mutex<HashMap<i64, LiveWatcher>>,
    event_tx: mpsc::UnboundedSender<FsEvent>,
}

impl WatcherSupervisor {
    pub fn new(ctx: PipelineContext, engine: Arc<TaskEngine>) -> (Arc<Self>, mpsc::UnboundedReceiver<FsEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        (Arc::new(Self { ctx, engine, live: Mutex::new(HashMap::new()), event_tx }), event_rx)
    }

    pub async fn run(self: Arc<Self>, mut event_rx: mpsc::UnboundedReceiver<FsEvent>, shutdown: tokio_util::sync::CancellationToken) {
        let supervisor = Arc::clone(&self);
        let bridge_shutdown = shutdown.clone();
        let bridge = tokio::spawn(async move {
            loop {
                tokio::select! {
                    Some(event) = event_rx.recv() => supervisor.handle_event(event).await,
                    _ = bridge_shutdown.cancelled() => return,
                }
            }
        });

        let mut ticker = tokio::time::interval(POLL_PERIOD);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.reconcile().await {
                        warn!(error = %e, "library poll failed, retrying next tick");
                    }
                }
                _ = shutdown.cancelled() => break,
            }
        }
        bridge.abort();
    }

    async fn reconcile(&self) -> anyhow::Result<()> {
        let libraries = self.ctx.catalog.get_all_libraries().await?;
        let mut live = self.live.lock().await;

        let seen: std::collections::HashSet<i64> = libraries.iter().map(|l| l.id).collect();
        live.retain(|id, _| seen.contains(id));

        for library in &libraries {
            let root = self.ctx.paths.library_path(&library.path);
            let needs_new = match live.get(&library.id) {
                None => true,
                Some(existing) => existing.path != root,
            };
            if !needs_new {
                continue;
            }

            match self.start_watcher(library.id, &root) {
                Ok(watcher) => {
                    live.insert(library.id, LiveWatcher { _watcher: watcher, path: root });
                    let _ = self.event_tx.send(FsEvent { library_id: library.id, effect: EffectType::Startup });
                }
                Err(e) => error!(library = library.id, error = %e, "failed to start watcher"),
            }
        }
        Ok(())
    }

    fn start_watcher(&self, library_id: i64, root: &PathBuf) -> notify::Result<RecommendedWatcher> {
        let tx = self.event_tx.clone();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| match res {
            Ok(event) => {
                let effect = super::effect::from_notify_kind(&event.kind);
                let _ = tx.send(FsEvent { library_id, effect });
            }
            Err(e) => warn!(error = %e, "watcher reported an error"),
        })?;
        watcher.watch(root, RecursiveMode::Recursive)?;
        Ok(watcher)
    }

    async fn handle_event(&self, event: FsEvent) {
        let library = {
            let registry = match self.ctx.catalog.get_all_libraries().await {
                Ok(libs) => libs,
                Err(e) => {
                    warn!(error = %e, "could not resolve library for event");
                    return;
                }
            };
            registry.into_iter().find(|l| l.id == event.library_id)
        };
        let Some(library) = library else { return };

        match event.effect {
            EffectType::Startup | EffectType::Create => self.enqueue_scan(library).await,
            EffectType::Rename => {
                self.enqueue_clean(library.clone()).await;
                self.enqueue_scan(library).await;
            }
            EffectType::Delete => self.enqueue_clean(library).await,
            EffectType::Modify | EffectType::OwnerChanged | EffectType::Other => {}
        }
    }

    async fn enqueue_scan(&self, library: Library) {
        let ctx = self.ctx.clone();
        let task = Task {
            id: Uuid::new_v4().to_string(),
            name: format!("scan:{}", library.slug),
            library_id: Some(library.id),
            task_type: TaskType::Scan,
            action: Box::new(move |engine| {
                Box::pin(async move {
                    if let Err(e) = pipelines::run_scan(&ctx, &engine, &library).await {
                        error!(error = %e, "scan failed");
                    }
                })
            }),
        };
        self.engine.add_task_if_none_equivalent(task).await;
    }

    async fn enqueue_clean(&self, library: Library) {
        let ctx = self.ctx.clone();
        let task = Task {
            id: Uuid::new_v4().to_string(),
            name: format!("clean:{}", library.slug),
            library_id: Some(library.id),
            task_type: TaskType::Clean,
            action: Box::new(move |engine| {
                Box::pin(async move {
                    if let Err(e) = pipelines::run_clean(&ctx, &engine, &library).await {
                        error!(error = %e, "clean failed");
                    }
                })
            }),
        };
        self.engine.add_task_if_none_equivalent(task).await;
    }
}
