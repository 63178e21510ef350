use std::collections::VecDeque;
use std::sync::Arc;

use futures::future::BoxFuture;
use scanner_core::{TaskInfo, TaskType, ThumbnailJob};
use tokio::sync::{mpsc, Mutex, Notify};
use tracing::{error, info, warn};

pub type TaskAction = Box<dyn FnOnce(Arc<TaskEngine>) -> BoxFuture<'static, ()> + Send>;

pub struct Task {
    pub id: String,
    pub name: String,
    pub library_id: Option<i64>,
    pub task_type: TaskType,
    pub action: TaskAction,
}

impl Task {
    fn info(&self) -> TaskInfo {
        TaskInfo { id: self.id.clone(), name: self.name.clone() }
    }

    /// §4.4: Refresh-vs-Refresh compares `name`; otherwise compares
    /// `libraryId` and `type`.
    fn is_equivalent_to(&self, other: &Task) -> bool {
        if self.task_type == TaskType::Refresh && other.task_type == TaskType::Refresh {
            self.name == other.name
        } else {
            self.task_type == other.task_type && self.library_id == other.library_id
        }
    }
}

struct EngineState {
    current: Option<(Task, TaskInfo)>,
    pending: VecDeque<Task>,
    progress: u8,
}

/// One active task at a time in the primary lane; thumbnail work runs in
/// its own unbounded background lane so long video extraction never
/// blocks scan/clean/refresh. Every field of [`EngineState`] is behind a
/// single mutex, per §4.4.
pub struct TaskEngine {
    state: Mutex<EngineState>,
    notify: Notify,
    thumbnail_tx: mpsc::UnboundedSender<ThumbnailJob>,
}

impl TaskEngine {
    pub fn new(thumbnail_tx: mpsc::UnboundedSender<ThumbnailJob>) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(EngineState { current: None, pending: VecDeque::new(), progress: 0 }),
            notify: Notify::new(),
            thumbnail_tx,
        })
    }

    pub fn queue_thumbnail(&self, job: ThumbnailJob) {
        if self.thumbnail_tx.send(job).is_err() {
            warn!("thumbnail lane receiver dropped, job discarded");
        }
    }

    pub async fn add_task(self: &Arc<Self>, task: Task) -> TaskInfo {
        let info = task.info();
        info!(task = %info.name, "task queued");
        self.state.lock().await.pending.push_back(task);
        self.notify.notify_one();
        info
    }

    pub async fn add_task_if_none_equivalent(self: &Arc<Self>, task: Task) -> bool {
        let mut state = self.state.lock().await;
        let duplicate = state
            .current
            .as_ref()
            .map(|(t, _)| t.is_equivalent_to(&task))
            .unwrap_or(false)
            || state.pending.iter().any(|pending| pending.is_equivalent_to(&task));

        if duplicate {
            return false;
        }
        info!(task = %task.name, "task queued");
        state.pending.push_back(task);
        drop(state);
        self.notify.notify_one();
        true
    }

    pub async fn set_progress(&self, steps_done: u64, steps_total: u64) {
        if steps_total == 0 {
            return;
        }
        let mut state = self.state.lock().await;
        let pct = (100.0 * steps_done as f64 / steps_total as f64).round();
        let clamped = pct.clamp(0.0, 100.0) as u8;
        if !(0.0..=100.0).contains(&pct) {
            warn!(steps_done, steps_total, pct, "progress out of range, clamped");
        }
        state.progress = clamped;
    }

    pub async fn current_tasks(&self) -> (Option<TaskInfo>, u8, Vec<TaskInfo>) {
        let state = self.state.lock().await;
        let current = state.current.as_ref().map(|(_, info)| info.clone());
        let pending = state.pending.iter().map(Task::info).collect();
        (current, state.progress, pending)
    }

    /// The primary lane's consumer loop. Runs until `shutdown` resolves.
    pub async fn run(self: Arc<Self>, shutdown: tokio_util::sync::CancellationToken) {
        loop {
            let next = {
                let mut state = self.state.lock().await;
                state.pending.pop_front()
            };

            let Some(task) = next else {
                tokio::select! {
                    _ = self.notify.notified() => continue,
                    _ = shutdown.cancelled() => return,
                }
            };

            let info = task.info();
            {
                let mut state = self.state.lock().await;
                state.progress = 0;
                state.current = Some((placeholder(&task), info.clone()));
            }

            let action = task.action;
            let engine = Arc::clone(&self);
            info!(task = %info.name, "task started");
            action(Arc::clone(&engine)).await;
            info!(task = %info.name, "task finished");

            let mut state = self.state.lock().await;
            state.current = None;
            state.progress = 0;
        }
    }
}

/// `Task` holds a non-`Clone` boxed closure, so `current` cannot keep the
/// original action around after it's been taken to run. We only need the
/// `TaskInfo` half for reads; this builds a same-shaped placeholder so
/// `current`'s tuple type stays `(Task, TaskInfo)` without requiring
/// `Task: Clone`.
fn placeholder(task: &Task) -> Task {
    Task { id: task.id.clone(), name: task.name.clone(), library_id: task.library_id, task_type: task.task_type, action: Box::new(|_| Box::pin(async {})) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn noop_task(id: &str, name: &str, library_id: Option<i64>, task_type: TaskType) -> Task {
        Task { id: id.to_string(), name: name.to_string(), library_id, task_type, action: Box::new(|_| Box::pin(async {})) }
    }

    #[tokio::test]
    async fn add_task_if_none_equivalent_rejects_duplicate_by_library_and_type() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let engine = TaskEngine::new(tx);

        assert!(engine.add_task_if_none_equivalent(noop_task("1", "Scan A", Some(1), TaskType::Scan)).await);
        assert!(!engine.add_task_if_none_equivalent(noop_task("2", "Scan A again", Some(1), TaskType::Scan)).await);
        assert!(engine.add_task_if_none_equivalent(noop_task("3", "Scan B", Some(2), TaskType::Scan)).await);
    }

    #[tokio::test]
    async fn refresh_equivalence_compares_name_not_library() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let engine = TaskEngine::new(tx);

        assert!(engine.add_task_if_none_equivalent(noop_task("1", "refresh:song:42", Some(1), TaskType::Refresh)).await);
        assert!(!engine.add_task_if_none_equivalent(noop_task("2", "refresh:song:42", Some(9), TaskType::Refresh)).await);
    }

    #[tokio::test]
    async fn set_progress_is_noop_when_total_is_zero() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let engine = TaskEngine::new(tx);
        engine.set_progress(5, 0).await;
        let (_, progress, _) = engine.current_tasks().await;
        assert_eq!(progress, 0);
    }

    #[tokio::test]
    async fn set_progress_rounds_and_clamps() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let engine = TaskEngine::new(tx);
        engine.set_progress(1, 3).await;
        let (_, progress, _) = engine.current_tasks().await;
        assert_eq!(progress, 33);
    }

    #[tokio::test]
    async fn run_executes_queued_task_action() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let engine = TaskEngine::new(tx);
        let ran = Arc::new(AtomicBool::new(false));
        let ran_clone = Arc::clone(&ran);

        let task = Task {
            id: "1".into(),
            name: "Scan".into(),
            library_id: Some(1),
            task_type: TaskType::Scan,
            action: Box::new(move |_engine| {
                let ran = Arc::clone(&ran_clone);
                Box::pin(async move {
                    ran.store(true, Ordering::SeqCst);
                })
            }),
        };
        engine.add_task(task).await;

        let shutdown = tokio_util::sync::CancellationToken::new();
        let shutdown_clone = shutdown.clone();
        let engine_clone = Arc::clone(&engine);
        let handle = tokio::spawn(async move { engine_clone.run(shutdown_clone).await });

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        shutdown.cancel();
        handle.await.ok();

        assert!(ran.load(Ordering::SeqCst));
    }
}
