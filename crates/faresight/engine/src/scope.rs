//! View lifetime and cancellation.
//!
//! A [`ViewScope`] lives exactly as long as a mounted view. Every delayed
//! completion and every tick loop the view starts is spawned through it, and
//! tearing the scope down aborts them all. Spawned tasks also hold a
//! [`ScopeGuard`] and check it before touching shared state, so a callback
//! that was already past its last await when teardown ran still does nothing.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::AbortHandle;
use tracing::debug;

/// Cancellation scope of one mounted view.
#[derive(Debug)]
pub struct ViewScope {
    name: String,
    active: Arc<AtomicBool>,
    tasks: Mutex<Vec<AbortHandle>>,
}

/// Cheap handle telling a task whether its scope is still mounted.
#[derive(Debug, Clone)]
pub struct ScopeGuard {
    active: Arc<AtomicBool>,
}

impl ScopeGuard {
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

impl ViewScope {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            active: Arc::new(AtomicBool::new(true)),
            tasks: Mutex::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub fn guard(&self) -> ScopeGuard {
        ScopeGuard {
            active: Arc::clone(&self.active),
        }
    }

    /// Spawn a task owned by this scope.
    ///
    /// Returns `None` without spawning once the scope is torn down. Must be
    /// called from within a tokio runtime.
    pub fn spawn<F>(&self, future: F) -> Option<AbortHandle>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if !self.is_active() {
            return None;
        }
        let handle = tokio::spawn(future).abort_handle();
        let mut tasks = self.tasks.lock();
        tasks.retain(|t| !t.is_finished());
        tasks.push(handle.clone());
        Some(handle)
    }

    /// Tasks spawned through this scope that have not finished yet.
    pub fn pending_tasks(&self) -> usize {
        self.tasks.lock().iter().filter(|t| !t.is_finished()).count()
    }

    /// Abort everything spawned through this scope. Idempotent.
    pub fn teardown(&self) {
        if !self.active.swap(false, Ordering::AcqRel) {
            return;
        }
        let tasks: Vec<AbortHandle> = std::mem::take(&mut *self.tasks.lock());
        for task in &tasks {
            task.abort();
        }
        debug!(scope = %self.name, aborted = tasks.len(), "View scope torn down");
    }
}

impl Drop for ViewScope {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_teardown_aborts_pending_tasks() {
        let scope = ViewScope::new("test");
        let hits = Arc::new(AtomicUsize::new(0));

        let h = Arc::clone(&hits);
        scope
            .spawn(async move {
                tokio::time::sleep(Duration::from_millis(100)).await;
                h.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        assert_eq!(scope.pending_tasks(), 1);

        scope.teardown();
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert!(!scope.is_active());
    }

    #[tokio::test]
    async fn test_spawn_after_teardown_is_refused() {
        let scope = ViewScope::new("test");
        scope.teardown();
        scope.teardown();
        assert!(scope.spawn(async {}).is_none());
    }

    #[tokio::test]
    async fn test_guard_follows_scope() {
        let scope = ViewScope::new("test");
        let guard = scope.guard();
        assert!(guard.is_active());
        drop(scope);
        assert!(!guard.is_active());
    }
}
