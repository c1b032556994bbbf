//! Simulated asynchronous actions.
//!
//! A [`SimulatedAction`] models a button that starts "work" on a remote
//! system: it flips to `Running` immediately, waits a fixed delay, then runs
//! a synchronous closure whose result decides between `Succeeded` and
//! `Failed`. Each transition is announced through the action's
//! [`StatusSink`] and its status `watch` channel.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use faresight_types::{ActionStatus, StatusMessage};
use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::scope::ViewScope;
use crate::status::StatusSink;

/// Failure produced by an action's work closure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ActionFailure(pub String);

impl ActionFailure {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// Snapshot of an action's lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionState<T> {
    pub status: ActionStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub result: Option<T>,
    pub error: Option<String>,
}

impl<T> Default for ActionState<T> {
    fn default() -> Self {
        Self {
            status: ActionStatus::Idle,
            started_at: None,
            finished_at: None,
            result: None,
            error: None,
        }
    }
}

/// What a call to [`SimulatedAction::trigger`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// Moved to `Running`; completion is scheduled.
    Started,
    /// Already running. Nothing changed.
    Ignored,
    /// The owning view is gone. Nothing changed.
    ScopeClosed,
}

/// Texts announced over an action's lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionMessages {
    /// Groups the loading message with the terminal one.
    pub key: String,
    pub started: String,
    pub succeeded: String,
    pub failed: String,
}

impl ActionMessages {
    pub fn new(
        key: impl Into<String>,
        started: impl Into<String>,
        succeeded: impl Into<String>,
        failed: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            started: started.into(),
            succeeded: succeeded.into(),
            failed: failed.into(),
        }
    }
}

/// An `idle -> running -> succeeded | failed` action over a fixed delay.
pub struct SimulatedAction<T> {
    name: String,
    messages: ActionMessages,
    state: Arc<Mutex<ActionState<T>>>,
    status_tx: Arc<watch::Sender<ActionStatus>>,
    sink: Arc<dyn StatusSink>,
}

impl<T> Clone for SimulatedAction<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            messages: self.messages.clone(),
            state: Arc::clone(&self.state),
            status_tx: Arc::clone(&self.status_tx),
            sink: Arc::clone(&self.sink),
        }
    }
}

impl<T> std::fmt::Debug for SimulatedAction<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulatedAction")
            .field("name", &self.name)
            .field("status", &self.status())
            .finish()
    }
}

impl<T> SimulatedAction<T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> ActionStatus {
        self.state.lock().status
    }

    pub fn watch_status(&self) -> watch::Receiver<ActionStatus> {
        self.status_tx.subscribe()
    }

    /// Wait until the action is no longer running and return its status.
    pub async fn finished(&self) -> ActionStatus {
        let mut rx = self.status_tx.subscribe();
        loop {
            let status = *rx.borrow_and_update();
            if !status.is_running() {
                return status;
            }
            if rx.changed().await.is_err() {
                return status;
            }
        }
    }

    /// Return a terminal action to `Idle`. Refused while running.
    pub fn reset(&self) -> bool {
        let mut state = self.state.lock();
        if state.status.is_running() {
            return false;
        }
        *state = ActionState::default();
        drop(state);
        self.status_tx.send_replace(ActionStatus::Idle);
        true
    }
}

/// Held by a completion task for as long as the action is `Running`.
///
/// If the task goes away before writing a terminal state, because its scope
/// aborted it or it unwound, the action falls back to `Idle`.
struct RunningGuard<T> {
    state: Arc<Mutex<ActionState<T>>>,
    status_tx: Arc<watch::Sender<ActionStatus>>,
}

impl<T> Drop for RunningGuard<T> {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        if !state.status.is_running() {
            return;
        }
        *state = ActionState::default();
        drop(state);
        self.status_tx.send_replace(ActionStatus::Idle);
    }
}

impl<T> SimulatedAction<T>
where
    T: Clone + Send + 'static,
{
    pub fn new(name: impl Into<String>, messages: ActionMessages, sink: Arc<dyn StatusSink>) -> Self {
        let (status_tx, _) = watch::channel(ActionStatus::Idle);
        Self {
            name: name.into(),
            messages,
            state: Arc::new(Mutex::new(ActionState::default())),
            status_tx: Arc::new(status_tx),
            sink,
        }
    }

    pub fn state(&self) -> ActionState<T> {
        self.state.lock().clone()
    }

    /// Result of the last successful run.
    pub fn result(&self) -> Option<T> {
        self.state.lock().result.clone()
    }

    /// Start the action.
    ///
    /// After `delay`, `work` runs and the state turns terminal. Then
    /// `on_complete` receives the outcome and the terminal message is
    /// emitted. Both closures run at most once, and never after `scope` is
    /// torn down. A panic in either one fails the action.
    #[instrument(skip(self, scope, work, on_complete), fields(action = %self.name))]
    pub fn trigger<W, C>(
        &self,
        scope: &ViewScope,
        delay: Duration,
        work: W,
        on_complete: C,
    ) -> TriggerOutcome
    where
        W: FnOnce() -> Result<T, ActionFailure> + Send + 'static,
        C: FnOnce(Result<&T, &ActionFailure>) + Send + 'static,
    {
        if !scope.is_active() {
            debug!("Trigger on closed scope ignored");
            return TriggerOutcome::ScopeClosed;
        }

        {
            let mut state = self.state.lock();
            if state.status.is_running() {
                debug!("Action already running, trigger ignored");
                return TriggerOutcome::Ignored;
            }
            *state = ActionState {
                status: ActionStatus::Running,
                started_at: Some(Utc::now()),
                ..ActionState::default()
            };
        }
        self.status_tx.send_replace(ActionStatus::Running);
        self.sink.emit(StatusMessage::loading(
            &self.messages.key,
            &self.messages.started,
        ));

        let name = self.name.clone();
        let messages = self.messages.clone();
        let sink = Arc::clone(&self.sink);
        let guard = scope.guard();
        let running = RunningGuard {
            state: Arc::clone(&self.state),
            status_tx: Arc::clone(&self.status_tx),
        };
        let deadline = Instant::now() + delay;

        let spawned = scope.spawn(async move {
            tokio::time::sleep_until(deadline).await;
            if !guard.is_active() {
                return;
            }

            let outcome = catch_unwind(AssertUnwindSafe(work)).unwrap_or_else(|_| {
                warn!(action = %name, "Action work panicked");
                Err(ActionFailure::new("action panicked"))
            });

            {
                let mut state = running.state.lock();
                state.finished_at = Some(Utc::now());
                match &outcome {
                    Ok(value) => {
                        state.status = ActionStatus::Succeeded;
                        state.result = Some(value.clone());
                    }
                    Err(failure) => {
                        state.status = ActionStatus::Failed;
                        state.error = Some(failure.0.clone());
                    }
                }
            }

            if catch_unwind(AssertUnwindSafe(|| on_complete(outcome.as_ref()))).is_err() {
                warn!(action = %name, "Completion callback panicked");
                let mut state = running.state.lock();
                state.status = ActionStatus::Failed;
                state.result = None;
                state.error = Some("completion callback panicked".to_string());
            }

            let status = running.state.lock().status;
            running.status_tx.send_replace(status);

            match status {
                ActionStatus::Succeeded => {
                    info!(action = %name, "Action succeeded");
                    sink.emit(StatusMessage::success(&messages.key, &messages.succeeded));
                }
                _ => {
                    warn!(action = %name, "Action failed");
                    sink.emit(StatusMessage::error(&messages.key, &messages.failed));
                }
            }
        });

        if spawned.is_none() {
            // Scope closed between the check above and the spawn.
            *self.state.lock() = ActionState::default();
            self.status_tx.send_replace(ActionStatus::Idle);
            return TriggerOutcome::ScopeClosed;
        }

        TriggerOutcome::Started
    }
}
