//! Recurring metric ticks.
//!
//! [`LiveTickEngine`] random-walks a fixed set of named metrics on an
//! interval while its view is mounted. Each tick produces one immutable
//! [`MetricSnapshot`], which is swapped into a `watch` channel and then
//! handed to every callback subscriber. A failing or panicking subscriber is
//! logged and skipped; it never stops the clock.

use std::collections::HashSet;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use faresight_types::{Metric, MetricSnapshot, SubscriptionId};
use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;
use tokio::task::AbortHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, instrument, warn};

use crate::error::{EngineError, EngineResult};
use crate::generator::step_metric;
use crate::random::SharedRandom;
use crate::scope::{ScopeGuard, ViewScope};

/// What a subscriber callback reports back.
pub type SubscriberResult = Result<(), String>;

type Subscriber = Arc<dyn Fn(&MetricSnapshot) -> SubscriberResult + Send + Sync>;

/// State shared between the engine handle and its tick task.
struct TickShared {
    name: String,
    metrics: Mutex<(u64, Vec<Metric>)>,
    rng: SharedRandom,
    subscribers: RwLock<Vec<(SubscriptionId, Subscriber)>>,
    snapshots: watch::Sender<Option<Arc<MetricSnapshot>>>,
    subscriber_failures: AtomicU64,
}

impl TickShared {
    /// Advance every metric once and publish the result.
    ///
    /// Returns `None` when there is nothing to tick.
    fn tick(&self) -> Option<Arc<MetricSnapshot>> {
        let snapshot = {
            let mut guard = self.metrics.lock();
            let (tick, metrics) = &mut *guard;
            if metrics.is_empty() {
                return None;
            }
            let mut rng = self.rng.lock();
            for metric in metrics.iter_mut() {
                step_metric(metric, &mut *rng);
            }
            *tick += 1;
            Arc::new(MetricSnapshot::new(*tick, metrics.clone()))
        };

        self.snapshots.send_replace(Some(Arc::clone(&snapshot)));

        let subscribers: Vec<(SubscriptionId, Subscriber)> = self.subscribers.read().clone();
        for (id, callback) in subscribers {
            match catch_unwind(AssertUnwindSafe(|| callback(&snapshot))) {
                Ok(Ok(())) => {}
                Ok(Err(error)) => {
                    self.subscriber_failures.fetch_add(1, Ordering::Relaxed);
                    warn!(engine = %self.name, subscription = %id, error = %error, "Tick subscriber failed");
                }
                Err(_) => {
                    self.subscriber_failures.fetch_add(1, Ordering::Relaxed);
                    warn!(engine = %self.name, subscription = %id, "Tick subscriber panicked");
                }
            }
        }

        debug!(engine = %self.name, tick = snapshot.tick, "Tick published");
        Some(snapshot)
    }
}

/// Recurring random-walk ticker for one view.
pub struct LiveTickEngine {
    shared: Arc<TickShared>,
    task: Mutex<Option<(AbortHandle, ScopeGuard)>>,
    next_subscription: Mutex<SubscriptionId>,
}

impl LiveTickEngine {
    pub fn new(name: impl Into<String>, rng: SharedRandom) -> Self {
        let (snapshots, _) = watch::channel(None);
        Self {
            shared: Arc::new(TickShared {
                name: name.into(),
                metrics: Mutex::new((0, Vec::new())),
                rng,
                subscribers: RwLock::new(Vec::new()),
                snapshots,
                subscriber_failures: AtomicU64::new(0),
            }),
            task: Mutex::new(None),
            next_subscription: Mutex::new(SubscriptionId::from_raw(1)),
        }
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    pub fn is_running(&self) -> bool {
        match &*self.task.lock() {
            Some((handle, guard)) => guard.is_active() && !handle.is_finished(),
            None => false,
        }
    }

    /// Start ticking `metrics` every `interval`, first tick one interval from now.
    ///
    /// The seed values are published immediately as tick zero.
    #[instrument(skip(self, scope, metrics), fields(engine = %self.shared.name))]
    pub fn start(
        &self,
        scope: &ViewScope,
        interval: Duration,
        metrics: Vec<Metric>,
    ) -> EngineResult<()> {
        if interval.is_zero() {
            return Err(EngineError::InvalidInterval);
        }
        if metrics.is_empty() {
            return Err(EngineError::NoMetrics);
        }
        let mut names = HashSet::new();
        for metric in &metrics {
            metric.validate()?;
            if !names.insert(metric.name.as_str()) {
                return Err(EngineError::DuplicateMetric(metric.name.clone()));
            }
        }

        let mut task = self.task.lock();
        if let Some((handle, guard)) = &*task {
            if guard.is_active() && !handle.is_finished() {
                return Err(EngineError::AlreadyRunning(self.shared.name.clone()));
            }
        }
        if !scope.is_active() {
            return Err(EngineError::ScopeClosed(scope.name().to_string()));
        }

        let count = metrics.len();
        *self.shared.metrics.lock() = (0, metrics.clone());
        self.shared
            .snapshots
            .send_replace(Some(Arc::new(MetricSnapshot::new(0, metrics))));

        let shared = Arc::clone(&self.shared);
        let guard = scope.guard();
        let loop_guard = guard.clone();
        let first_tick = Instant::now() + interval;
        let handle = scope
            .spawn(async move {
                let mut ticker = interval_at(first_tick, interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    ticker.tick().await;
                    if !loop_guard.is_active() {
                        break;
                    }
                    if shared.tick().is_none() {
                        break;
                    }
                }
            })
            .ok_or_else(|| EngineError::ScopeClosed(scope.name().to_string()))?;

        *task = Some((handle, guard));
        info!(
            metrics = count,
            interval_ms = interval.as_millis() as u64,
            "Tick engine started"
        );
        Ok(())
    }

    /// Stop ticking and drop the metrics. Idempotent.
    pub fn stop(&self) {
        let Some((handle, _)) = self.task.lock().take() else {
            return;
        };
        handle.abort();
        self.shared.metrics.lock().1.clear();
        info!(engine = %self.shared.name, "Tick engine stopped");
    }

    /// Run one tick right now, outside the timer. `None` when stopped.
    pub fn tick_now(&self) -> Option<Arc<MetricSnapshot>> {
        if !self.is_running() {
            return None;
        }
        self.shared.tick()
    }

    /// Register a callback invoked with every new snapshot.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&MetricSnapshot) -> SubscriberResult + Send + Sync + 'static,
    {
        let id = {
            let mut next = self.next_subscription.lock();
            let id = *next;
            *next = id.next();
            id
        };
        self.shared.subscribers.write().push((id, Arc::new(callback)));
        id
    }

    /// Remove a subscriber. Returns whether it was registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.shared.subscribers.write();
        let before = subscribers.len();
        subscribers.retain(|(sid, _)| *sid != id);
        subscribers.len() != before
    }

    /// Latest published snapshot, if any.
    pub fn latest(&self) -> Option<Arc<MetricSnapshot>> {
        self.shared.snapshots.borrow().clone()
    }

    pub fn watch_snapshots(&self) -> watch::Receiver<Option<Arc<MetricSnapshot>>> {
        self.shared.snapshots.subscribe()
    }

    /// Subscriber callbacks that returned an error or panicked.
    pub fn subscriber_failures(&self) -> u64 {
        self.shared.subscriber_failures.load(Ordering::Relaxed)
    }
}

impl Drop for LiveTickEngine {
    fn drop(&mut self) {
        if let Some((handle, _)) = self.task.lock().take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::{shared, ScriptedSource};

    fn cpu() -> Metric {
        Metric::new("cpu", 45.0, 0.0, 100.0, 5.0).unwrap()
    }

    fn test_engine(values: &[f64]) -> LiveTickEngine {
        LiveTickEngine::new(
            "test",
            shared(Box::new(ScriptedSource::new(values.to_vec()))),
        )
    }

    #[tokio::test]
    async fn test_start_validation() {
        let scope = ViewScope::new("test");
        let engine = test_engine(&[0.5]);

        assert!(matches!(
            engine.start(&scope, Duration::ZERO, vec![cpu()]),
            Err(EngineError::InvalidInterval)
        ));
        assert!(matches!(
            engine.start(&scope, Duration::from_secs(1), vec![cpu(), cpu()]),
            Err(EngineError::DuplicateMetric(_))
        ));
        assert!(!engine.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_rejects_empty_metrics() {
        let scope = ViewScope::new("test");
        let engine = test_engine(&[0.5]);

        assert!(matches!(
            engine.start(&scope, Duration::from_secs(1), Vec::new()),
            Err(EngineError::NoMetrics)
        ));
        assert!(!engine.is_running());
        assert!(engine.latest().is_none());
        assert_eq!(scope.pending_tasks(), 0);
    }

    #[tokio::test]
    async fn test_start_twice_fails() {
        let scope = ViewScope::new("test");
        let engine = test_engine(&[0.5]);
        engine.start(&scope, Duration::from_secs(1), vec![cpu()]).unwrap();
        assert!(matches!(
            engine.start(&scope, Duration::from_secs(1), vec![cpu()]),
            Err(EngineError::AlreadyRunning(_))
        ));
    }

    #[tokio::test]
    async fn test_seed_snapshot_published() {
        let scope = ViewScope::new("test");
        let engine = test_engine(&[0.5]);
        engine.start(&scope, Duration::from_secs(1), vec![cpu()]).unwrap();

        let latest = engine.latest().unwrap();
        assert_eq!(latest.tick, 0);
        assert_eq!(latest.value("cpu"), Some(45.0));
    }

    #[tokio::test]
    async fn test_tick_now_and_unsubscribe() {
        let scope = ViewScope::new("test");
        let engine = test_engine(&[1.0]);
        let seen = Arc::new(AtomicU64::new(0));

        let s = Arc::clone(&seen);
        let id = engine.subscribe(move |snap| {
            s.store(snap.tick, Ordering::SeqCst);
            Ok(())
        });
        assert!(engine.tick_now().is_none());

        engine.start(&scope, Duration::from_secs(60), vec![cpu()]).unwrap();
        let snap = engine.tick_now().unwrap();
        assert_eq!(snap.tick, 1);
        assert!(snap.value("cpu").unwrap() > 49.9);
        assert_eq!(seen.load(Ordering::SeqCst), 1);

        assert!(engine.unsubscribe(id));
        assert!(!engine.unsubscribe(id));
        engine.tick_now().unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let scope = ViewScope::new("test");
        let engine = test_engine(&[0.5]);
        engine.stop();
        engine.start(&scope, Duration::from_secs(1), vec![cpu()]).unwrap();
        engine.stop();
        engine.stop();
        assert!(!engine.is_running());
        assert!(engine.tick_now().is_none());

        engine.start(&scope, Duration::from_secs(1), vec![cpu()]).unwrap();
        assert!(engine.is_running());
    }

    #[tokio::test]
    async fn test_failing_subscriber_isolated() {
        let scope = ViewScope::new("test");
        let engine = test_engine(&[0.5]);
        let delivered = Arc::new(AtomicU64::new(0));

        engine.subscribe(|_| Err("render failed".to_string()));
        let d = Arc::clone(&delivered);
        engine.subscribe(move |_| {
            d.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        engine.start(&scope, Duration::from_secs(1), vec![cpu()]).unwrap();
        engine.tick_now().unwrap();
        engine.tick_now().unwrap();

        assert_eq!(delivered.load(Ordering::SeqCst), 2);
        assert_eq!(engine.subscriber_failures(), 2);
    }
}
