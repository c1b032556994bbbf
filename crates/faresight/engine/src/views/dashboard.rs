//! Dashboard view: headline stats ticker, charts, refresh and analysis runs.

use std::sync::Arc;
use std::time::Duration;

use faresight_types::{DashboardData, SystemStats};
use parking_lot::RwLock;
use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use super::ViewContext;
use crate::action::{ActionMessages, SimulatedAction, TriggerOutcome};
use crate::error::{EngineError, EngineResult};
use crate::generator::{dashboard_data, next_system_stats};
use crate::random::SharedRandom;
use crate::scope::ViewScope;

const VIEW_NAME: &str = "dashboard";

/// Overview charts plus app-wide stats redrawn on their own interval.
pub struct DashboardView {
    scope: ViewScope,
    rng: SharedRandom,
    stats: Arc<watch::Sender<SystemStats>>,
    data: Arc<RwLock<DashboardData>>,
    refresh: SimulatedAction<()>,
    analysis: SimulatedAction<()>,
    refresh_delay: Duration,
    analysis_delay: Duration,
}

impl DashboardView {
    /// Mount with fresh charts and start the stats ticker.
    ///
    /// Stats start at zero and first change one interval after mount.
    pub fn mount(ctx: &ViewContext) -> EngineResult<Self> {
        let interval = ctx.config.ticker.stats_interval();
        if interval.is_zero() {
            return Err(EngineError::InvalidInterval);
        }

        let scope = ViewScope::new(VIEW_NAME);
        let rng = ctx.random_for(VIEW_NAME);
        let data = dashboard_data(&mut **rng.lock());
        let (tx, _) = watch::channel(SystemStats::default());
        let stats = Arc::new(tx);

        let guard = scope.guard();
        let loop_rng = Arc::clone(&rng);
        let loop_stats = Arc::clone(&stats);
        let first_tick = Instant::now() + interval;
        scope
            .spawn(async move {
                let mut ticker = interval_at(first_tick, interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    ticker.tick().await;
                    if !guard.is_active() {
                        break;
                    }
                    let next = next_system_stats(&loop_stats.borrow(), &mut **loop_rng.lock());
                    loop_stats.send_replace(next);
                    debug!(total_searches = next.total_searches, "System stats updated");
                }
            })
            .ok_or_else(|| EngineError::ScopeClosed(scope.name().to_string()))?;

        info!(
            interval_ms = interval.as_millis() as u64,
            "Dashboard mounted"
        );

        let actions = &ctx.config.actions;
        Ok(Self {
            scope,
            rng,
            stats,
            data: Arc::new(RwLock::new(data)),
            refresh: SimulatedAction::new(
                "refresh",
                ActionMessages::new(
                    "refresh",
                    "Refreshing dashboard data...",
                    "Dashboard data refreshed successfully",
                    "Failed to refresh dashboard data",
                ),
                Arc::clone(&ctx.status),
            ),
            analysis: SimulatedAction::new(
                "analysis",
                ActionMessages::new(
                    "analysis",
                    "Running system analysis...",
                    "System analysis completed. Report generated.",
                    "System analysis failed",
                ),
                Arc::clone(&ctx.status),
            ),
            refresh_delay: actions.refresh_delay(),
            analysis_delay: actions.analysis_delay(),
        })
    }

    pub fn stats(&self) -> SystemStats {
        *self.stats.borrow()
    }

    pub fn watch_stats(&self) -> watch::Receiver<SystemStats> {
        self.stats.subscribe()
    }

    pub fn data(&self) -> DashboardData {
        self.data.read().clone()
    }

    /// Regenerate every chart after the refresh delay.
    pub fn run_refresh(&self) -> TriggerOutcome {
        let rng = Arc::clone(&self.rng);
        let data = Arc::clone(&self.data);
        self.refresh.trigger(
            &self.scope,
            self.refresh_delay,
            move || {
                *data.write() = dashboard_data(&mut **rng.lock());
                Ok(())
            },
            |_| {},
        )
    }

    pub fn refresh(&self) -> &SimulatedAction<()> {
        &self.refresh
    }

    /// Simulated system analysis. Produces nothing but its status messages.
    pub fn run_analysis(&self) -> TriggerOutcome {
        self.analysis
            .trigger(&self.scope, self.analysis_delay, || Ok(()), |_| {})
    }

    pub fn analysis(&self) -> &SimulatedAction<()> {
        &self.analysis
    }

    pub fn is_mounted(&self) -> bool {
        self.scope.is_active()
    }

    pub fn teardown(&self) {
        self.scope.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FareSightConfig;
    use crate::status::{SilentStatus, StatusChannel};
    use faresight_types::{ActionStatus, StatusLevel};

    async fn settle() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    fn context() -> ViewContext {
        ViewContext::new(FareSightConfig::default(), Arc::new(SilentStatus))
    }

    #[tokio::test(start_paused = true)]
    async fn test_stats_tick_on_interval() {
        let view = DashboardView::mount(&context()).unwrap();
        assert_eq!(view.stats(), SystemStats::default());

        tokio::time::advance(Duration::from_millis(4999)).await;
        settle().await;
        assert_eq!(view.stats(), SystemStats::default());

        tokio::time::advance(Duration::from_millis(1)).await;
        settle().await;
        let first = view.stats();
        assert!((150..170).contains(&first.active_routes));
        assert!((285.0..335.0).contains(&first.avg_price));

        let mut previous = first.total_searches;
        for _ in 0..5 {
            tokio::time::advance(Duration::from_millis(5000)).await;
            settle().await;
            let stats = view.stats();
            assert!(stats.total_searches >= previous);
            previous = stats.total_searches;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_teardown_freezes_stats() {
        let view = DashboardView::mount(&context()).unwrap();
        tokio::time::advance(Duration::from_millis(5000)).await;
        settle().await;
        let frozen = view.stats();

        view.teardown();
        assert!(!view.is_mounted());
        tokio::time::advance(Duration::from_secs(30)).await;
        settle().await;
        assert_eq!(view.stats(), frozen);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_replaces_charts() {
        let channel = StatusChannel::new(16);
        let mut rx = channel.subscribe();
        let ctx = ViewContext::new(FareSightConfig::default(), Arc::new(channel.clone()));
        let view = DashboardView::mount(&ctx).unwrap();
        let before = view.data();
        assert_eq!(before.prices.len(), 24);

        assert_eq!(view.run_refresh(), TriggerOutcome::Started);
        assert_eq!(view.run_refresh(), TriggerOutcome::Ignored);

        tokio::time::advance(Duration::from_millis(1499)).await;
        settle().await;
        assert_eq!(view.refresh().status(), ActionStatus::Running);
        assert_eq!(view.data(), before);

        assert_eq!(view.refresh().finished().await, ActionStatus::Succeeded);
        assert_ne!(view.data(), before);

        let started = rx.try_recv().unwrap();
        assert_eq!(started.level, StatusLevel::Loading);
        let done = rx.try_recv().unwrap();
        assert_eq!(done.level, StatusLevel::Success);
        assert_eq!(done.text, "Dashboard data refreshed successfully");
    }

    #[tokio::test(start_paused = true)]
    async fn test_analysis_reports_after_delay() {
        let channel = StatusChannel::new(16);
        let mut rx = channel.subscribe();
        let ctx = ViewContext::new(FareSightConfig::default(), Arc::new(channel.clone()));
        let view = DashboardView::mount(&ctx).unwrap();

        assert_eq!(view.run_analysis(), TriggerOutcome::Started);
        tokio::time::advance(Duration::from_millis(1999)).await;
        settle().await;
        assert_eq!(view.analysis().status(), ActionStatus::Running);

        tokio::time::advance(Duration::from_millis(1)).await;
        settle().await;
        assert_eq!(view.analysis().status(), ActionStatus::Succeeded);

        let texts: Vec<String> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|m| m.text)
            .collect();
        assert_eq!(
            texts.last().map(String::as_str),
            Some("System analysis completed. Report generated.")
        );
    }

    #[tokio::test]
    async fn test_zero_stats_interval_rejected() {
        let mut config = FareSightConfig::default();
        config.ticker.stats_interval_ms = 0;
        let ctx = ViewContext::new(config, Arc::new(SilentStatus));
        assert!(matches!(
            DashboardView::mount(&ctx),
            Err(EngineError::InvalidInterval)
        ));
    }
}
