//! Demand forecast view.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use faresight_types::ForecastPoint;
use parking_lot::RwLock;

use super::ViewContext;
use crate::action::{ActionMessages, SimulatedAction, TriggerOutcome};
use crate::generator::demand_forecast;
use crate::random::SharedRandom;
use crate::scope::ViewScope;

const VIEW_NAME: &str = "demand-forecast";

/// Days covered by the forecast shown on mount.
pub const INITIAL_FORECAST_DAYS: i64 = 7;

/// Daily demand forecast series.
pub struct DemandForecastView {
    scope: ViewScope,
    rng: SharedRandom,
    series: Arc<RwLock<Vec<ForecastPoint>>>,
    forecast: SimulatedAction<usize>,
    delay: Duration,
}

impl DemandForecastView {
    /// Mount with a one-week forecast starting today.
    pub fn mount(ctx: &ViewContext) -> Self {
        let rng = ctx.random_for(VIEW_NAME);
        let today = Utc::now().date_naive();
        let initial = demand_forecast(
            today,
            today + ChronoDuration::days(INITIAL_FORECAST_DAYS - 1),
            &mut **rng.lock(),
        );

        Self {
            scope: ViewScope::new(VIEW_NAME),
            rng,
            series: Arc::new(RwLock::new(initial)),
            forecast: SimulatedAction::new(
                "forecast",
                ActionMessages::new(
                    "forecast",
                    "Generating new forecast...",
                    "New forecast generated successfully",
                    "Forecast generation failed",
                ),
                Arc::clone(&ctx.status),
            ),
            delay: ctx.config.actions.forecast_delay(),
        }
    }

    /// Regenerate the series for `start..=end`.
    pub fn run_forecast(&self, start: NaiveDate, end: NaiveDate) -> TriggerOutcome {
        let rng = Arc::clone(&self.rng);
        let series = Arc::clone(&self.series);
        self.forecast.trigger(
            &self.scope,
            self.delay,
            move || {
                let points = demand_forecast(start, end, &mut **rng.lock());
                let len = points.len();
                *series.write() = points;
                Ok(len)
            },
            |_| {},
        )
    }

    pub fn series(&self) -> Vec<ForecastPoint> {
        self.series.read().clone()
    }

    pub fn forecast(&self) -> &SimulatedAction<usize> {
        &self.forecast
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
    use crate::status::SilentStatus;
    use faresight_types::ActionStatus;

    #[tokio::test(start_paused = true)]
    async fn test_run_forecast_replaces_series() {
        let ctx = ViewContext::new(FareSightConfig::default(), Arc::new(SilentStatus));
        let view = DemandForecastView::mount(&ctx);
        assert_eq!(view.series().len(), 7);

        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 30).unwrap();
        assert_eq!(view.run_forecast(start, end), TriggerOutcome::Started);
        assert_eq!(view.series().len(), 7);

        assert_eq!(view.forecast().finished().await, ActionStatus::Succeeded);
        let series = view.series();
        assert_eq!(series.len(), 30);
        assert_eq!(series[0].date, start);
        assert_eq!(series[0].actual, Some(1350.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_teardown_keeps_old_series() {
        let ctx = ViewContext::new(FareSightConfig::default(), Arc::new(SilentStatus));
        let view = DemandForecastView::mount(&ctx);
        let before = view.series();

        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        view.run_forecast(start, start);
        view.teardown();
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(view.series(), before);
    }
}
