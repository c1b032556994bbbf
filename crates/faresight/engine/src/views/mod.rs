//! Per-view state objects.
//!
//! Each view owns a [`ViewScope`](crate::scope::ViewScope) plus the engine
//! services it drives, and borrows the shared stores from a [`ViewContext`].
//! Dropping a view, or calling its `teardown`, cancels everything it started.

mod anomaly_detection;
mod dashboard;
mod data_sources;
mod demand_forecast;
mod market_analytics;
mod price_prediction;
mod system_health;

pub use anomaly_detection::{AnomalyDetectionView, DetectionHistoryEntry, DETECTION_LOG_PREFIX};
pub use dashboard::DashboardView;
pub use data_sources::DataSourcesView;
pub use demand_forecast::DemandForecastView;
pub use market_analytics::{DateRange, MarketAnalyticsView};
pub use price_prediction::PricePredictionView;
pub use system_health::{ServiceState, ServiceStatus, SystemHealthView};

use std::sync::Arc;

use crate::anomalies::{AnomalyStore, SharedAnomalies};
use crate::config::FareSightConfig;
use crate::notifications::{NotificationStore, SharedNotifications};
use crate::random::{shared, source_from_seed, SharedRandom};
use crate::status::StatusSink;

/// Services and stores shared by every view of one session.
#[derive(Clone)]
pub struct ViewContext {
    pub config: Arc<FareSightConfig>,
    pub status: Arc<dyn StatusSink>,
    pub notifications: SharedNotifications,
    pub anomalies: SharedAnomalies,
}

impl ViewContext {
    /// Fresh stores sized and seeded from `config`.
    pub fn new(config: FareSightConfig, status: Arc<dyn StatusSink>) -> Self {
        let stores = &config.stores;
        let (notifications, anomalies) = if stores.seed_samples {
            (
                NotificationStore::with_defaults(stores.notification_capacity),
                AnomalyStore::with_defaults(stores.anomaly_capacity),
            )
        } else {
            (
                NotificationStore::new(stores.notification_capacity),
                AnomalyStore::new(stores.anomaly_capacity),
            )
        };
        Self {
            notifications: notifications.into_shared(),
            anomalies: anomalies.into_shared(),
            config: Arc::new(config),
            status,
        }
    }

    /// Random source for one view.
    ///
    /// With a configured seed every view gets its own stream derived from
    /// the seed and the view name, so views do not perturb each other.
    pub fn random_for(&self, view: &str) -> SharedRandom {
        let seed = self.config.random.seed.map(|seed| seed ^ fnv1a(view));
        shared(source_from_seed(seed))
    }
}

impl std::fmt::Debug for ViewContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewContext")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn fnv1a(s: &str) -> u64 {
    s.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, b| {
        (hash ^ u64::from(b)).wrapping_mul(0x0100_0000_01b3)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RandomConfig;
    use crate::random::RandomSource;
    use crate::status::SilentStatus;

    #[test]
    fn test_context_seeds_stores() {
        let ctx = ViewContext::new(FareSightConfig::default(), Arc::new(SilentStatus));
        assert_eq!(ctx.notifications.read().len(), 6);
        assert_eq!(ctx.anomalies.read().len(), 4);

        let mut config = FareSightConfig::default();
        config.stores.seed_samples = false;
        let ctx = ViewContext::new(config, Arc::new(SilentStatus));
        assert!(ctx.notifications.read().is_empty());
    }

    #[test]
    fn test_seeded_views_are_reproducible_and_distinct() {
        let config = FareSightConfig {
            random: RandomConfig { seed: Some(9) },
            ..FareSightConfig::default()
        };
        let ctx = ViewContext::new(config, Arc::new(SilentStatus));

        let a = ctx.random_for("system-health").lock().next_float();
        let b = ctx.random_for("system-health").lock().next_float();
        let c = ctx.random_for("demand-forecast").lock().next_float();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
