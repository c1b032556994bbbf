//! Configuration for the FareSight engine

use std::time::Duration;

use faresight_types::Metric;
use serde::{Deserialize, Serialize};

use crate::anomalies::DEFAULT_ANOMALY_CAPACITY;
use crate::error::{EngineError, EngineResult};
use crate::notifications::DEFAULT_NOTIFICATION_CAPACITY;

/// Main engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FareSightConfig {
    /// Live metric ticker
    #[serde(default)]
    pub ticker: TickerConfig,

    /// Simulated action delays
    #[serde(default)]
    pub actions: ActionConfig,

    /// Store capacities
    #[serde(default)]
    pub stores: StoreConfig,

    /// Randomness
    #[serde(default)]
    pub random: RandomConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Live metric ticker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickerConfig {
    /// Tick interval in milliseconds
    #[serde(default = "default_tick_interval")]
    pub interval_ms: u64,

    /// Metrics random-walked by the system health view
    #[serde(default = "default_health_metrics")]
    pub metrics: Vec<Metric>,

    /// Interval of the app-wide stats shown on the dashboard
    #[serde(default = "default_stats_interval")]
    pub stats_interval_ms: u64,
}

impl Default for TickerConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_tick_interval(),
            metrics: default_health_metrics(),
            stats_interval_ms: default_stats_interval(),
        }
    }
}

impl TickerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn stats_interval(&self) -> Duration {
        Duration::from_millis(self.stats_interval_ms)
    }
}

/// Delays of the simulated actions, in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionConfig {
    #[serde(default = "default_detection_delay")]
    pub detection_delay_ms: u64,

    #[serde(default = "default_sync_delay")]
    pub sync_delay_ms: u64,

    #[serde(default = "default_prediction_delay")]
    pub prediction_delay_ms: u64,

    #[serde(default = "default_forecast_delay")]
    pub forecast_delay_ms: u64,

    #[serde(default = "default_refresh_delay")]
    pub refresh_delay_ms: u64,

    #[serde(default = "default_analysis_delay")]
    pub analysis_delay_ms: u64,
}

impl Default for ActionConfig {
    fn default() -> Self {
        Self {
            detection_delay_ms: default_detection_delay(),
            sync_delay_ms: default_sync_delay(),
            prediction_delay_ms: default_prediction_delay(),
            forecast_delay_ms: default_forecast_delay(),
            refresh_delay_ms: default_refresh_delay(),
            analysis_delay_ms: default_analysis_delay(),
        }
    }
}

impl ActionConfig {
    pub fn detection_delay(&self) -> Duration {
        Duration::from_millis(self.detection_delay_ms)
    }

    pub fn sync_delay(&self) -> Duration {
        Duration::from_millis(self.sync_delay_ms)
    }

    pub fn prediction_delay(&self) -> Duration {
        Duration::from_millis(self.prediction_delay_ms)
    }

    pub fn forecast_delay(&self) -> Duration {
        Duration::from_millis(self.forecast_delay_ms)
    }

    pub fn refresh_delay(&self) -> Duration {
        Duration::from_millis(self.refresh_delay_ms)
    }

    pub fn analysis_delay(&self) -> Duration {
        Duration::from_millis(self.analysis_delay_ms)
    }
}

/// Store capacity configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Notifications kept before the oldest is evicted
    #[serde(default = "default_notification_capacity")]
    pub notification_capacity: usize,

    /// Anomalies kept before the oldest is evicted
    #[serde(default = "default_anomaly_capacity")]
    pub anomaly_capacity: usize,

    /// Buffered status messages per subscriber
    #[serde(default = "default_status_capacity")]
    pub status_capacity: usize,

    /// Seed the stores with sample records
    #[serde(default = "default_true")]
    pub seed_samples: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            notification_capacity: default_notification_capacity(),
            anomaly_capacity: default_anomaly_capacity(),
            status_capacity: default_status_capacity(),
            seed_samples: true,
        }
    }
}

/// Randomness configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RandomConfig {
    /// Fixed seed for reproducible sessions. Unseeded when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// Default value helpers
fn default_true() -> bool {
    true
}

fn default_tick_interval() -> u64 {
    2000
}

fn default_stats_interval() -> u64 {
    5000
}

fn default_health_metrics() -> Vec<Metric> {
    vec![
        Metric {
            name: "cpu".to_string(),
            value: 45.0,
            min: 0.0,
            max: 100.0,
            step_range: 5.0,
        },
        Metric {
            name: "memory".to_string(),
            value: 62.0,
            min: 0.0,
            max: 100.0,
            step_range: 2.5,
        },
        Metric {
            name: "network".to_string(),
            value: 120.0,
            min: 0.0,
            max: 1000.0,
            step_range: 10.0,
        },
    ]
}

fn default_detection_delay() -> u64 {
    2500
}

fn default_sync_delay() -> u64 {
    3000
}

fn default_prediction_delay() -> u64 {
    1500
}

fn default_forecast_delay() -> u64 {
    2000
}

fn default_refresh_delay() -> u64 {
    1500
}

fn default_analysis_delay() -> u64 {
    2000
}

fn default_notification_capacity() -> usize {
    DEFAULT_NOTIFICATION_CAPACITY
}

fn default_anomaly_capacity() -> usize {
    DEFAULT_ANOMALY_CAPACITY
}

fn default_status_capacity() -> usize {
    64
}

fn default_log_level() -> String {
    "info".to_string()
}

impl FareSightConfig {
    /// Load configuration from defaults, an optional file and the environment.
    ///
    /// Environment variables use the `FARESIGHT` prefix with `__` between
    /// section and key, e.g. `FARESIGHT__RANDOM__SEED=7`.
    pub fn load(path: Option<&str>) -> EngineResult<Self> {
        let mut builder = config::Config::builder();

        // Add default configuration
        builder = builder.add_source(config::Config::try_from(&FareSightConfig::default())?);

        // Add file configuration if provided
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("FARESIGHT")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> EngineResult<()> {
        if self.ticker.interval_ms == 0 || self.ticker.stats_interval_ms == 0 {
            return Err(EngineError::InvalidInterval);
        }
        if self.ticker.metrics.is_empty() {
            return Err(EngineError::NoMetrics);
        }
        for metric in &self.ticker.metrics {
            metric.validate()?;
        }
        if self.stores.notification_capacity == 0 || self.stores.anomaly_capacity == 0 {
            return Err(EngineError::Config(
                "store capacities must be greater than zero".to_string(),
            ));
        }
        if self.stores.status_capacity == 0 {
            return Err(EngineError::Config(
                "status capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FareSightConfig::default();
        assert_eq!(config.ticker.interval_ms, 2000);
        assert_eq!(config.ticker.metrics.len(), 3);
        assert_eq!(config.ticker.stats_interval(), Duration::from_millis(5000));
        assert!(config.random.seed.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_action_defaults() {
        let config = ActionConfig::default();
        assert_eq!(config.detection_delay(), Duration::from_millis(2500));
        assert_eq!(config.sync_delay(), Duration::from_millis(3000));
        assert_eq!(config.prediction_delay(), Duration::from_millis(1500));
        assert_eq!(config.forecast_delay(), Duration::from_millis(2000));
        assert_eq!(config.refresh_delay(), Duration::from_millis(1500));
        assert_eq!(config.analysis_delay(), Duration::from_millis(2000));
    }

    #[test]
    fn test_validate_rejects_empty_metrics() {
        let mut config = FareSightConfig::default();
        config.ticker.metrics.clear();
        assert!(matches!(config.validate(), Err(EngineError::NoMetrics)));
    }

    #[test]
    fn test_validate_rejects_zero_stats_interval() {
        let mut config = FareSightConfig::default();
        config.ticker.stats_interval_ms = 0;
        assert!(matches!(config.validate(), Err(EngineError::InvalidInterval)));
    }

    #[test]
    fn test_store_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.notification_capacity, 500);
        assert_eq!(config.anomaly_capacity, 1000);
        assert!(config.seed_samples);
    }

    #[test]
    fn test_default_metrics_valid() {
        for metric in default_health_metrics() {
            metric.validate().unwrap();
        }
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let mut config = FareSightConfig::default();
        config.stores.anomaly_capacity = 0;
        assert!(matches!(config.validate(), Err(EngineError::Config(_))));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: FareSightConfig =
            serde_json::from_str(r#"{"random": {"seed": 42}, "actions": {"sync_delay_ms": 10}}"#)
                .unwrap();
        assert_eq!(config.random.seed, Some(42));
        assert_eq!(config.actions.sync_delay_ms, 10);
        assert_eq!(config.actions.detection_delay_ms, 2500);
        assert_eq!(config.ticker.interval_ms, 2000);
    }

    #[test]
    fn test_load_without_file() {
        let config = FareSightConfig::load(None).unwrap();
        assert_eq!(config.stores.notification_capacity, 500);
    }
}
