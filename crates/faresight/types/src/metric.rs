//! Bounded metrics and the snapshots published by the tick engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reasons a metric definition is rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MetricError {
    /// Metric name is empty.
    #[error("metric name must not be empty")]
    EmptyName,

    /// A bound or the step is NaN or infinite.
    #[error("metric {name}: {field} must be finite")]
    NonFinite { name: String, field: &'static str },

    /// Lower bound above upper bound.
    #[error("metric {name}: min {min} is greater than max {max}")]
    InvertedBounds { name: String, min: f64, max: f64 },

    /// Initial value outside `[min, max]`.
    #[error("metric {name}: value {value} outside [{min}, {max}]")]
    OutOfRange {
        name: String,
        value: f64,
        min: f64,
        max: f64,
    },

    /// Negative step range.
    #[error("metric {name}: step range {step} must not be negative")]
    NegativeStep { name: String, step: f64 },
}

/// A named numeric metric that always stays inside `[min, max]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
    pub value: f64,
    pub min: f64,
    pub max: f64,
    /// Largest absolute change applied by a single tick.
    pub step_range: f64,
}

impl Metric {
    /// Create a metric, rejecting definitions that break the bounds invariant.
    pub fn new(
        name: impl Into<String>,
        value: f64,
        min: f64,
        max: f64,
        step_range: f64,
    ) -> Result<Self, MetricError> {
        let metric = Self {
            name: name.into(),
            value,
            min,
            max,
            step_range,
        };
        metric.validate()?;
        Ok(metric)
    }

    /// Check the bounds invariant.
    ///
    /// Metrics can arrive through deserialization, so consumers validate
    /// before they start mutating them.
    pub fn validate(&self) -> Result<(), MetricError> {
        if self.name.trim().is_empty() {
            return Err(MetricError::EmptyName);
        }
        for (field, v) in [
            ("value", self.value),
            ("min", self.min),
            ("max", self.max),
            ("step_range", self.step_range),
        ] {
            if !v.is_finite() {
                return Err(MetricError::NonFinite {
                    name: self.name.clone(),
                    field,
                });
            }
        }
        if self.min > self.max {
            return Err(MetricError::InvertedBounds {
                name: self.name.clone(),
                min: self.min,
                max: self.max,
            });
        }
        if self.step_range < 0.0 {
            return Err(MetricError::NegativeStep {
                name: self.name.clone(),
                step: self.step_range,
            });
        }
        if !self.is_within_bounds() {
            return Err(MetricError::OutOfRange {
                name: self.name.clone(),
                value: self.value,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }

    /// Whether the current value sits inside `[min, max]`.
    pub fn is_within_bounds(&self) -> bool {
        self.min <= self.value && self.value <= self.max
    }

    /// Clamp `value` into this metric's range.
    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }

    /// Store `value`, clamped into range.
    pub fn set_clamped(&mut self, value: f64) {
        self.value = self.clamp(value);
    }
}

/// Immutable set of metric values taken after one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSnapshot {
    /// Tick number, starting at 1 for the first tick. Zero is the seed state.
    pub tick: u64,
    pub taken_at: DateTime<Utc>,
    pub metrics: Vec<Metric>,
}

impl MetricSnapshot {
    pub fn new(tick: u64, metrics: Vec<Metric>) -> Self {
        Self {
            tick,
            taken_at: Utc::now(),
            metrics,
        }
    }

    /// Look up a metric by name.
    pub fn get(&self, name: &str) -> Option<&Metric> {
        self.metrics.iter().find(|m| m.name == name)
    }

    /// Current value of a metric by name.
    pub fn value(&self, name: &str) -> Option<f64> {
        self.get(name).map(|m| m.value)
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_metric() {
        let m = Metric::new("cpu", 45.0, 0.0, 100.0, 5.0).unwrap();
        assert!(m.is_within_bounds());
        assert_eq!(m.clamp(140.0), 100.0);
        assert_eq!(m.clamp(-3.0), 0.0);
    }

    #[test]
    fn test_rejects_out_of_range_value() {
        let err = Metric::new("cpu", 120.0, 0.0, 100.0, 5.0).unwrap_err();
        assert!(matches!(err, MetricError::OutOfRange { .. }));
        assert!(err.to_string().contains("cpu"));
    }

    #[test]
    fn test_rejects_inverted_bounds() {
        let err = Metric::new("memory", 5.0, 10.0, 0.0, 1.0).unwrap_err();
        assert!(matches!(err, MetricError::InvertedBounds { .. }));
    }

    #[test]
    fn test_rejects_non_finite_and_negative_step() {
        assert!(matches!(
            Metric::new("net", f64::NAN, 0.0, 10.0, 1.0),
            Err(MetricError::NonFinite { field: "value", .. })
        ));
        assert!(matches!(
            Metric::new("net", 1.0, 0.0, 10.0, -1.0),
            Err(MetricError::NegativeStep { .. })
        ));
        assert_eq!(
            Metric::new("  ", 1.0, 0.0, 10.0, 1.0),
            Err(MetricError::EmptyName)
        );
    }

    #[test]
    fn test_snapshot_lookup() {
        let snapshot = MetricSnapshot::new(
            3,
            vec![
                Metric::new("cpu", 45.0, 0.0, 100.0, 5.0).unwrap(),
                Metric::new("memory", 62.0, 0.0, 100.0, 2.5).unwrap(),
            ],
        );
        assert_eq!(snapshot.value("memory"), Some(62.0));
        assert!(snapshot.get("disk").is_none());
        assert_eq!(snapshot.len(), 2);
    }
}
