//! Simulated anomaly detection records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ids::AnomalyId;

/// How serious an anomaly is, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnomalySeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AnomalySeverity {
    /// Most severe first, the order the severity chart uses.
    pub const DESCENDING: [AnomalySeverity; 4] = [
        AnomalySeverity::Critical,
        AnomalySeverity::High,
        AnomalySeverity::Medium,
        AnomalySeverity::Low,
    ];
}

impl fmt::Display for AnomalySeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// Resolution state of an anomaly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnomalyStatus {
    Active,
    Monitoring,
    Resolved,
}

impl fmt::Display for AnomalyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Monitoring => write!(f, "monitoring"),
            Self::Resolved => write!(f, "resolved"),
        }
    }
}

/// A detected anomaly on a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyRecord {
    pub id: AnomalyId,
    /// Route code such as `SFO-JFK`.
    pub route: String,
    /// Free-form category such as "Price Spike".
    pub category: String,
    pub severity: AnomalySeverity,
    pub observed_value: f64,
    pub baseline_value: f64,
    /// Signed percentage change of observed over baseline.
    pub deviation_pct: f64,
    pub detected_at: DateTime<Utc>,
    pub status: AnomalyStatus,
}

impl AnomalyRecord {
    /// Deviation formatted the way the anomaly table shows it, e.g. `+78%`.
    pub fn deviation_label(&self) -> String {
        format!("{:+.0}%", self.deviation_pct)
    }
}

/// Producer-side description of an anomaly; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAnomaly {
    pub route: String,
    pub category: String,
    pub severity: AnomalySeverity,
    pub observed_value: f64,
    pub baseline_value: f64,
    pub detected_at: Option<DateTime<Utc>>,
    pub status: AnomalyStatus,
}

impl NewAnomaly {
    pub fn new(
        route: impl Into<String>,
        category: impl Into<String>,
        severity: AnomalySeverity,
        observed_value: f64,
        baseline_value: f64,
    ) -> Self {
        Self {
            route: route.into(),
            category: category.into(),
            severity,
            observed_value,
            baseline_value,
            detected_at: None,
            status: AnomalyStatus::Active,
        }
    }

    pub fn with_status(mut self, status: AnomalyStatus) -> Self {
        self.status = status;
        self
    }

    pub fn detected_at(mut self, at: DateTime<Utc>) -> Self {
        self.detected_at = Some(at);
        self
    }

    /// Signed percentage deviation of the observed value from the baseline.
    ///
    /// A zero baseline yields zero rather than an infinite deviation.
    pub fn deviation_pct(&self) -> f64 {
        if self.baseline_value == 0.0 {
            return 0.0;
        }
        (self.observed_value - self.baseline_value) / self.baseline_value * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deviation() {
        let a = NewAnomaly::new("SFO-JFK", "Price Spike", AnomalySeverity::High, 685.0, 385.0);
        assert!((a.deviation_pct() - 77.922).abs() < 0.01);

        let drop = NewAnomaly::new("DFW-ATL", "Price Drop", AnomalySeverity::Low, 145.0, 245.0);
        assert!(drop.deviation_pct() < 0.0);

        let zero = NewAnomaly::new("X-Y", "Odd", AnomalySeverity::Low, 5.0, 0.0);
        assert_eq!(zero.deviation_pct(), 0.0);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(AnomalySeverity::Critical > AnomalySeverity::High);
        assert!(AnomalySeverity::Low < AnomalySeverity::Medium);
        assert_eq!(AnomalySeverity::DESCENDING[0], AnomalySeverity::Critical);
    }
}
