//! Error types for the FareSight engine.

use faresight_types::{AnomalyId, MetricError};
use thiserror::Error;

/// Errors raised by engine services.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A metric definition broke the bounds invariant.
    #[error("invalid metric: {0}")]
    InvalidMetric(#[from] MetricError),

    /// Two metrics registered under the same name.
    #[error("duplicate metric name: {0}")]
    DuplicateMetric(String),

    /// A tick engine needs at least one metric.
    #[error("tick engine needs at least one metric")]
    NoMetrics,

    /// Tick interval must be non-zero.
    #[error("tick interval must be greater than zero")]
    InvalidInterval,

    /// Tick engine already running.
    #[error("tick engine {0} is already running")]
    AlreadyRunning(String),

    /// The owning view was torn down.
    #[error("view scope {0} is closed")]
    ScopeClosed(String),

    /// Anomaly not found in the store.
    #[error("anomaly not found: {0}")]
    AnomalyNotFound(AnomalyId),

    /// User input rejected.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Export aborted.
    #[error(transparent)]
    Export(#[from] ExportError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<config::ConfigError> for EngineError {
    fn from(e: config::ConfigError) -> Self {
        EngineError::Config(e.to_string())
    }
}

/// Form-level input errors. Surfaced to the user, never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is blank.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// A field holds an unusable value.
    #[error("{field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

/// Export failures. An aborted export produces no output at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExportError {
    /// Header row is empty.
    #[error("export has no columns")]
    NoColumns,

    /// A row does not line up with the header.
    #[error("row {row} has {found} fields, expected {expected}")]
    WidthMismatch {
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let e = EngineError::AnomalyNotFound(AnomalyId::from_raw(9));
        assert!(e.to_string().contains("anomaly:9"));

        let e = EngineError::AlreadyRunning("system-health".into());
        assert!(e.to_string().contains("system-health"));

        let e = ExportError::WidthMismatch {
            row: 2,
            expected: 4,
            found: 3,
        };
        assert_eq!(e.to_string(), "row 2 has 3 fields, expected 4");
    }

    #[test]
    fn validation_errors_pass_through() {
        let e: EngineError = ValidationError::MissingField("source name").into();
        assert_eq!(e.to_string(), "source name is required");
    }

    #[test]
    fn metric_error_conversion() {
        let e: EngineError = MetricError::EmptyName.into();
        assert!(matches!(e, EngineError::InvalidMetric(_)));
    }
}
