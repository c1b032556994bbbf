//! # FareSight Types
//!
//! Plain data model shared by the FareSight simulation engine and anything
//! that renders its state.
//!
//! Nothing in this crate schedules work or draws random numbers. The engine
//! crate owns behavior; this crate owns shapes:
//!
//! - [`Metric`] and [`MetricSnapshot`]: bounded numeric metrics and the
//!   immutable view published once per tick
//! - [`NotificationRecord`]: alert feed entries with read state
//! - [`AnomalyRecord`]: simulated detection output
//! - [`DataSource`]: ingestion source cards with sync status
//! - [`PricePrediction`] / [`ForecastPoint`]: simulated model outputs
//! - [`SystemStats`], [`DashboardData`], [`RouteStats`]: dashboard and
//!   market analytics figures
//! - [`StatusMessage`] / [`ActionStatus`]: transient user-facing messages and
//!   the lifecycle of a simulated action
//!
//! Identifiers are monotonic `u64` newtypes. Stores hand them out from a
//! counter so an id is never reused, even after its record is deleted.

pub mod analytics;
pub mod anomaly;
pub mod ids;
pub mod metric;
pub mod notification;
pub mod prediction;
pub mod source;
pub mod status;

pub use analytics::{
    DailyDemand, DashboardData, HourlyPrice, RouteStats, RouteVolume, SystemStats,
};
pub use anomaly::{AnomalyRecord, AnomalySeverity, AnomalyStatus, NewAnomaly};
pub use ids::{AnomalyId, DataSourceId, NotificationId, SubscriptionId};
pub use metric::{Metric, MetricError, MetricSnapshot};
pub use notification::{NewNotification, NotificationKind, NotificationRecord};
pub use prediction::{
    CabinClass, ForecastPoint, PredictionFactor, PredictionRequest, PricePrediction,
};
pub use source::{DataSource, DataSourceKind, DataSourceStatus};
pub use status::{ActionStatus, StatusLevel, StatusMessage};
