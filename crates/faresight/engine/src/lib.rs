//! # FareSight Engine
//!
//! Simulation engine behind the FareSight pricing analytics dashboard.
//! Every "live" number the dashboard shows is produced here from injectable
//! random sources dressed up as model output.
//!
//! ## Components
//!
//! - [`generator`]: bounded random values (random walk, fares, demand, health)
//! - [`SimulatedAction`]: `idle -> running -> succeeded | failed` over a delay
//! - [`LiveTickEngine`]: recurring random walk of named metrics, published as
//!   atomic [`MetricSnapshot`](faresight_types::MetricSnapshot)s
//! - [`NotificationStore`] and [`AnomalyStore`]: ordered, bounded records
//! - [`ViewScope`]: cancellation of everything a mounted view started
//! - [`CsvExport`]: CSV rendering of ordered records
//! - [`views`]: per-view state objects wiring the above together, from the
//!   dashboard stats ticker to the market analytics report
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use faresight_engine::{FareSightConfig, StatusChannel, ViewContext};
//! use faresight_engine::views::AnomalyDetectionView;
//!
//! # async fn run() {
//! let status = StatusChannel::default();
//! let ctx = ViewContext::new(FareSightConfig::default(), Arc::new(status.clone()));
//! let view = AnomalyDetectionView::mount(&ctx);
//! view.run_detection();
//! view.detection().finished().await;
//! # }
//! ```
//!
//! Everything runs on a single-threaded tokio runtime; timers are the only
//! suspension points.

#![deny(unsafe_code)]

pub mod action;
pub mod anomalies;
pub mod config;
pub mod error;
pub mod export;
pub mod generator;
pub mod notifications;
pub mod random;
pub mod scope;
pub mod status;
pub mod ticker;
pub mod views;

pub use action::{ActionFailure, ActionMessages, ActionState, SimulatedAction, TriggerOutcome};
pub use anomalies::{AnomalyStore, AnomalySynthesizer, SharedAnomalies};
pub use config::FareSightConfig;
pub use error::{EngineError, EngineResult, ExportError, ValidationError};
pub use export::{export_file_name, market_report_file_name, CsvExport, ExportFile, Exportable};
pub use generator::next_value;
pub use notifications::{FilteredNotifications, NotificationFilter, NotificationStore, SharedNotifications};
pub use random::{EntropySource, RandomSource, ScriptedSource, SeededSource, SharedRandom};
pub use scope::{ScopeGuard, ViewScope};
pub use status::{SilentStatus, StatusChannel, StatusSink};
pub use ticker::{LiveTickEngine, SubscriberResult};
pub use views::ViewContext;
