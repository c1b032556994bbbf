//! Anomaly detection view: detection runs, resolution and the detection log.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use faresight_types::{AnomalyId, AnomalyRecord, AnomalyStatus, NewNotification, StatusMessage};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::ViewContext;
use crate::action::{ActionFailure, ActionMessages, SimulatedAction, TriggerOutcome};
use crate::anomalies::{AnomalySynthesizer, SharedAnomalies};
use crate::error::{EngineResult, ExportError};
use crate::export::{CsvExport, ExportFile, Exportable};
use crate::notifications::SharedNotifications;
use crate::random::SharedRandom;
use crate::scope::ViewScope;
use crate::status::StatusSink;

const VIEW_NAME: &str = "anomaly-detection";

/// File name prefix of the exported detection log.
pub const DETECTION_LOG_PREFIX: &str = "anomaly_detection_log";

/// One row of the detection history table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionHistoryEntry {
    pub date: NaiveDate,
    pub kind: String,
    pub result: String,
    pub user: String,
}

impl DetectionHistoryEntry {
    pub fn new(date: NaiveDate, kind: &str, result: &str, user: &str) -> Self {
        Self {
            date,
            kind: kind.to_string(),
            result: result.to_string(),
            user: user.to_string(),
        }
    }
}

impl Exportable for DetectionHistoryEntry {
    fn columns() -> &'static [&'static str] {
        &["Date", "Type", "Result", "User"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.date.format("%Y-%m-%d").to_string(),
            self.kind.clone(),
            self.result.clone(),
            self.user.clone(),
        ]
    }
}

fn seed_history() -> Vec<DetectionHistoryEntry> {
    [
        ((2023, 10, 25), "System Scan", "Clean", "System"),
        ((2023, 10, 24), "Manual Detection", "2 Anomalies", "Admin"),
        ((2023, 10, 23), "System Scan", "1 Critical", "System"),
        ((2023, 10, 22), "Rule Update", "Success", "DevOps"),
        ((2023, 10, 21), "System Scan", "Clean", "System"),
    ]
    .into_iter()
    .filter_map(|((y, m, d), kind, result, user)| {
        NaiveDate::from_ymd_opt(y, m, d).map(|date| DetectionHistoryEntry::new(date, kind, result, user))
    })
    .collect()
}

/// Simulated anomaly detection over the shared anomaly store.
pub struct AnomalyDetectionView {
    scope: ViewScope,
    anomalies: SharedAnomalies,
    notifications: SharedNotifications,
    status: Arc<dyn StatusSink>,
    rng: SharedRandom,
    detection: SimulatedAction<AnomalyRecord>,
    history: Arc<RwLock<Vec<DetectionHistoryEntry>>>,
    delay: std::time::Duration,
}

impl AnomalyDetectionView {
    pub fn mount(ctx: &ViewContext) -> Self {
        Self {
            scope: ViewScope::new(VIEW_NAME),
            anomalies: Arc::clone(&ctx.anomalies),
            notifications: Arc::clone(&ctx.notifications),
            status: Arc::clone(&ctx.status),
            rng: ctx.random_for(VIEW_NAME),
            detection: SimulatedAction::new(
                "detection",
                ActionMessages::new(
                    "detection",
                    "Running anomaly detection algorithms...",
                    "Detection complete. 1 new anomaly found.",
                    "Anomaly detection failed",
                ),
                Arc::clone(&ctx.status),
            ),
            history: Arc::new(RwLock::new(seed_history())),
            delay: ctx.config.actions.detection_delay(),
        }
    }

    /// Start a detection run. Finds exactly one new anomaly.
    pub fn run_detection(&self) -> TriggerOutcome {
        let rng = Arc::clone(&self.rng);
        let anomalies = Arc::clone(&self.anomalies);
        let notifications = Arc::clone(&self.notifications);
        let history = Arc::clone(&self.history);

        self.detection.trigger(
            &self.scope,
            self.delay,
            move || {
                let new = AnomalySynthesizer.synthesize(&mut **rng.lock());
                let mut store = anomalies.write();
                let id = store.record(new);
                store
                    .get(id)
                    .cloned()
                    .ok_or_else(|| ActionFailure::new("recorded anomaly was evicted"))
            },
            move |outcome| {
                let Ok(record) = outcome else {
                    return;
                };
                info!(
                    id = %record.id,
                    route = %record.route,
                    severity = %record.severity,
                    "Anomaly detected"
                );
                notifications.write().add(NewNotification::warning(
                    format!("{} Detected", record.category),
                    format!(
                        "{} anomaly detected on {} route ({}).",
                        record.severity,
                        record.route,
                        record.deviation_label()
                    ),
                ));
                history.write().insert(
                    0,
                    DetectionHistoryEntry::new(
                        Utc::now().date_naive(),
                        "Manual Detection",
                        "1 Anomaly",
                        "Admin",
                    ),
                );
            },
        )
    }

    pub fn detection(&self) -> &SimulatedAction<AnomalyRecord> {
        &self.detection
    }

    /// Move an anomaly through the resolution workflow.
    pub fn set_status(&self, id: AnomalyId, status: AnomalyStatus) -> EngineResult<()> {
        self.anomalies.write().set_status(id, status)
    }

    pub fn anomalies(&self) -> Vec<AnomalyRecord> {
        self.anomalies.read().iter().cloned().collect()
    }

    pub fn history(&self) -> Vec<DetectionHistoryEntry> {
        self.history.read().clone()
    }

    /// Export the detection history as `anomaly_detection_log_{date}.csv`.
    pub fn export_log(&self) -> Result<ExportFile, ExportError> {
        let history = self.history.read();
        match CsvExport::from_records(history.iter()) {
            Ok(export) => {
                let file = export.into_file(DETECTION_LOG_PREFIX, Utc::now().date_naive());
                info!(file = %file.name, rows = history.len(), "Detection log exported");
                self.status
                    .emit(StatusMessage::success("export", "Log exported successfully"));
                Ok(file)
            }
            Err(e) => {
                warn!(error = %e, "Detection log export failed");
                self.status
                    .emit(StatusMessage::error("export", "Failed to export log"));
                Err(e)
            }
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.scope.is_active()
    }

    pub fn teardown(&self) {
        self.scope.teardown();
    }
}
