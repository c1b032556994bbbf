//! Anomaly detection and export commands

use std::path::PathBuf;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Args, ValueEnum};
use colored::*;
use faresight_engine::views::AnomalyDetectionView;
use faresight_engine::{CsvExport, ExportFile};
use faresight_types::{AnomalyId, AnomalyRecord, AnomalySeverity, AnomalyStatus};
use serde::Serialize;
use tabled::Tabled;

use super::analytics::market_view;
use super::Session;
use crate::output::{print_info, print_output, print_single, print_success, OutputFormat};

/// Arguments of `faresight detect`
#[derive(Args)]
pub struct DetectArgs {
    /// Number of detection runs
    #[arg(long, default_value_t = 1)]
    pub runs: u32,

    /// Mark an anomaly resolved before listing
    #[arg(long, value_name = "ID")]
    pub resolve: Option<u64>,
}

/// What `faresight export` writes
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ExportKind {
    /// Detection history log
    DetectionLog,
    /// Anomaly list
    Anomalies,
    /// Notification list
    Notifications,
    /// Market analytics routes report
    MarketAnalysis,
}

/// Arguments of `faresight export`
#[derive(Args)]
pub struct ExportArgs {
    /// Directory the CSV file is written to
    #[arg(long, default_value = ".")]
    pub out: PathBuf,

    /// What to export
    #[arg(long, value_enum, default_value_t = ExportKind::DetectionLog)]
    pub kind: ExportKind,

    /// Report period start for `market-analysis` (YYYY-MM-DD)
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// Report period end for `market-analysis` (YYYY-MM-DD)
    #[arg(long)]
    pub end: Option<NaiveDate>,
}

#[derive(Tabled, Serialize)]
struct AnomalyRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Route")]
    route: String,
    #[tabled(rename = "Type")]
    category: String,
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Observed")]
    observed: String,
    #[tabled(rename = "Baseline")]
    baseline: String,
    #[tabled(rename = "Deviation")]
    deviation: String,
    #[tabled(rename = "Status")]
    status: String,
}

impl From<&AnomalyRecord> for AnomalyRow {
    fn from(r: &AnomalyRecord) -> Self {
        Self {
            id: r.id.value(),
            route: r.route.clone(),
            category: r.category.clone(),
            severity: colorize_severity(r.severity).to_string(),
            observed: format!("{:.2}", r.observed_value),
            baseline: format!("{:.2}", r.baseline_value),
            deviation: r.deviation_label(),
            status: r.status.to_string(),
        }
    }
}

/// Execute the detect command
pub async fn detect(args: DetectArgs, session: &mut Session) -> anyhow::Result<()> {
    let view = AnomalyDetectionView::mount(&session.ctx);

    if let Some(id) = args.resolve {
        view.set_status(AnomalyId::from_raw(id), AnomalyStatus::Resolved)?;
    }

    for _ in 0..args.runs {
        view.run_detection();
        view.detection().finished().await;
        session.flush_status();
    }

    let anomalies = view.anomalies();
    match session.format {
        OutputFormat::Json => print_single(&anomalies)?,
        OutputFormat::Table => {
            print_output(
                anomalies.iter().map(AnomalyRow::from).collect(),
                OutputFormat::Table,
            )?;
            let distribution = session
                .ctx
                .anomalies
                .read()
                .severity_distribution()
                .iter()
                .map(|(severity, count)| format!("{}: {}", severity, count))
                .collect::<Vec<_>>()
                .join(", ");
            print_info(&format!("Severity distribution: {}", distribution));
        }
    }

    view.teardown();
    Ok(())
}

/// Execute the export command
pub fn export(args: ExportArgs, session: &mut Session) -> anyhow::Result<()> {
    let today = Utc::now().date_naive();
    let file: ExportFile = match args.kind {
        ExportKind::DetectionLog => {
            let view = AnomalyDetectionView::mount(&session.ctx);
            let file = view.export_log();
            session.flush_status();
            file?
        }
        ExportKind::Anomalies => {
            CsvExport::from_records(session.ctx.anomalies.read().iter())?.into_file("anomalies", today)
        }
        ExportKind::Notifications => CsvExport::from_records(session.ctx.notifications.read().iter())?
            .into_file("notifications", today),
        ExportKind::MarketAnalysis => {
            let view = market_view(session, args.start, args.end);
            let file = view.export_report();
            session.flush_status();
            file?
        }
    };

    std::fs::create_dir_all(&args.out)
        .with_context(|| format!("creating {}", args.out.display()))?;
    let path = args.out.join(&file.name);
    std::fs::write(&path, &file.contents)
        .with_context(|| format!("writing {}", path.display()))?;

    print_success(&format!("Wrote {}", path.display()));
    Ok(())
}

fn colorize_severity(severity: AnomalySeverity) -> ColoredString {
    let label = severity.to_string();
    match severity {
        AnomalySeverity::Critical => label.red().bold(),
        AnomalySeverity::High => label.red(),
        AnomalySeverity::Medium => label.yellow(),
        AnomalySeverity::Low => label.dimmed(),
    }
}
