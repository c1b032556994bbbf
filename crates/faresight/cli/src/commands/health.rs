//! System health command

use clap::Args;
use colored::*;
use faresight_engine::views::{ServiceState, ServiceStatus, SystemHealthView};
use faresight_types::MetricSnapshot;
use serde::Serialize;
use tabled::Tabled;

use super::Session;
use crate::output::{print_info, print_output, print_single, OutputFormat};

/// Arguments of `faresight health`
#[derive(Args)]
pub struct HealthArgs {
    /// Number of ticks to watch
    #[arg(long, default_value_t = 3)]
    pub ticks: u32,

    /// Override the tick interval in milliseconds
    #[arg(long)]
    pub interval_ms: Option<u64>,
}

#[derive(Tabled, Serialize)]
struct MetricRow {
    #[tabled(rename = "Metric")]
    name: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Range")]
    range: String,
}

#[derive(Tabled, Serialize)]
struct ServiceRow {
    #[tabled(rename = "Service")]
    name: String,
    #[tabled(rename = "Status")]
    state: String,
    #[tabled(rename = "Latency")]
    latency: String,
}

#[derive(Serialize)]
struct HealthReport<'a> {
    snapshots: Vec<MetricSnapshot>,
    services: &'a [ServiceStatus],
    uptime_pct: f64,
}

/// Execute the health command
pub async fn execute(args: HealthArgs, session: &mut Session) -> anyhow::Result<()> {
    let view = SystemHealthView::mount(&session.ctx)?;
    let mut snapshots = view.ticker().watch_snapshots();
    snapshots.borrow_and_update();

    let mut seen = Vec::new();
    while seen.len() < args.ticks as usize {
        snapshots.changed().await?;
        let Some(snapshot) = snapshots.borrow_and_update().clone() else {
            continue;
        };
        if session.is_table() {
            println!("{}", format!("Tick {}", snapshot.tick).bold());
            print_output(metric_rows(&snapshot), OutputFormat::Table)?;
        }
        seen.push(MetricSnapshot::clone(&snapshot));
    }

    if session.is_table() {
        let services = view
            .services()
            .iter()
            .map(|s| ServiceRow {
                name: s.name.clone(),
                state: colorize_state(s.state).to_string(),
                latency: format!("{}ms", s.latency_ms),
            })
            .collect();
        print_output::<ServiceRow>(services, OutputFormat::Table)?;
        print_info(&format!("System uptime: {:.2}%", view.uptime_pct()));
    } else {
        print_single(&HealthReport {
            snapshots: seen,
            services: view.services(),
            uptime_pct: view.uptime_pct(),
        })?;
    }

    view.teardown();
    Ok(())
}

fn metric_rows(snapshot: &MetricSnapshot) -> Vec<MetricRow> {
    snapshot
        .metrics
        .iter()
        .map(|m| MetricRow {
            name: m.name.clone(),
            value: format!("{:.1}", m.value),
            range: format!("{}..{}", m.min, m.max),
        })
        .collect()
}

fn colorize_state(state: ServiceState) -> ColoredString {
    let label = state.to_string();
    match state {
        ServiceState::Operational => label.green(),
        ServiceState::Degraded => label.yellow(),
        ServiceState::Down => label.red(),
    }
}
