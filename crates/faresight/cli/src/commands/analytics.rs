//! Dashboard and market analytics commands

use chrono::NaiveDate;
use clap::Args;
use colored::*;
use faresight_engine::views::{DashboardView, MarketAnalyticsView};
use faresight_types::{DashboardData, RouteStats, SystemStats};
use serde::Serialize;
use tabled::Tabled;

use super::Session;
use crate::output::{print_info, print_output, print_single, OutputFormat};

/// Arguments of `faresight dashboard`
#[derive(Args)]
pub struct DashboardArgs {
    /// Number of stats updates to wait for
    #[arg(long, default_value_t = 1)]
    pub ticks: u32,

    /// Override the stats interval in milliseconds
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// Refresh the charts before printing
    #[arg(long)]
    pub refresh: bool,

    /// Run a system analysis
    #[arg(long)]
    pub analyze: bool,
}

/// Arguments of `faresight market`
#[derive(Args)]
pub struct MarketArgs {
    /// First day of the period (YYYY-MM-DD), one month ago by default
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// Last day of the period (YYYY-MM-DD), today by default
    #[arg(long)]
    pub end: Option<NaiveDate>,
}

#[derive(Tabled, Serialize)]
struct RouteRow {
    #[tabled(rename = "Route")]
    route: String,
    #[tabled(rename = "Searches")]
    searches: u64,
    #[tabled(rename = "Bookings")]
    bookings: u64,
    #[tabled(rename = "Avg Price")]
    avg_price: String,
    #[tabled(rename = "Conversion")]
    conversion: String,
}

impl From<&RouteStats> for RouteRow {
    fn from(r: &RouteStats) -> Self {
        Self {
            route: r.route.clone(),
            searches: r.searches,
            bookings: r.bookings,
            avg_price: format!("${}", r.avg_price),
            conversion: format!("{:.1}%", r.conversion_pct()),
        }
    }
}

#[derive(Tabled, Serialize)]
struct DemandRow {
    #[tabled(rename = "Day")]
    day: String,
    #[tabled(rename = "Searches")]
    searches: String,
    #[tabled(rename = "Bookings")]
    bookings: String,
}

#[derive(Serialize)]
struct DashboardReport {
    stats: Vec<SystemStats>,
    data: DashboardData,
}

#[derive(Serialize)]
struct MarketReport {
    start: NaiveDate,
    end: NaiveDate,
    routes: Vec<RouteStats>,
}

/// Execute the dashboard command
pub async fn dashboard(args: DashboardArgs, session: &mut Session) -> anyhow::Result<()> {
    let view = DashboardView::mount(&session.ctx)?;

    if args.refresh {
        view.run_refresh();
        view.refresh().finished().await;
        session.flush_status();
    }
    if args.analyze {
        view.run_analysis();
        view.analysis().finished().await;
        session.flush_status();
    }

    let mut updates = view.watch_stats();
    updates.borrow_and_update();
    let mut seen = Vec::new();
    while seen.len() < args.ticks as usize {
        updates.changed().await?;
        let stats = *updates.borrow_and_update();
        if session.is_table() {
            print_stats(&stats);
        }
        seen.push(stats);
    }

    let data = view.data();
    match session.format {
        OutputFormat::Json => print_single(&DashboardReport { stats: seen, data })?,
        OutputFormat::Table => {
            let demand = data
                .demand
                .iter()
                .map(|d| DemandRow {
                    day: d.day.clone(),
                    searches: format!("{:.0}", d.searches),
                    bookings: format!("{:.0}", d.bookings),
                })
                .collect();
            print_output::<DemandRow>(demand, OutputFormat::Table)?;
            let busiest = data
                .top_routes
                .iter()
                .map(|r| format!("{} ({})", r.route, r.volume))
                .collect::<Vec<_>>()
                .join(", ");
            print_info(&format!("Top routes: {}", busiest));
        }
    }

    view.teardown();
    Ok(())
}

/// Execute the market command
pub fn market(args: MarketArgs, session: &mut Session) -> anyhow::Result<()> {
    let view = market_view(session, args.start, args.end);
    let range = view.range();
    let routes = view.routes();

    match session.format {
        OutputFormat::Json => print_single(&MarketReport {
            start: range.start,
            end: range.end,
            routes,
        })?,
        OutputFormat::Table => {
            print_output(routes.iter().map(RouteRow::from).collect(), OutputFormat::Table)?;
            print_info(&format!("Period: {} to {}", range.start, range.end));
        }
    }

    view.teardown();
    Ok(())
}

/// Mount the market view and apply `--start`/`--end` the way the date
/// pickers do: start first, then end.
pub fn market_view(
    session: &Session,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> MarketAnalyticsView {
    let view = MarketAnalyticsView::mount(&session.ctx);
    if let Some(start) = start {
        view.set_start(start);
    }
    if let Some(end) = end {
        view.set_end(end);
    }
    view
}

fn print_stats(stats: &SystemStats) {
    println!(
        "{} {}  {} ${:.2}  {} {}  {} {:.1}%",
        "Searches:".bold(),
        stats.total_searches,
        "Avg price:".bold(),
        stats.avg_price,
        "Routes:".bold(),
        stats.active_routes,
        "Accuracy:".bold(),
        stats.model_accuracy * 100.0
    );
}
