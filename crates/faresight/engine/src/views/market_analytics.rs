//! Market analytics view: popular routes over a date range and their export.

use std::sync::Arc;

use chrono::{Months, NaiveDate, Utc};
use faresight_types::{RouteStats, StatusMessage};
use parking_lot::RwLock;
use tracing::{info, warn};

use super::ViewContext;
use crate::error::ExportError;
use crate::export::{market_report_file_name, CsvExport, ExportFile};
use crate::generator::popular_routes;
use crate::random::SharedRandom;
use crate::scope::ViewScope;
use crate::status::StatusSink;

const VIEW_NAME: &str = "market-analytics";

/// Inclusive reporting period. `start <= end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// One month back from `today`, through `today`.
    pub fn last_month(today: NaiveDate) -> Self {
        Self {
            start: today.checked_sub_months(Months::new(1)).unwrap_or(today),
            end: today,
        }
    }
}

/// Popular routes for a reporting period.
pub struct MarketAnalyticsView {
    scope: ViewScope,
    rng: SharedRandom,
    status: Arc<dyn StatusSink>,
    range: RwLock<DateRange>,
    routes: RwLock<Vec<RouteStats>>,
}

impl MarketAnalyticsView {
    /// Mount covering the last month.
    pub fn mount(ctx: &ViewContext) -> Self {
        Self::mount_with_range(ctx, DateRange::last_month(Utc::now().date_naive()))
    }

    pub fn mount_with_range(ctx: &ViewContext, range: DateRange) -> Self {
        let rng = ctx.random_for(VIEW_NAME);
        let routes = popular_routes(&mut **rng.lock());
        let range = if range.start > range.end {
            DateRange {
                start: range.end,
                end: range.end,
            }
        } else {
            range
        };
        Self {
            scope: ViewScope::new(VIEW_NAME),
            rng,
            status: Arc::clone(&ctx.status),
            range: RwLock::new(range),
            routes: RwLock::new(routes),
        }
    }

    pub fn range(&self) -> DateRange {
        *self.range.read()
    }

    /// Move the start date. An end before it is pushed forward to match.
    pub fn set_start(&self, start: NaiveDate) {
        {
            let mut range = self.range.write();
            range.start = start;
            if start > range.end {
                range.end = start;
            }
        }
        self.regenerate();
    }

    /// Move the end date. A start after it is pulled back to match.
    pub fn set_end(&self, end: NaiveDate) {
        {
            let mut range = self.range.write();
            range.end = end;
            if end < range.start {
                range.start = end;
            }
        }
        self.regenerate();
    }

    pub fn routes(&self) -> Vec<RouteStats> {
        self.routes.read().clone()
    }

    /// Render the routes table as `market_analysis_{start}_{end}.csv`.
    pub fn export_report(&self) -> Result<ExportFile, ExportError> {
        let range = self.range();
        let routes = self.routes.read();
        match CsvExport::from_records(routes.iter()) {
            Ok(export) => {
                let file = ExportFile {
                    name: market_report_file_name(range.start, range.end),
                    contents: export.render(),
                };
                info!(file = %file.name, rows = routes.len(), "Market report exported");
                self.status
                    .emit(StatusMessage::success("export", "Report downloaded successfully"));
                Ok(file)
            }
            Err(e) => {
                warn!(error = %e, "Market report export failed");
                self.status
                    .emit(StatusMessage::error("export", "Failed to export report"));
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

    fn regenerate(&self) {
        if !self.scope.is_active() {
            return;
        }
        let routes = popular_routes(&mut **self.rng.lock());
        *self.routes.write() = routes;
    }
}
