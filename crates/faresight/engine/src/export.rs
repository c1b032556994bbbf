//! CSV export of ordered records.
//!
//! An export is built fully in memory and only rendered once every row has
//! been accepted, so a width mismatch aborts it without partial output.

use chrono::NaiveDate;
use faresight_types::{AnomalyRecord, NotificationRecord, RouteStats};

use crate::error::ExportError;

/// A record type that can be written as one CSV row.
pub trait Exportable {
    /// Header row.
    fn columns() -> &'static [&'static str];

    /// Fields in column order.
    fn row(&self) -> Vec<String>;
}

impl Exportable for AnomalyRecord {
    fn columns() -> &'static [&'static str] {
        &[
            "ID",
            "Route",
            "Type",
            "Severity",
            "Observed",
            "Baseline",
            "Deviation",
            "Detected At",
            "Status",
        ]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.id.value().to_string(),
            self.route.clone(),
            self.category.clone(),
            self.severity.to_string(),
            format!("{:.2}", self.observed_value),
            format!("{:.2}", self.baseline_value),
            self.deviation_label(),
            self.detected_at.to_rfc3339(),
            self.status.to_string(),
        ]
    }
}

impl Exportable for NotificationRecord {
    fn columns() -> &'static [&'static str] {
        &["ID", "Type", "Title", "Message", "Created At", "Read"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.id.value().to_string(),
            self.kind.to_string(),
            self.title.clone(),
            self.message.clone(),
            self.created_at.to_rfc3339(),
            self.read.to_string(),
        ]
    }
}

impl Exportable for RouteStats {
    fn columns() -> &'static [&'static str] {
        &["Route", "Searches", "Bookings", "Avg Price"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.route.clone(),
            self.searches.to_string(),
            self.bookings.to_string(),
            self.avg_price.to_string(),
        ]
    }
}

/// A rendered export ready to be written somewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub name: String,
    pub contents: String,
}

/// An in-memory CSV table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvExport {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl CsvExport {
    pub fn new<I, S>(columns: I) -> Result<Self, ExportError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        if columns.is_empty() {
            return Err(ExportError::NoColumns);
        }
        Ok(Self {
            columns,
            rows: Vec::new(),
        })
    }

    /// Export every record, in iteration order.
    pub fn from_records<'a, E, I>(records: I) -> Result<Self, ExportError>
    where
        E: Exportable + 'a,
        I: IntoIterator<Item = &'a E>,
    {
        let mut export = Self::new(E::columns().iter().copied())?;
        for record in records {
            export.push_row(record.row())?;
        }
        Ok(export)
    }

    /// Append a row. Rejected when its width differs from the header.
    pub fn push_row(&mut self, fields: Vec<String>) -> Result<(), ExportError> {
        if fields.len() != self.columns.len() {
            return Err(ExportError::WidthMismatch {
                row: self.rows.len() + 1,
                expected: self.columns.len(),
                found: fields.len(),
            });
        }
        self.rows.push(fields);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Header line, then one line per row, joined by `\n`.
    pub fn render(&self) -> String {
        std::iter::once(&self.columns)
            .chain(self.rows.iter())
            .map(|fields| {
                fields
                    .iter()
                    .map(|f| escape_field(f))
                    .collect::<Vec<_>>()
                    .join(",")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn into_file(self, prefix: &str, date: NaiveDate) -> ExportFile {
        ExportFile {
            name: export_file_name(prefix, date),
            contents: self.render(),
        }
    }
}

/// `{prefix}_{YYYY-MM-DD}.csv`
pub fn export_file_name(prefix: &str, date: NaiveDate) -> String {
    format!("{}_{}.csv", prefix, date.format("%Y-%m-%d"))
}

/// `market_analysis_{start}_{end}.csv`
pub fn market_report_file_name(start: NaiveDate, end: NaiveDate) -> String {
    format!(
        "market_analysis_{}_{}.csv",
        start.format("%Y-%m-%d"),
        end.format("%Y-%m-%d")
    )
}

fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
