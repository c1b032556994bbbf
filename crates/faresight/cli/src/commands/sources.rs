//! Data source commands

use clap::{Args, ValueEnum};
use faresight_engine::views::DataSourcesView;
use faresight_types::{DataSource, DataSourceKind};
use serde::Serialize;
use tabled::Tabled;

use super::Session;
use crate::output::{print_output, print_single, OutputFormat};

/// Source type accepted on the command line
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SourceKindArg {
    Api,
    Database,
    Scraper,
}

impl From<SourceKindArg> for DataSourceKind {
    fn from(kind: SourceKindArg) -> Self {
        match kind {
            SourceKindArg::Api => DataSourceKind::ApiIntegration,
            SourceKindArg::Database => DataSourceKind::Database,
            SourceKindArg::Scraper => DataSourceKind::WebScraper,
        }
    }
}

/// Arguments of `faresight sync`
#[derive(Args)]
pub struct SyncArgs {
    /// Add a source with this name before syncing
    #[arg(long, value_name = "NAME")]
    pub add: Option<String>,

    /// Type of the added source
    #[arg(long, value_enum, default_value_t = SourceKindArg::Api)]
    pub kind: SourceKindArg,
}

#[derive(Tabled, Serialize)]
struct SourceRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Records")]
    records: u64,
    #[tabled(rename = "Health")]
    health: String,
    #[tabled(rename = "Last Sync")]
    last_sync: String,
}

impl From<&DataSource> for SourceRow {
    fn from(s: &DataSource) -> Self {
        Self {
            id: s.id.value(),
            name: s.name.clone(),
            kind: s.kind.to_string(),
            status: s.status.to_string(),
            records: s.records,
            health: format!("{}%", s.health),
            last_sync: s
                .last_synced_at
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "Syncing...".to_string()),
        }
    }
}

/// Execute the sync command
pub async fn execute(args: SyncArgs, session: &mut Session) -> anyhow::Result<()> {
    let view = DataSourcesView::mount(&session.ctx);

    if let Some(name) = args.add {
        let added = view.add_source(&name, args.kind.into());
        session.flush_status();
        added?;
    }

    view.sync_all();
    view.sync().finished().await;
    session.flush_status();

    let sources = view.sources();
    match session.format {
        OutputFormat::Json => print_single(&sources)?,
        OutputFormat::Table => print_output(
            sources.iter().map(SourceRow::from).collect(),
            OutputFormat::Table,
        )?,
    }

    view.teardown();
    Ok(())
}
