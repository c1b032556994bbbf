//! Data sources view: ingestion source cards, sync-all and add-source.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use faresight_types::{DataSource, DataSourceId, DataSourceKind, DataSourceStatus, StatusMessage};
use parking_lot::{Mutex, RwLock};
use tracing::info;

use super::ViewContext;
use crate::action::{ActionMessages, SimulatedAction, TriggerOutcome};
use crate::error::ValidationError;
use crate::generator::health_bump;
use crate::random::SharedRandom;
use crate::scope::ViewScope;
use crate::status::StatusSink;

const VIEW_NAME: &str = "data-sources";

/// Ingestion sources and their sync status.
pub struct DataSourcesView {
    scope: ViewScope,
    sources: Arc<RwLock<Vec<DataSource>>>,
    next_id: Mutex<DataSourceId>,
    status: Arc<dyn StatusSink>,
    rng: SharedRandom,
    sync: SimulatedAction<usize>,
    delay: Duration,
}

impl DataSourcesView {
    pub fn mount(ctx: &ViewContext) -> Self {
        let now = Utc::now();
        let seeds = [
            ("Amadeus GDS", DataSourceKind::ApiIntegration, DataSourceStatus::Active, Some(now - ChronoDuration::minutes(2)), 1_200_000, 98),
            ("Sabre API", DataSourceKind::ApiIntegration, DataSourceStatus::Active, Some(now - ChronoDuration::minutes(5)), 850_000, 95),
            ("Historical Fares", DataSourceKind::Database, DataSourceStatus::Syncing, None, 45_000_000, 100),
            ("Competitor Scraper", DataSourceKind::WebScraper, DataSourceStatus::Warning, Some(now - ChronoDuration::hours(1)), 250_000, 75),
        ];

        let mut next_id = DataSourceId::from_raw(1);
        let sources = seeds
            .into_iter()
            .map(|(name, kind, status, last_synced_at, records, health)| {
                let id = next_id;
                next_id = id.next();
                DataSource {
                    id,
                    name: name.to_string(),
                    kind,
                    status,
                    last_synced_at,
                    records,
                    health,
                }
            })
            .collect();

        Self {
            scope: ViewScope::new(VIEW_NAME),
            sources: Arc::new(RwLock::new(sources)),
            next_id: Mutex::new(next_id),
            status: Arc::clone(&ctx.status),
            rng: ctx.random_for(VIEW_NAME),
            sync: SimulatedAction::new(
                "sync",
                ActionMessages::new(
                    "sync",
                    "Syncing all data sources...",
                    "All sources synced successfully",
                    "Sync failed",
                ),
                Arc::clone(&ctx.status),
            ),
            delay: ctx.config.actions.sync_delay(),
        }
    }

    pub fn sources(&self) -> Vec<DataSource> {
        self.sources.read().clone()
    }

    pub fn sync(&self) -> &SimulatedAction<usize> {
        &self.sync
    }

    /// Sync every source.
    ///
    /// All sources show `Syncing` right away; after the delay they turn
    /// `Active` with a small health bump.
    pub fn sync_all(&self) -> TriggerOutcome {
        let sources = Arc::clone(&self.sources);
        let rng = Arc::clone(&self.rng);

        let outcome = self.sync.trigger(
            &self.scope,
            self.delay,
            move || {
                let now = Utc::now();
                let mut rng = rng.lock();
                let mut sources = sources.write();
                for source in sources.iter_mut() {
                    source.status = DataSourceStatus::Active;
                    source.last_synced_at = Some(now);
                    source.health = health_bump(source.health, &mut *rng);
                }
                Ok(sources.len())
            },
            |outcome| {
                if let Ok(count) = outcome {
                    info!(sources = *count, "Data sources synced");
                }
            },
        );

        if outcome == TriggerOutcome::Started {
            for source in self.sources.write().iter_mut() {
                source.status = DataSourceStatus::Syncing;
                source.last_synced_at = None;
            }
        }
        outcome
    }

    /// Add a new source. A blank name is rejected with an error message.
    pub fn add_source(&self, name: &str, kind: DataSourceKind) -> Result<DataSourceId, ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            self.status
                .emit(StatusMessage::error("source", "Please enter a source name"));
            return Err(ValidationError::MissingField("source name"));
        }

        let id = {
            let mut next = self.next_id.lock();
            let id = *next;
            *next = id.next();
            id
        };
        self.sources.write().push(DataSource {
            id,
            name: name.to_string(),
            kind,
            status: DataSourceStatus::Active,
            last_synced_at: Some(Utc::now()),
            records: 0,
            health: 100,
        });
        info!(id = %id, name, kind = %kind, "Data source added");
        self.status.emit(StatusMessage::success(
            "source",
            "New data source added successfully",
        ));
        Ok(id)
    }

    pub fn is_mounted(&self) -> bool {
        self.scope.is_active()
    }

    pub fn teardown(&self) {
        self.scope.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FareSightConfig;
    use crate::status::StatusChannel;
    use faresight_types::{ActionStatus, StatusLevel};

    fn view(channel: &StatusChannel) -> DataSourcesView {
        let ctx = ViewContext::new(FareSightConfig::default(), Arc::new(channel.clone()));
        DataSourcesView::mount(&ctx)
    }

    #[tokio::test(start_paused = true)]
    async fn test_sync_all() {
        let channel = StatusChannel::new(16);
        let view = view(&channel);
        let before: Vec<u8> = view.sources().iter().map(|s| s.health).collect();

        assert_eq!(view.sync_all(), TriggerOutcome::Started);
        assert!(view
            .sources()
            .iter()
            .all(|s| s.status == DataSourceStatus::Syncing));

        assert_eq!(view.sync().finished().await, ActionStatus::Succeeded);
        let after = view.sources();
        assert!(after.iter().all(|s| s.status == DataSourceStatus::Active));
        for (old, source) in before.iter().zip(&after) {
            assert!(source.health >= *old && source.health <= 100);
            assert!(source.health - old <= 4);
            assert!(source.last_synced_at.is_some());
        }
        assert_eq!(view.sync().result(), Some(4));
    }

    #[test]
    fn test_add_source_validation() {
        let channel = StatusChannel::new(16);
        let mut rx = channel.subscribe();
        let view = view(&channel);

        assert_eq!(
            view.add_source("  ", DataSourceKind::Database),
            Err(ValidationError::MissingField("source name"))
        );
        let msg = rx.try_recv().unwrap();
        assert_eq!(msg.level, StatusLevel::Error);
        assert_eq!(msg.text, "Please enter a source name");

        let id = view.add_source("Expedia Feed", DataSourceKind::ApiIntegration).unwrap();
        let sources = view.sources();
        assert_eq!(sources.len(), 5);
        let added = sources.last().unwrap();
        assert_eq!(added.id, id);
        assert_eq!(added.health, 100);
        assert_eq!(added.records, 0);
        assert_eq!(rx.try_recv().unwrap().level, StatusLevel::Success);
    }
}
