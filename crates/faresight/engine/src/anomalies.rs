//! Anomaly store and the synthesizer behind simulated detection runs.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use faresight_types::{AnomalyId, AnomalyRecord, AnomalySeverity, AnomalyStatus, NewAnomaly};
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::error::{EngineError, EngineResult};
use crate::generator::{pick_index, severity_for_deviation, uniform};
use crate::random::RandomSource;

/// Default number of anomalies kept before the oldest is evicted.
pub const DEFAULT_ANOMALY_CAPACITY: usize = 1000;

/// Anomaly store shared between views.
pub type SharedAnomalies = Arc<RwLock<AnomalyStore>>;

/// Ordered, bounded collection of anomalies, most recent first.
#[derive(Debug, Clone)]
pub struct AnomalyStore {
    records: VecDeque<AnomalyRecord>,
    next_id: AnomalyId,
    capacity: usize,
    evicted: u64,
}

impl AnomalyStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: VecDeque::new(),
            next_id: AnomalyId::from_raw(1),
            capacity: capacity.max(1),
            evicted: 0,
        }
    }

    /// Store seeded with the dashboard's sample anomalies.
    pub fn with_defaults(capacity: usize) -> Self {
        let mut store = Self::new(capacity);
        let now = Utc::now();
        let seeds = [
            NewAnomaly::new("SEA-BOS", "Booking Anomaly", AnomalySeverity::Medium, 850.0, 420.0)
                .with_status(AnomalyStatus::Monitoring)
                .detected_at(now - ChronoDuration::hours(8)),
            NewAnomaly::new("DFW-ATL", "Price Drop", AnomalySeverity::Low, 145.0, 245.0)
                .with_status(AnomalyStatus::Resolved)
                .detected_at(now - ChronoDuration::hours(6)),
            NewAnomaly::new("LAX-ORD", "Demand Surge", AnomalySeverity::Medium, 2500.0, 1200.0)
                .with_status(AnomalyStatus::Monitoring)
                .detected_at(now - ChronoDuration::hours(4)),
            NewAnomaly::new("SFO-JFK", "Price Spike", AnomalySeverity::High, 685.0, 385.0)
                .detected_at(now - ChronoDuration::hours(2)),
        ];
        for seed in seeds {
            store.record(seed);
        }
        store
    }

    pub fn into_shared(self) -> SharedAnomalies {
        Arc::new(RwLock::new(self))
    }

    /// Insert at the front and return the new id.
    pub fn record(&mut self, new: NewAnomaly) -> AnomalyId {
        let id = self.next_id;
        self.next_id = id.next();

        let deviation_pct = new.deviation_pct();
        self.records.push_front(AnomalyRecord {
            id,
            route: new.route,
            category: new.category,
            severity: new.severity,
            observed_value: new.observed_value,
            baseline_value: new.baseline_value,
            deviation_pct,
            detected_at: new.detected_at.unwrap_or_else(Utc::now),
            status: new.status,
        });

        while self.records.len() > self.capacity {
            if let Some(oldest) = self.records.pop_back() {
                self.evicted += 1;
                debug!(id = %oldest.id, "Evicted oldest anomaly");
            }
        }
        id
    }

    pub fn get(&self, id: AnomalyId) -> Option<&AnomalyRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Move an anomaly through the resolution workflow.
    pub fn set_status(&mut self, id: AnomalyId, status: AnomalyStatus) -> EngineResult<()> {
        let record = self
            .records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(EngineError::AnomalyNotFound(id))?;
        if record.status != status {
            info!(id = %id, from = %record.status, to = %status, "Anomaly status changed");
            record.status = status;
        }
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &AnomalyRecord> {
        self.records.iter()
    }

    pub fn filter_status(&self, status: AnomalyStatus) -> impl Iterator<Item = &AnomalyRecord> {
        self.records.iter().filter(move |r| r.status == status)
    }

    /// Count per severity, most severe first, zero counts included.
    pub fn severity_distribution(&self) -> Vec<(AnomalySeverity, usize)> {
        AnomalySeverity::DESCENDING
            .iter()
            .map(|&severity| {
                let count = self.records.iter().filter(|r| r.severity == severity).count();
                (severity, count)
            })
            .collect()
    }

    pub fn active_count(&self) -> usize {
        self.filter_status(AnomalyStatus::Active).count()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn evicted(&self) -> u64 {
        self.evicted
    }
}

impl Default for AnomalyStore {
    fn default() -> Self {
        Self::new(DEFAULT_ANOMALY_CAPACITY)
    }
}

const ROUTES: [&str; 8] = [
    "SFO-JFK", "LAX-ORD", "DFW-ATL", "SEA-BOS", "MIA-LHR", "ORD-DEN", "JFK-CDG", "ATL-LAX",
];

const CATEGORIES: [&str; 5] = [
    "Price Spike",
    "Price Drop",
    "Demand Surge",
    "Booking Anomaly",
    "Unusual Booking Pattern",
];

/// Produces plausible anomalies for simulated detection runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnomalySynthesizer;

impl AnomalySynthesizer {
    /// One active anomaly, detected now.
    ///
    /// Baseline is `40 + r * 460`; the deviation magnitude is
    /// `20 + r * 180` percent. Price drops deviate downwards, everything
    /// else upwards.
    pub fn synthesize<R: RandomSource + ?Sized>(&self, rng: &mut R) -> NewAnomaly {
        let route = ROUTES[pick_index(rng, ROUTES.len())];
        let category = CATEGORIES[pick_index(rng, CATEGORIES.len())];
        let baseline = round2(uniform(rng, 40.0, 500.0));
        let magnitude = uniform(rng, 20.0, 200.0);
        let deviation = if category == "Price Drop" {
            -magnitude.min(90.0)
        } else {
            magnitude
        };
        let observed = round2(baseline * (1.0 + deviation / 100.0));

        NewAnomaly::new(
            route,
            category,
            severity_for_deviation(deviation),
            observed,
            baseline,
        )
        .detected_at(Utc::now())
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::{ScriptedSource, SeededSource};

    #[test]
    fn test_defaults() {
        let store = AnomalyStore::with_defaults(DEFAULT_ANOMALY_CAPACITY);
        assert_eq!(store.len(), 4);
        assert_eq!(store.active_count(), 1);
        let newest = store.iter().next().unwrap();
        assert_eq!(newest.route, "SFO-JFK");
        assert_eq!(newest.deviation_label(), "+78%");
    }

    #[test]
    fn test_set_status() {
        let mut store = AnomalyStore::default();
        let id = store.record(NewAnomaly::new("SFO-JFK", "Price Spike", AnomalySeverity::High, 685.0, 385.0));
        store.set_status(id, AnomalyStatus::Resolved).unwrap();
        assert_eq!(store.get(id).unwrap().status, AnomalyStatus::Resolved);
        assert_eq!(store.active_count(), 0);

        let missing = store.set_status(AnomalyId::from_raw(404), AnomalyStatus::Active);
        assert!(matches!(missing, Err(EngineError::AnomalyNotFound(_))));
    }

    #[test]
    fn test_severity_distribution() {
        let store = AnomalyStore::with_defaults(10);
        let dist = store.severity_distribution();
        assert_eq!(
            dist,
            vec![
                (AnomalySeverity::Critical, 0),
                (AnomalySeverity::High, 1),
                (AnomalySeverity::Medium, 2),
                (AnomalySeverity::Low, 1),
            ]
        );
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut store = AnomalyStore::new(3);
        let first = store.record(NewAnomaly::new("A-B", "Price Spike", AnomalySeverity::Low, 1.0, 1.0));
        for _ in 0..3 {
            store.record(NewAnomaly::new("A-B", "Price Spike", AnomalySeverity::Low, 1.0, 1.0));
        }
        assert_eq!(store.len(), 3);
        assert!(store.get(first).is_none());
        assert_eq!(store.evicted(), 1);
    }

    #[test]
    fn test_synthesized_anomaly_consistent() {
        let mut rng = SeededSource::new(11);
        for _ in 0..200 {
            let anomaly = AnomalySynthesizer.synthesize(&mut rng);
            assert!(ROUTES.contains(&anomaly.route.as_str()));
            assert!(anomaly.baseline_value >= 40.0 && anomaly.baseline_value <= 500.0);
            assert_eq!(anomaly.status, AnomalyStatus::Active);
            let pct = anomaly.deviation_pct().abs();
            assert!(pct >= 19.0, "deviation {pct} too small");
        }
    }

    #[test]
    fn test_synthesized_price_drop_goes_down() {
        // route 0, category 1 (Price Drop), baseline, magnitude
        let mut rng = ScriptedSource::new([0.0, 0.2, 0.5, 0.1]);
        let anomaly = AnomalySynthesizer.synthesize(&mut rng);
        assert_eq!(anomaly.category, "Price Drop");
        assert!(anomaly.observed_value < anomaly.baseline_value);
        assert_eq!(anomaly.severity, AnomalySeverity::Low);
    }
}
