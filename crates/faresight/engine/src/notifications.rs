//! Notification store.
//!
//! Records are kept most-recent-first. The store owns the id counter, so an
//! id is never handed out twice even after its record is removed or evicted.

use std::collections::vec_deque;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use faresight_types::{NewNotification, NotificationId, NotificationKind, NotificationRecord};
use parking_lot::RwLock;
use tracing::debug;

/// Default number of notifications kept before the oldest is evicted.
pub const DEFAULT_NOTIFICATION_CAPACITY: usize = 500;

/// Notification store shared between views.
pub type SharedNotifications = Arc<RwLock<NotificationStore>>;

/// Which notifications a listing shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotificationFilter {
    #[default]
    All,
    Unread,
    Kind(NotificationKind),
}

impl NotificationFilter {
    pub fn matches(&self, record: &NotificationRecord) -> bool {
        match self {
            Self::All => true,
            Self::Unread => !record.read,
            Self::Kind(kind) => record.kind == *kind,
        }
    }

    /// Parse `all`, `unread` or a notification kind name.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Some(Self::All),
            "unread" => Some(Self::Unread),
            other => NotificationKind::parse(other).map(Self::Kind),
        }
    }
}

impl fmt::Display for NotificationFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Unread => write!(f, "unread"),
            Self::Kind(kind) => write!(f, "{}", kind),
        }
    }
}

/// Lazy view over the store for one filter.
///
/// Cloning restarts from the current position, so a clone taken before
/// iterating walks the full listing again.
#[derive(Clone)]
pub struct FilteredNotifications<'a> {
    inner: vec_deque::Iter<'a, NotificationRecord>,
    filter: NotificationFilter,
}

impl<'a> Iterator for FilteredNotifications<'a> {
    type Item = &'a NotificationRecord;

    fn next(&mut self) -> Option<Self::Item> {
        let filter = self.filter;
        self.inner.by_ref().find(|r| filter.matches(r))
    }
}

/// Ordered, bounded collection of notifications.
#[derive(Debug, Clone)]
pub struct NotificationStore {
    records: VecDeque<NotificationRecord>,
    next_id: NotificationId,
    capacity: usize,
    evicted: u64,
}

impl NotificationStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: VecDeque::new(),
            next_id: NotificationId::from_raw(1),
            capacity: capacity.max(1),
            evicted: 0,
        }
    }

    /// Store seeded with the dashboard's sample notifications.
    pub fn with_defaults(capacity: usize) -> Self {
        let mut store = Self::new(capacity);
        let now = Utc::now();
        // Oldest first, so the newest ends up at the front.
        let seeds = [
            NewNotification::success(
                "Report Generated",
                "Monthly market analysis report is ready for download.",
            )
            .created_at(now - ChronoDuration::days(1))
            .already_read(),
            NewNotification::info(
                "System Maintenance",
                "Scheduled maintenance window at 02:00 AM UTC.",
            )
            .created_at(now - ChronoDuration::days(1) + ChronoDuration::minutes(1))
            .already_read(),
            NewNotification::error(
                "API Connection Failed",
                "Connection to Sabre API failed. Retrying in 5 minutes.",
            )
            .created_at(now - ChronoDuration::hours(4))
            .already_read(),
            NewNotification::info(
                "Data Batch Processed",
                "New batch of 1.2M records processed successfully.",
            )
            .created_at(now - ChronoDuration::hours(2))
            .already_read(),
            NewNotification::success(
                "Model Accuracy Improved",
                "Prediction model accuracy has improved to 89.2% after latest training.",
            )
            .created_at(now - ChronoDuration::hours(1)),
            NewNotification::warning(
                "Price Spike Detected",
                "Significant price increase detected on SFO-JFK route.",
            )
            .created_at(now - ChronoDuration::minutes(5)),
        ];
        for seed in seeds {
            store.add(seed);
        }
        store
    }

    pub fn into_shared(self) -> SharedNotifications {
        Arc::new(RwLock::new(self))
    }

    /// Insert at the front and return the new id.
    pub fn add(&mut self, new: NewNotification) -> NotificationId {
        let id = self.next_id;
        self.next_id = id.next();
        debug_assert!(self.get(id).is_none(), "notification id {} reused", id);

        self.records.push_front(NotificationRecord {
            id,
            kind: new.kind,
            title: new.title,
            message: new.message,
            created_at: new.created_at.unwrap_or_else(Utc::now),
            read: new.read,
        });

        while self.records.len() > self.capacity {
            if let Some(oldest) = self.records.pop_back() {
                self.evicted += 1;
                debug!(id = %oldest.id, "Evicted oldest notification");
            }
        }
        id
    }

    pub fn get(&self, id: NotificationId) -> Option<&NotificationRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Mark one notification read. Unknown ids are ignored.
    pub fn mark_read(&mut self, id: NotificationId) {
        if let Some(record) = self.records.iter_mut().find(|r| r.id == id) {
            record.read = true;
        }
    }

    pub fn mark_all_read(&mut self) {
        for record in &mut self.records {
            record.read = true;
        }
    }

    /// Remove a notification. Returns whether anything was removed.
    pub fn remove(&mut self, id: NotificationId) -> bool {
        match self.records.iter().position(|r| r.id == id) {
            Some(index) => {
                self.records.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn filter(&self, filter: NotificationFilter) -> FilteredNotifications<'_> {
        FilteredNotifications {
            inner: self.records.iter(),
            filter,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &NotificationRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn unread_count(&self) -> usize {
        self.records.iter().filter(|r| !r.read).count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Records dropped by the capacity bound so far.
    pub fn evicted(&self) -> u64 {
        self.evicted
    }
}

impl Default for NotificationStore {
    fn default() -> Self {
        Self::new(DEFAULT_NOTIFICATION_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_prepends_unread() {
        let mut store = NotificationStore::default();
        let a = store.add(NewNotification::info("a", "first"));
        let b = store.add(NewNotification::info("b", "second"));

        let ids: Vec<_> = store.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![b, a]);
        assert_eq!(store.unread_count(), 2);
    }

    #[test]
    fn test_unread_filter_keeps_order() {
        let mut store = NotificationStore::default();
        let first = store.add(NewNotification::warning("1", ""));
        let second = store.add(NewNotification::error("2", ""));
        let third = store.add(NewNotification::success("3", ""));

        store.mark_read(second);
        let unread: Vec<_> = store.filter(NotificationFilter::Unread).map(|r| r.id).collect();
        assert_eq!(unread, vec![third, first]);
    }

    #[test]
    fn test_filter_is_restartable() {
        let store = NotificationStore::with_defaults(10);
        let listing = store.filter(NotificationFilter::Kind(NotificationKind::Info));
        assert_eq!(listing.clone().count(), 2);
        assert_eq!(listing.count(), 2);
    }

    #[test]
    fn test_missing_ids_are_noops() {
        let mut store = NotificationStore::default();
        store.add(NewNotification::info("a", ""));
        store.mark_read(NotificationId::from_raw(99));
        assert!(!store.remove(NotificationId::from_raw(99)));
        assert_eq!(store.len(), 1);
        assert_eq!(store.unread_count(), 1);
    }

    #[test]
    fn test_ids_not_reused_after_remove() {
        let mut store = NotificationStore::default();
        let a = store.add(NewNotification::info("a", ""));
        assert!(store.remove(a));
        let b = store.add(NewNotification::info("b", ""));
        assert_ne!(a, b);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut store = NotificationStore::new(2);
        let a = store.add(NewNotification::info("a", ""));
        let b = store.add(NewNotification::info("b", ""));
        let c = store.add(NewNotification::info("c", ""));

        assert_eq!(store.len(), 2);
        assert!(store.get(a).is_none());
        assert!(store.get(b).is_some() && store.get(c).is_some());
        assert_eq!(store.evicted(), 1);
    }

    #[test]
    fn test_defaults() {
        let store = NotificationStore::with_defaults(DEFAULT_NOTIFICATION_CAPACITY);
        assert_eq!(store.len(), 6);
        assert_eq!(store.unread_count(), 2);
        let newest = store.iter().next().unwrap();
        assert_eq!(newest.title, "Price Spike Detected");
        assert_eq!(newest.kind, NotificationKind::Warning);
    }

    #[test]
    fn test_filter_parse() {
        assert_eq!(NotificationFilter::parse("Unread"), Some(NotificationFilter::Unread));
        assert_eq!(
            NotificationFilter::parse("error"),
            Some(NotificationFilter::Kind(NotificationKind::Error))
        );
        assert_eq!(NotificationFilter::parse("bogus"), None);
    }
}
