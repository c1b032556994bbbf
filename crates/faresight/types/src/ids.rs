//! Strongly-typed identifiers for FareSight records
//!
//! Ids are plain counters wrapped in newtypes. Whoever owns the collection
//! owns the counter, which is what keeps ids unique for the lifetime of a
//! store.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! counter_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(u64);

        impl $name {
            pub const fn from_raw(raw: u64) -> Self {
                Self(raw)
            }

            pub const fn value(&self) -> u64 {
                self.0
            }

            /// The id following this one.
            pub const fn next(&self) -> Self {
                Self(self.0 + 1)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, ":{}"), self.0)
            }
        }
    };
}

counter_id!(
    /// Identifier of a notification record
    NotificationId,
    "notif"
);

counter_id!(
    /// Identifier of a detected anomaly
    AnomalyId,
    "anomaly"
);

counter_id!(
    /// Identifier of an ingestion source
    DataSourceId,
    "source"
);

counter_id!(
    /// Handle returned when registering a tick subscriber
    SubscriptionId,
    "sub"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_prefixes() {
        assert_eq!(NotificationId::from_raw(7).to_string(), "notif:7");
        assert_eq!(AnomalyId::from_raw(1).to_string(), "anomaly:1");
        assert_eq!(SubscriptionId::from_raw(3).to_string(), "sub:3");
    }

    #[test]
    fn test_next_is_monotonic() {
        let id = DataSourceId::from_raw(41);
        assert_eq!(id.next().value(), 42);
        assert!(id.next() > id);
    }
}
