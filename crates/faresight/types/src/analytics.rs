//! Dashboard and market analytics figures

use serde::{Deserialize, Serialize};

/// App-wide headline numbers, refreshed on their own interval.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemStats {
    /// Flight searches since startup. Never decreases.
    pub total_searches: u64,
    pub avg_price: f64,
    pub active_routes: u32,
    /// Model accuracy as a fraction in `[0, 1]`.
    pub model_accuracy: f64,
}

/// Average and predicted fare for one hour of the day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyPrice {
    /// `"{h}:00"`
    pub hour: String,
    pub avg_price: f64,
    pub predicted: f64,
}

/// Searches and bookings for one day of the week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyDemand {
    pub day: String,
    pub searches: f64,
    pub bookings: f64,
}

/// Traffic on one of the busiest routes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteVolume {
    pub route: String,
    pub volume: u64,
}

/// Everything the dashboard charts show.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardData {
    pub prices: Vec<HourlyPrice>,
    pub demand: Vec<DailyDemand>,
    pub top_routes: Vec<RouteVolume>,
}

/// Search, booking and fare figures for one route over a date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteStats {
    pub route: String,
    pub searches: u64,
    pub bookings: u64,
    /// Whole dollars.
    pub avg_price: u64,
}

impl RouteStats {
    /// Bookings per search, as a percentage.
    pub fn conversion_pct(&self) -> f64 {
        if self.searches == 0 {
            return 0.0;
        }
        self.bookings as f64 / self.searches as f64 * 100.0
    }
}
