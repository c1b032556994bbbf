//! Bounded random metric generation.
//!
//! Pure functions that turn draws from a [`RandomSource`] into plausible
//! values: the random walk behind every ticking metric, plus the fare,
//! demand, health and severity numbers the dashboard presents as model
//! output. None of these functions keep state or fail, except for the fare
//! prediction which validates its form input first.

use chrono::{Duration as ChronoDuration, NaiveDate};
use faresight_types::{
    AnomalySeverity, DailyDemand, DashboardData, ForecastPoint, HourlyPrice, Metric,
    PredictionFactor, PredictionRequest, PricePrediction, RouteStats, RouteVolume, SystemStats,
};

use crate::error::ValidationError;
use crate::random::RandomSource;

/// Base fare before route and stop adjustments.
pub const BASE_FARE: f64 = 250.0;

/// Spread of the random fare component.
pub const FARE_SPREAD: f64 = 100.0;

/// Discount applied per stop.
pub const STOP_DISCOUNT: f64 = 30.0;

/// Longest forecast range generated in one run.
pub const MAX_FORECAST_DAYS: i64 = 366;

/// Observed demand reported for the first forecast day.
pub const FIRST_DAY_ACTUAL: f64 = 1350.0;

/// Uniform draw in `[lo, hi)`.
pub fn uniform<R: RandomSource + ?Sized>(rng: &mut R, lo: f64, hi: f64) -> f64 {
    lo + rng.next_float() * (hi - lo)
}

/// Pick an index in `0..len`. `len` must be non-zero.
pub fn pick_index<R: RandomSource + ?Sized>(rng: &mut R, len: usize) -> usize {
    debug_assert!(len > 0);
    ((rng.next_float() * len as f64) as usize).min(len.saturating_sub(1))
}

/// One random-walk step: `clamp(current + uniform(-max_step, max_step), min, max)`.
pub fn next_value<R: RandomSource + ?Sized>(
    current: f64,
    min: f64,
    max: f64,
    max_step: f64,
    rng: &mut R,
) -> f64 {
    let step = uniform(rng, -max_step, max_step);
    (current + step).max(min).min(max)
}

/// Advance a metric by one random-walk step.
pub fn step_metric<R: RandomSource + ?Sized>(metric: &mut Metric, rng: &mut R) {
    metric.value = next_value(metric.value, metric.min, metric.max, metric.step_range, rng);
    debug_assert!(metric.is_within_bounds(), "metric {} left its bounds", metric.name);
}

/// Health after a successful sync: `min(100, health + floor(r * 5))`.
pub fn health_bump<R: RandomSource + ?Sized>(health: u8, rng: &mut R) -> u8 {
    let bump = (rng.next_float() * 5.0).floor() as u8;
    health.saturating_add(bump).min(100)
}

/// Severity bucket for a signed percentage deviation.
pub fn severity_for_deviation(deviation_pct: f64) -> AnomalySeverity {
    let magnitude = deviation_pct.abs();
    if magnitude >= 150.0 {
        AnomalySeverity::Critical
    } else if magnitude >= 75.0 {
        AnomalySeverity::High
    } else if magnitude >= 40.0 {
        AnomalySeverity::Medium
    } else {
        AnomalySeverity::Low
    }
}

/// Reject prediction forms that cannot be priced.
pub fn validate_prediction_request(request: &PredictionRequest) -> Result<(), ValidationError> {
    if request.origin.trim().is_empty() {
        return Err(ValidationError::MissingField("origin"));
    }
    if request.destination.trim().is_empty() {
        return Err(ValidationError::MissingField("destination"));
    }
    if request.origin.trim().eq_ignore_ascii_case(request.destination.trim()) {
        return Err(ValidationError::InvalidField {
            field: "destination",
            reason: "must differ from origin".to_string(),
        });
    }
    if request.passengers == 0 {
        return Err(ValidationError::InvalidField {
            field: "passengers",
            reason: "at least one passenger is required".to_string(),
        });
    }
    if let (Some(departure), Some(ret)) = (request.departure_date, request.return_date) {
        if ret < departure {
            return Err(ValidationError::InvalidField {
                field: "return_date",
                reason: "must not be before the departure date".to_string(),
            });
        }
    }
    Ok(())
}

/// Simulated fare prediction.
///
/// `(BASE_FARE + r * FARE_SPREAD - stops * STOP_DISCOUNT) * passengers`,
/// floored at zero, with an 85-95% confidence and a ±10% range.
pub fn price_prediction<R: RandomSource + ?Sized>(
    request: &PredictionRequest,
    rng: &mut R,
) -> Result<PricePrediction, ValidationError> {
    validate_prediction_request(request)?;

    let per_passenger = BASE_FARE + rng.next_float() * FARE_SPREAD
        - f64::from(request.stops) * STOP_DISCOUNT;
    let price = round_cents((per_passenger * f64::from(request.passengers)).max(0.0));
    let confidence_pct = round_tenths(uniform(rng, 85.0, 95.0));

    Ok(PricePrediction {
        price,
        confidence_pct,
        range_min: round_cents(price * 0.9),
        range_max: round_cents(price * 1.1),
        factors: vec![
            factor("Route Popularity", "High", "+$45"),
            factor("Days Until Departure", "Medium", "+$22"),
            factor("Seasonal Demand", "Low", "+$8"),
            factor("Competitor Pricing", "Medium", "-$15"),
        ],
        recommendations: vec![
            "Book 2-3 weeks in advance for best prices".to_string(),
            "Consider flying on Tuesday or Wednesday".to_string(),
            "Direct flights are 15% more expensive".to_string(),
        ],
    })
}

/// One forecast point per day of the inclusive range `start..=end`.
///
/// A reversed range is swapped rather than rejected, and the range is capped
/// at [`MAX_FORECAST_DAYS`].
pub fn demand_forecast<R: RandomSource + ?Sized>(
    start: NaiveDate,
    end: NaiveDate,
    rng: &mut R,
) -> Vec<ForecastPoint> {
    let (start, end) = if end < start { (end, start) } else { (start, end) };
    let days = ((end - start).num_days() + 1).min(MAX_FORECAST_DAYS);

    (0..days)
        .map(|offset| ForecastPoint {
            date: start + ChronoDuration::days(offset),
            predicted: uniform(rng, 1200.0, 1600.0),
            actual: (offset == 0).then_some(FIRST_DAY_ACTUAL),
            confidence: uniform(rng, 85.0, 95.0),
        })
        .collect()
}

/// Next app-wide stats. Searches only ever grow; the rest are redrawn.
pub fn next_system_stats<R: RandomSource + ?Sized>(prev: &SystemStats, rng: &mut R) -> SystemStats {
    SystemStats {
        total_searches: prev.total_searches + draw_count(rng, 10),
        avg_price: uniform(rng, 285.0, 335.0),
        active_routes: 150 + draw_count(rng, 20) as u32,
        model_accuracy: uniform(rng, 0.85, 0.95),
    }
}

/// Searches and bookings floors per weekday, Monday first.
const WEEKDAY_DEMAND: [(&str, f64, f64); 7] = [
    ("Mon", 1200.0, 450.0),
    ("Tue", 1100.0, 420.0),
    ("Wed", 1300.0, 480.0),
    ("Thu", 1400.0, 520.0),
    ("Fri", 1800.0, 680.0),
    ("Sat", 2100.0, 820.0),
    ("Sun", 1900.0, 750.0),
];

/// Dashboard top routes with their volume floors.
const TOP_ROUTES: [(&str, u64); 5] = [
    ("SFO-JFK", 2500),
    ("LAX-ORD", 2100),
    ("DFW-ATL", 1800),
    ("SEA-BOS", 1500),
    ("MIA-DEN", 1200),
];

/// Market analytics routes: searches, bookings and fare floors.
const MARKET_ROUTES: [(&str, u64, u64, u64); 5] = [
    ("SFO-JFK", 12_500, 4_200, 385),
    ("LAX-ORD", 10_800, 3_650, 295),
    ("DFW-ATL", 9_200, 3_100, 245),
    ("SEA-BOS", 7_500, 2_400, 425),
    ("MIA-DEN", 6_800, 2_150, 315),
];

/// Fresh dashboard charts: 24 hourly prices, a week of demand, top routes.
pub fn dashboard_data<R: RandomSource + ?Sized>(rng: &mut R) -> DashboardData {
    let prices = (0..24)
        .map(|hour| HourlyPrice {
            hour: format!("{}:00", hour),
            avg_price: uniform(rng, 250.0, 350.0),
            predicted: uniform(rng, 240.0, 350.0),
        })
        .collect();

    let demand = WEEKDAY_DEMAND
        .iter()
        .map(|&(day, searches, bookings)| DailyDemand {
            day: day.to_string(),
            searches: uniform(rng, searches, searches + 200.0),
            bookings: uniform(rng, bookings, bookings + 100.0),
        })
        .collect();

    let top_routes = TOP_ROUTES
        .iter()
        .map(|&(route, floor)| RouteVolume {
            route: route.to_string(),
            volume: floor + draw_count(rng, 500),
        })
        .collect();

    DashboardData {
        prices,
        demand,
        top_routes,
    }
}

/// Popular routes for the market analytics report.
pub fn popular_routes<R: RandomSource + ?Sized>(rng: &mut R) -> Vec<RouteStats> {
    MARKET_ROUTES
        .iter()
        .map(|&(route, searches, bookings, price)| RouteStats {
            route: route.to_string(),
            searches: searches + draw_count(rng, 2000),
            bookings: bookings + draw_count(rng, 500),
            avg_price: price + draw_count(rng, 50),
        })
        .collect()
}

/// `floor(r * n)`
fn draw_count<R: RandomSource + ?Sized>(rng: &mut R, n: u64) -> u64 {
    ((rng.next_float() * n as f64).floor() as u64).min(n.saturating_sub(1))
}

fn factor(name: &str, impact: &str, value: &str) -> PredictionFactor {
    PredictionFactor {
        name: name.to_string(),
        impact: impact.to_string(),
        value: value.to_string(),
    }
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn round_tenths(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
