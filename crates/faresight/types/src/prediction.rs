//! Simulated model outputs: fare predictions and demand forecasts

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Cabin requested in a prediction form. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CabinClass {
    #[default]
    Economy,
    PremiumEconomy,
    Business,
    First,
}

/// Input of a fare prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    /// Origin airport code, e.g. `SFO`.
    pub origin: String,
    /// Destination airport code, e.g. `JFK`.
    pub destination: String,
    pub departure_date: Option<NaiveDate>,
    pub return_date: Option<NaiveDate>,
    pub passengers: u32,
    pub stops: u32,
    /// Carrier code, e.g. `AA`.
    pub airline: String,
    #[serde(default)]
    pub cabin: CabinClass,
}

impl Default for PredictionRequest {
    fn default() -> Self {
        Self {
            origin: "SFO".to_string(),
            destination: "JFK".to_string(),
            departure_date: None,
            return_date: None,
            passengers: 1,
            stops: 0,
            airline: "AA".to_string(),
            cabin: CabinClass::Economy,
        }
    }
}

/// One line of the "price factors" breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionFactor {
    pub name: String,
    pub impact: String,
    pub value: String,
}

/// A simulated fare prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePrediction {
    /// Total price for all passengers.
    pub price: f64,
    /// Confidence in percent, 85 to 95.
    pub confidence_pct: f64,
    pub range_min: f64,
    pub range_max: f64,
    pub factors: Vec<PredictionFactor>,
    pub recommendations: Vec<String>,
}

/// One day of a demand forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub predicted: f64,
    /// Observed demand, only known for the first day.
    pub actual: Option<f64>,
    /// Confidence in percent.
    pub confidence: f64,
}
