//! Price prediction and demand forecast commands

use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use clap::Args;
use faresight_engine::views::{DemandForecastView, PricePredictionView};
use faresight_types::{ForecastPoint, PredictionRequest};
use serde::Serialize;
use tabled::Tabled;

use super::Session;
use crate::output::{print_info, print_output, print_single, print_success, OutputFormat};

/// Arguments of `faresight predict`
#[derive(Args)]
pub struct PredictArgs {
    /// Origin airport code
    #[arg(long, default_value = "SFO")]
    pub origin: String,

    /// Destination airport code
    #[arg(long, default_value = "JFK")]
    pub destination: String,

    /// Departure date (YYYY-MM-DD)
    #[arg(long)]
    pub departure: Option<NaiveDate>,

    /// Return date (YYYY-MM-DD)
    #[arg(long = "return")]
    pub return_date: Option<NaiveDate>,

    /// Number of passengers
    #[arg(long, default_value_t = 1)]
    pub passengers: u32,

    /// Number of stops
    #[arg(long, default_value_t = 0)]
    pub stops: u32,

    /// Carrier code
    #[arg(long, default_value = "AA")]
    pub airline: String,
}

/// Arguments of `faresight forecast`
#[derive(Args)]
pub struct ForecastArgs {
    /// Number of days to forecast
    #[arg(long, default_value_t = 7, value_parser = clap::value_parser!(u16).range(1..=366))]
    pub days: u16,

    /// First forecast day (YYYY-MM-DD), today by default
    #[arg(long)]
    pub start: Option<NaiveDate>,
}

#[derive(Tabled, Serialize)]
struct FactorRow {
    #[tabled(rename = "Factor")]
    name: String,
    #[tabled(rename = "Impact")]
    impact: String,
    #[tabled(rename = "Value")]
    value: String,
}

#[derive(Tabled, Serialize)]
struct ForecastRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Predicted")]
    predicted: String,
    #[tabled(rename = "Actual")]
    actual: String,
    #[tabled(rename = "Confidence")]
    confidence: String,
}

impl From<&ForecastPoint> for ForecastRow {
    fn from(p: &ForecastPoint) -> Self {
        Self {
            date: p.date.format("%Y-%m-%d").to_string(),
            predicted: format!("{:.0}", p.predicted),
            actual: p.actual.map(|a| format!("{:.0}", a)).unwrap_or_else(|| "-".to_string()),
            confidence: format!("{:.1}%", p.confidence),
        }
    }
}

/// Execute the predict command
pub async fn predict(args: PredictArgs, session: &mut Session) -> anyhow::Result<()> {
    let view = PricePredictionView::mount(&session.ctx);
    let request = PredictionRequest {
        origin: args.origin,
        destination: args.destination,
        departure_date: args.departure,
        return_date: args.return_date,
        passengers: args.passengers,
        stops: args.stops,
        airline: args.airline,
        ..PredictionRequest::default()
    };

    let started = view.predict(request);
    session.flush_status();
    started?;

    view.prediction().finished().await;
    session.flush_status();

    let prediction = view
        .latest()
        .ok_or_else(|| anyhow::anyhow!("prediction produced no result"))?;

    match session.format {
        OutputFormat::Json => print_single(&prediction)?,
        OutputFormat::Table => {
            print_success(&format!("Predicted price: ${:.2}", prediction.price));
            print_info(&format!(
                "Range: ${:.2} - ${:.2} ({:.1}% confidence)",
                prediction.range_min, prediction.range_max, prediction.confidence_pct
            ));
            let factors = prediction
                .factors
                .iter()
                .map(|f| FactorRow {
                    name: f.name.clone(),
                    impact: f.impact.clone(),
                    value: f.value.clone(),
                })
                .collect();
            print_output::<FactorRow>(factors, OutputFormat::Table)?;
            for tip in &prediction.recommendations {
                println!("  - {}", tip);
            }
        }
    }

    view.teardown();
    Ok(())
}

/// Execute the forecast command
pub async fn forecast(args: ForecastArgs, session: &mut Session) -> anyhow::Result<()> {
    let view = DemandForecastView::mount(&session.ctx);
    let start = args.start.unwrap_or_else(|| Utc::now().date_naive());
    let end = forecast_end(start, args.days)?;

    view.run_forecast(start, end);
    view.forecast().finished().await;
    session.flush_status();

    let series = view.series();
    match session.format {
        OutputFormat::Json => print_single(&series)?,
        OutputFormat::Table => print_output(
            series.iter().map(ForecastRow::from).collect(),
            OutputFormat::Table,
        )?,
    }

    view.teardown();
    Ok(())
}

/// Last day of a `days`-long forecast starting at `start`.
fn forecast_end(start: NaiveDate, days: u16) -> anyhow::Result<NaiveDate> {
    start
        .checked_add_signed(ChronoDuration::days(i64::from(days) - 1))
        .ok_or_else(|| anyhow::anyhow!("forecast of {} days from {} is out of range", days, start))
}
