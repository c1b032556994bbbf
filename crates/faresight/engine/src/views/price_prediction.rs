//! Price prediction view.

use std::sync::Arc;
use std::time::Duration;

use faresight_types::{PredictionRequest, PricePrediction, StatusMessage};
use tracing::debug;

use super::ViewContext;
use crate::action::{ActionFailure, ActionMessages, SimulatedAction, TriggerOutcome};
use crate::error::ValidationError;
use crate::generator::{price_prediction, validate_prediction_request};
use crate::random::SharedRandom;
use crate::scope::ViewScope;
use crate::status::StatusSink;

const VIEW_NAME: &str = "price-prediction";

/// Fare prediction form and its latest result.
pub struct PricePredictionView {
    scope: ViewScope,
    status: Arc<dyn StatusSink>,
    rng: SharedRandom,
    prediction: SimulatedAction<PricePrediction>,
    delay: Duration,
}

impl PricePredictionView {
    pub fn mount(ctx: &ViewContext) -> Self {
        Self {
            scope: ViewScope::new(VIEW_NAME),
            status: Arc::clone(&ctx.status),
            rng: ctx.random_for(VIEW_NAME),
            prediction: SimulatedAction::new(
                "prediction",
                ActionMessages::new(
                    "prediction",
                    "Generating price prediction...",
                    "Price prediction generated successfully!",
                    "Price prediction failed",
                ),
                Arc::clone(&ctx.status),
            ),
            delay: ctx.config.actions.prediction_delay(),
        }
    }

    /// Validate `request` and start a prediction.
    ///
    /// Invalid input is reported as an error message and returned; the
    /// action is not started.
    pub fn predict(&self, request: PredictionRequest) -> Result<TriggerOutcome, ValidationError> {
        if let Err(e) = validate_prediction_request(&request) {
            debug!(error = %e, "Prediction request rejected");
            self.status.emit(StatusMessage::error("prediction", e.to_string()));
            return Err(e);
        }

        let rng = Arc::clone(&self.rng);
        Ok(self.prediction.trigger(
            &self.scope,
            self.delay,
            move || {
                price_prediction(&request, &mut **rng.lock())
                    .map_err(|e| ActionFailure::new(e.to_string()))
            },
            |_| {},
        ))
    }

    pub fn prediction(&self) -> &SimulatedAction<PricePrediction> {
        &self.prediction
    }

    /// Latest successful prediction.
    pub fn latest(&self) -> Option<PricePrediction> {
        self.prediction.result()
    }

    pub fn is_mounted(&self) -> bool {
        self.scope.is_active()
    }

    pub fn teardown(&self) {
        self.scope.teardown();
    }
}
