use serde::Serialize;

use super::{
    drive, Applied, ControlError, LoadState, PendingPrediction, Prediction, PredictionScope,
    SliderPage, SliderState, Ticket,
};
use crate::api::DashboardApi;
use crate::logging::log_page_error;
use crate::model::{FeatureValueVector, MultiModelPredictionResult};
use crate::views::{self, ImportanceComparisonRow, PredictionCard, ProbabilityRow, SliderView};

const PAGE: &str = "model_comparison";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonView {
    pub sliders: Vec<SliderView>,
    pub cards: Vec<PredictionCard>,
    pub probabilities: Vec<ProbabilityRow>,
    pub importance: Vec<ImportanceComparisonRow>,
    pub error: Option<String>,
}

/// All-models prediction page.
#[derive(Debug, Clone, Default)]
pub struct ComparisonController {
    sliders: SliderState,
    predictions: Option<MultiModelPredictionResult>,
    last_error: Option<String>,
}

impl ComparisonController {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn mount<A: DashboardApi + ?Sized>(&mut self, api: &A) -> &LoadState {
        self.predictions = None;
        self.last_error = None;
        if self.sliders.load(api, PAGE).await.is_ready() {
            if let Ok(pending) = self.refresh() {
                drive(self, api, pending).await;
            }
        }
        &self.sliders.state
    }

    pub async fn on_slider_change<A: DashboardApi + ?Sized>(
        &mut self,
        api: &A,
        feature: &str,
        value: f64,
    ) -> Result<Applied, ControlError> {
        let pending = self.set_feature(feature, value)?;
        Ok(drive(self, api, pending).await)
    }

    pub fn state(&self) -> &LoadState {
        &self.sliders.state
    }

    pub fn predictions(&self) -> Option<&MultiModelPredictionResult> {
        self.predictions.as_ref()
    }

    pub fn values(&self) -> &FeatureValueVector {
        &self.sliders.values
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn view(&self) -> Result<ComparisonView, ControlError> {
        let sliders = self.sliders.sliders()?;
        let feature_names = self
            .sliders
            .metadata
            .as_ref()
            .map(|m| m.feature_names.as_slice())
            .unwrap_or_default();
        let (cards, probabilities, importance) = match &self.predictions {
            Some(results) => (
                views::prediction_cards(results),
                views::probability_rows(results),
                views::importance_comparison(feature_names, results),
            ),
            None => (Vec::new(), Vec::new(), Vec::new()),
        };
        Ok(ComparisonView {
            sliders,
            cards,
            probabilities,
            importance,
            error: self.last_error.clone(),
        })
    }

    fn fail_prediction(&mut self, message: String) {
        log_page_error(PAGE, "predict_all", &message);
        self.predictions = None;
        self.last_error = Some(message);
    }
}

impl SliderPage for ComparisonController {
    fn page_name(&self) -> &'static str {
        PAGE
    }

    fn set_feature(
        &mut self,
        feature: &str,
        value: f64,
    ) -> Result<PendingPrediction, ControlError> {
        self.sliders.set_feature(feature, value)?;
        self.refresh()
    }

    fn refresh(&mut self) -> Result<PendingPrediction, ControlError> {
        self.sliders.issue(PredictionScope::AllModels)
    }

    fn apply(&mut self, ticket: Ticket) -> Applied {
        if !self.sliders.accept(PAGE, ticket.seq) {
            return Applied::Stale;
        }
        match ticket.result {
            Ok(Prediction::All(results)) => {
                self.predictions = Some(results);
                self.last_error = None;
                Applied::Fresh
            }
            Ok(Prediction::Single(_)) => {
                self.fail_prediction("expected predictions for every model".to_string());
                Applied::Failed
            }
            Err(err) => {
                self.fail_prediction(err.to_string());
                Applied::Failed
            }
        }
    }
}
