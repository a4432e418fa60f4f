use serde::Serialize;

use super::{
    drive, Applied, ControlError, LoadState, PendingPrediction, Prediction, PredictionScope,
    SliderPage, SliderState, Ticket,
};
use crate::api::DashboardApi;
use crate::logging::{log, log_page_error, obj, v_str, Domain, Level};
use crate::model::{FeatureValueVector, ModelId, PredictionResult};
use crate::views::{self, ImportanceBar, PredictionCard, SliderView};

const PAGE: &str = "model_demo";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelOption {
    pub id: ModelId,
    pub name: &'static str,
    pub description: &'static str,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DemoView {
    pub models: Vec<ModelOption>,
    pub sliders: Vec<SliderView>,
    pub card: Option<PredictionCard>,
    pub importance: Vec<ImportanceBar>,
    /// Importance bars carry signed coefficients.
    pub signed_importance: bool,
    pub error: Option<String>,
}

/// Single-model prediction page.
#[derive(Debug, Clone, Default)]
pub struct DemoController {
    sliders: SliderState,
    model: ModelId,
    prediction: Option<PredictionResult>,
    last_error: Option<String>,
}

impl DemoController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(model: ModelId) -> Self {
        Self { model, ..Self::default() }
    }

    /// Initial load followed by the first prediction.
    pub async fn mount<A: DashboardApi + ?Sized>(&mut self, api: &A) -> &LoadState {
        self.prediction = None;
        self.last_error = None;
        if self.sliders.load(api, PAGE).await.is_ready() {
            if let Ok(pending) = self.refresh() {
                drive(self, api, pending).await;
            }
        }
        &self.sliders.state
    }

    /// Switch model. Re-selecting the active model issues nothing.
    pub fn select_model(&mut self, model: ModelId) -> Option<PendingPrediction> {
        if model == self.model {
            return None;
        }
        self.model = model;
        log(
            Level::Info,
            Domain::Controller,
            "model_selected",
            obj(&[("page", v_str(PAGE)), ("model", v_str(model.as_str()))]),
        );
        self.refresh().ok()
    }

    pub async fn on_model_change<A: DashboardApi + ?Sized>(
        &mut self,
        api: &A,
        model: ModelId,
    ) -> Option<Applied> {
        let pending = self.select_model(model)?;
        Some(drive(self, api, pending).await)
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

    pub fn model(&self) -> ModelId {
        self.model
    }

    pub fn prediction(&self) -> Option<&PredictionResult> {
        self.prediction.as_ref()
    }

    pub fn values(&self) -> &FeatureValueVector {
        &self.sliders.values
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn view(&self) -> Result<DemoView, ControlError> {
        let sliders = self.sliders.sliders()?;
        let models = ModelId::ALL
            .iter()
            .map(|m| ModelOption {
                id: *m,
                name: m.display_name(),
                description: m.description(),
                active: *m == self.model,
            })
            .collect();
        let importance = self
            .prediction
            .as_ref()
            .and_then(|p| p.feature_importance.as_ref())
            .map(|w| views::rank_importance(w, self.model))
            .unwrap_or_default();
        Ok(DemoView {
            models,
            sliders,
            card: self.prediction.as_ref().map(|p| views::prediction_card(self.model, p)),
            importance,
            signed_importance: self.model.is_linear(),
            error: self.last_error.clone(),
        })
    }
}

impl SliderPage for DemoController {
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
        self.sliders.issue(PredictionScope::Model(self.model))
    }

    fn apply(&mut self, ticket: Ticket) -> Applied {
        if !self.sliders.accept(PAGE, ticket.seq) {
            return Applied::Stale;
        }
        match ticket.result {
            Ok(Prediction::Single(result)) => {
                self.prediction = Some(result);
                self.last_error = None;
                Applied::Fresh
            }
            Ok(Prediction::All(_)) => {
                self.fail_prediction("expected a single-model prediction".to_string());
                Applied::Failed
            }
            Err(err) => {
                self.fail_prediction(err.to_string());
                Applied::Failed
            }
        }
    }
}

impl DemoController {
    fn fail_prediction(&mut self, message: String) {
        log_page_error(PAGE, "predict", &message);
        self.prediction = None;
        self.last_error = Some(message);
    }
}
