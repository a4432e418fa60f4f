//! Per-page state holders.
//!
//! A page is `Loading` until its initial fetches join, then `Ready` or
//! `Failed`. Slider and model changes produce a [`PendingPrediction`]
//! stamped with a sequence number; its response is only applied when
//! nothing newer has been applied already, so overlapping requests can
//! finish in any order without an older answer overwriting a newer one.

use crate::api::{ApiError, DashboardApi};
use crate::logging::{log, log_page_error, log_stale_response, obj, v_num, v_str, Domain, Level};
use crate::model::{
    DatasetMetadata, FeatureStatistics, FeatureValueVector, ModelId, MultiModelPredictionResult,
    PredictionResult,
};
use crate::views::{self, SliderView, ViewError};

pub mod comparison;
pub mod demo;
pub mod home;
pub mod session;
pub mod visualization;

pub use comparison::{ComparisonController, ComparisonView};
pub use demo::{DemoController, DemoView, ModelOption};
pub use home::{HomeController, HomeView};
pub use session::{parse_command, run_session, Command, InteractivePage, SessionSummary};
pub use visualization::{VisualizationController, VisualizationView};

#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    Loading,
    Ready,
    /// Fetch failed; the page shows its placeholder with this message.
    Failed(String),
}

impl LoadState {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading)
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, LoadState::Ready)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ControlError {
    #[error("page is not ready")]
    NotReady,
    #[error("'{0}' is not an adjustable feature")]
    UnknownFeature(String),
    #[error("value {value} for '{feature}' is not a finite number")]
    NonFinite { feature: String, value: f64 },
    #[error(transparent)]
    View(#[from] ViewError),
}

// =============================================================================
// Sequence guard
// =============================================================================

/// Monotonic request numbering with a last-applied watermark.
#[derive(Debug, Clone, Default)]
pub struct RequestSeq {
    issued: u64,
    applied: u64,
}

impl RequestSeq {
    pub fn issue(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    /// True if `seq` is newer than everything applied so far; moves the watermark.
    pub fn accept(&mut self, seq: u64) -> bool {
        if seq > self.applied {
            self.applied = seq;
            true
        } else {
            false
        }
    }

    pub fn last_issued(&self) -> u64 {
        self.issued
    }

    pub fn last_applied(&self) -> u64 {
        self.applied
    }
}

// =============================================================================
// Prediction requests
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictionScope {
    Model(ModelId),
    AllModels,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Prediction {
    Single(PredictionResult),
    All(MultiModelPredictionResult),
}

/// A prediction fetch that has been issued but not sent.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingPrediction {
    pub seq: u64,
    pub scope: PredictionScope,
    pub features: FeatureValueVector,
}

/// A finished fetch, still carrying the number it was issued with.
#[derive(Debug, Clone)]
pub struct Ticket {
    pub seq: u64,
    pub result: Result<Prediction, ApiError>,
}

impl PendingPrediction {
    pub async fn send<A: DashboardApi + ?Sized>(self, api: &A) -> Ticket {
        let result = match self.scope {
            PredictionScope::Model(model) => {
                api.predict_one(model, &self.features).await.map(Prediction::Single)
            }
            PredictionScope::AllModels => {
                api.predict_all(&self.features).await.map(Prediction::All)
            }
        };
        Ticket { seq: self.seq, result }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// Newest response; the page now shows it.
    Fresh,
    /// Newest response was an error; the page cleared its prediction.
    Failed,
    /// Something newer was already applied; dropped.
    Stale,
}

/// Pages driven by feature sliders.
pub trait SliderPage {
    fn page_name(&self) -> &'static str;
    fn set_feature(&mut self, feature: &str, value: f64) -> Result<PendingPrediction, ControlError>;
    fn refresh(&mut self) -> Result<PendingPrediction, ControlError>;
    fn apply(&mut self, ticket: Ticket) -> Applied;
}

/// Send one pending prediction and apply its answer.
pub async fn drive<P, A>(page: &mut P, api: &A, pending: PendingPrediction) -> Applied
where
    P: SliderPage + ?Sized,
    A: DashboardApi + ?Sized,
{
    let ticket = pending.send(api).await;
    page.apply(ticket)
}

// =============================================================================
// Shared slider state
// =============================================================================

/// Metadata, statistics and the feature vector shared by the slider pages.
#[derive(Debug, Clone)]
pub struct SliderState {
    pub state: LoadState,
    pub metadata: Option<DatasetMetadata>,
    pub stats: Option<FeatureStatistics>,
    pub values: FeatureValueVector,
    seq: RequestSeq,
}

impl Default for SliderState {
    fn default() -> Self {
        Self {
            state: LoadState::Loading,
            metadata: None,
            stats: None,
            values: FeatureValueVector::default(),
            seq: RequestSeq::default(),
        }
    }
}

impl SliderState {
    /// Metadata and statistics fetched concurrently, then the vector reset to means.
    pub async fn load<A: DashboardApi + ?Sized>(&mut self, api: &A, page: &str) -> &LoadState {
        self.state = LoadState::Loading;
        let joined = tokio::try_join!(api.fetch_metadata(), api.fetch_feature_statistics());
        let (metadata, stats) = match joined {
            Ok(pair) => pair,
            Err(err) => return self.fail(page, "load", err.to_string()),
        };
        let values = match FeatureValueVector::from_means(&metadata, &stats) {
            Ok(values) => values,
            Err(reason) => return self.fail(page, "init_values", reason),
        };
        log(
            Level::Info,
            Domain::Controller,
            "page_ready",
            obj(&[
                ("page", v_str(page)),
                ("features", v_num(metadata.n_features as f64)),
                ("sliders", v_num(values.len() as f64)),
            ]),
        );
        self.metadata = Some(metadata);
        self.stats = Some(stats);
        self.values = values;
        self.state = LoadState::Ready;
        &self.state
    }

    fn fail(&mut self, page: &str, stage: &str, message: String) -> &LoadState {
        log_page_error(page, stage, &message);
        self.metadata = None;
        self.stats = None;
        self.values = FeatureValueVector::default();
        self.state = LoadState::Failed(message);
        &self.state
    }

    /// Move one slider; the value is clamped to the feature's observed range.
    pub fn set_feature(&mut self, feature: &str, value: f64) -> Result<f64, ControlError> {
        if !self.state.is_ready() {
            return Err(ControlError::NotReady);
        }
        if !value.is_finite() {
            return Err(ControlError::NonFinite { feature: feature.to_string(), value });
        }
        if !self.values.contains(feature) {
            return Err(ControlError::UnknownFeature(feature.to_string()));
        }
        let clamped = match self.stats.as_ref().and_then(|s| s.get(feature)) {
            Some(s) => s.clamp(value),
            None => value,
        };
        self.values.set(feature, clamped);
        Ok(clamped)
    }

    pub fn issue(&mut self, scope: PredictionScope) -> Result<PendingPrediction, ControlError> {
        if !self.state.is_ready() {
            return Err(ControlError::NotReady);
        }
        Ok(PendingPrediction {
            seq: self.seq.issue(),
            scope,
            features: self.values.clone(),
        })
    }

    /// Gate a finished ticket through the sequence guard.
    pub fn accept(&mut self, page: &str, seq: u64) -> bool {
        if self.seq.accept(seq) {
            true
        } else {
            log_stale_response(page, seq, self.seq.last_applied());
            false
        }
    }

    pub fn sliders(&self) -> Result<Vec<SliderView>, ControlError> {
        match (&self.metadata, &self.stats) {
            (Some(meta), Some(stats)) => Ok(views::sliders(meta, stats, &self.values)?),
            _ => Err(ControlError::NotReady),
        }
    }
}
