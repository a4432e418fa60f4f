use serde::Serialize;

use super::{ControlError, LoadState};
use crate::api::{ApiError, DashboardApi, Endpoint};
use crate::config::DEFAULT_SELECTED_FEATURES;
use crate::logging::{log, log_page_error, obj, v_num, v_str, Domain, Level, ProfileScope};
use crate::model::{Dataset, DatasetMetadata};
use crate::views::{self, DatasetOverview, Histogram, PieSlice, ScatterSeries};

const PAGE: &str = "dataset_visualization";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisualizationView {
    pub overview: DatasetOverview,
    pub slices: Vec<PieSlice>,
    pub feature_names: Vec<String>,
    pub selected: Vec<String>,
    pub histograms: Vec<Histogram>,
    pub scatter: ScatterSeries,
}

/// Dataset exploration page: class balance, per-feature histograms and a
/// two-feature scatter plot.
#[derive(Debug, Clone)]
pub struct VisualizationController {
    state: LoadState,
    metadata: Option<DatasetMetadata>,
    dataset: Option<Dataset>,
    selected: Vec<String>,
    x_feature: String,
    y_feature: String,
}

impl Default for VisualizationController {
    fn default() -> Self {
        Self {
            state: LoadState::Loading,
            metadata: None,
            dataset: None,
            selected: Vec::new(),
            x_feature: String::new(),
            y_feature: String::new(),
        }
    }
}

impl VisualizationController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Metadata and rows fetched concurrently; selection and axes reset to defaults.
    /// Rows that do not line up with the metadata features fail the load as a
    /// schema error.
    pub async fn mount<A: DashboardApi + ?Sized>(&mut self, api: &A) -> &LoadState {
        self.state = LoadState::Loading;
        let joined = tokio::try_join!(api.fetch_metadata(), api.fetch_dataset());
        let (metadata, dataset) = match joined {
            Ok(pair) => pair,
            Err(err) => return self.fail("load", err),
        };
        let names = &metadata.feature_names;
        let dataset = dataset.with_default_features(names);
        if let Err(reason) = dataset.validate_against(&metadata) {
            return self.fail("validate", ApiError::schema(Endpoint::Dataset, reason));
        }
        self.selected = names.iter().take(DEFAULT_SELECTED_FEATURES).cloned().collect();
        self.x_feature = names.first().cloned().unwrap_or_default();
        self.y_feature = names.get(1).or_else(|| names.first()).cloned().unwrap_or_default();
        log(
            Level::Info,
            Domain::Controller,
            "page_ready",
            obj(&[
                ("page", v_str(PAGE)),
                ("rows", v_num(dataset.len() as f64)),
                ("selected", v_num(self.selected.len() as f64)),
            ]),
        );
        self.dataset = Some(dataset);
        self.metadata = Some(metadata);
        self.state = LoadState::Ready;
        &self.state
    }

    fn fail(&mut self, stage: &str, err: ApiError) -> &LoadState {
        log_page_error(PAGE, stage, &err.to_string());
        self.metadata = None;
        self.dataset = None;
        self.selected.clear();
        self.state = LoadState::Failed(err.to_string());
        &self.state
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    pub fn axes(&self) -> (&str, &str) {
        (&self.x_feature, &self.y_feature)
    }

    fn check_feature(&self, feature: &str) -> Result<(), ControlError> {
        let meta = self.metadata.as_ref().ok_or(ControlError::NotReady)?;
        if meta.feature_index(feature).is_none() {
            return Err(ControlError::UnknownFeature(feature.to_string()));
        }
        Ok(())
    }

    /// Replace the histogram selection. Duplicates are dropped, order kept.
    pub fn select_features(&mut self, features: Vec<String>) -> Result<(), ControlError> {
        if !self.state.is_ready() {
            return Err(ControlError::NotReady);
        }
        let mut selected: Vec<String> = Vec::with_capacity(features.len());
        for feature in features {
            self.check_feature(&feature)?;
            if !selected.contains(&feature) {
                selected.push(feature);
            }
        }
        self.selected = selected;
        Ok(())
    }

    /// Add or remove one feature from the histogram selection.
    pub fn toggle_feature(&mut self, feature: &str) -> Result<bool, ControlError> {
        if !self.state.is_ready() {
            return Err(ControlError::NotReady);
        }
        self.check_feature(feature)?;
        if let Some(pos) = self.selected.iter().position(|f| f == feature) {
            self.selected.remove(pos);
            Ok(false)
        } else {
            self.selected.push(feature.to_string());
            Ok(true)
        }
    }

    pub fn set_axes(&mut self, x: &str, y: &str) -> Result<(), ControlError> {
        if !self.state.is_ready() {
            return Err(ControlError::NotReady);
        }
        self.check_feature(x)?;
        self.check_feature(y)?;
        self.x_feature = x.to_string();
        self.y_feature = y.to_string();
        Ok(())
    }

    pub fn view(&self) -> Result<VisualizationView, ControlError> {
        let (meta, dataset) = match (&self.metadata, &self.dataset) {
            (Some(meta), Some(dataset)) => (meta, dataset),
            _ => return Err(ControlError::NotReady),
        };
        let _scope = ProfileScope::new("visualization_view");
        let histograms = self
            .selected
            .iter()
            .map(|feature| views::histogram_for(dataset, feature))
            .collect::<Result<Vec<_>, _>>()?;
        let scatter = views::scatter_pairs(dataset, &self.x_feature, &self.y_feature)?;
        Ok(VisualizationView {
            overview: views::dataset_overview(meta),
            slices: views::class_distribution_slices(&meta.class_distribution),
            feature_names: meta.feature_names.clone(),
            selected: self.selected.clone(),
            histograms,
            scatter,
        })
    }
}
