use serde::Serialize;

use super::{feature_label, ViewError};
use crate::config::UNCERTAINTY_MARGIN;
use crate::model::{
    ClassLabel, DatasetMetadata, FeatureStatistics, FeatureValueVector, ModelId,
    MultiModelPredictionResult, PredictionResult,
};

/// A range slider bound to one entry of the feature vector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SliderView {
    pub feature: String,
    pub label: String,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub step: f64,
    pub value: f64,
    /// Filled share of the track, 0..=100.
    pub fill_percent: f64,
}

/// Sliders for the top features; a feature missing from `values` shows its mean.
pub fn sliders(
    meta: &DatasetMetadata,
    stats: &FeatureStatistics,
    values: &FeatureValueVector,
) -> Result<Vec<SliderView>, ViewError> {
    meta.slider_features()
        .iter()
        .map(|feature| {
            let s = stats
                .get(feature)
                .ok_or_else(|| ViewError::MissingStats(feature.clone()))?;
            let value = values.get(feature).unwrap_or(s.mean);
            let span = s.span();
            let fill_percent = if span > 0.0 {
                ((value - s.min) / span * 100.0).clamp(0.0, 100.0)
            } else {
                0.0
            };
            Ok(SliderView {
                feature: feature.clone(),
                label: feature_label(feature),
                min: s.min,
                max: s.max,
                mean: s.mean,
                step: span / 100.0,
                value,
                fill_percent,
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionCard {
    pub model: ModelId,
    pub title: &'static str,
    pub class: ClassLabel,
    /// max(p) as a percentage.
    pub confidence_percent: f64,
    /// The two probabilities are within the uncertainty margin.
    pub uncertain: bool,
    pub benign_percent: f64,
    pub malignant_percent: f64,
}

pub fn prediction_card(model: ModelId, result: &PredictionResult) -> PredictionCard {
    let p = result.probabilities;
    PredictionCard {
        model,
        title: model.display_name(),
        class: if result.prediction == ClassLabel::Benign.code() {
            ClassLabel::Benign
        } else {
            ClassLabel::Malignant
        },
        confidence_percent: p.confidence() * 100.0,
        uncertain: p.margin() < UNCERTAINTY_MARGIN,
        benign_percent: p.benign * 100.0,
        malignant_percent: p.malignant * 100.0,
    }
}

pub fn prediction_cards(results: &MultiModelPredictionResult) -> Vec<PredictionCard> {
    results.iter().map(|(model, r)| prediction_card(*model, r)).collect()
}
