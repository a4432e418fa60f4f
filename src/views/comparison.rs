use serde::Serialize;
use std::collections::BTreeMap;

use super::{feature_label, truncate_label};
use crate::config::{COMPARISON_LABEL_WIDTH, TOP_IMPORTANCE};
use crate::model::{ModelId, MultiModelPredictionResult};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbabilityRow {
    pub model: ModelId,
    pub name: &'static str,
    pub benign: f64,
    pub malignant: f64,
}

/// One row per model, in fixed model order.
pub fn probability_rows(results: &MultiModelPredictionResult) -> Vec<ProbabilityRow> {
    results
        .iter()
        .map(|(model, pred)| ProbabilityRow {
            model: *model,
            name: model.display_name(),
            benign: pred.probabilities.benign,
            malignant: pred.probabilities.malignant,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportanceComparisonRow {
    pub feature: String,
    pub label: String,
    /// |weight| per model; models without a weight for this feature are absent.
    pub weights: BTreeMap<ModelId, f64>,
}

/// Grouped importance bars for the leading dataset features, one group per
/// feature and one bar per model.
pub fn importance_comparison(
    feature_names: &[String],
    results: &MultiModelPredictionResult,
) -> Vec<ImportanceComparisonRow> {
    feature_names
        .iter()
        .take(TOP_IMPORTANCE)
        .map(|feature| {
            let weights = results
                .iter()
                .filter_map(|(model, pred)| {
                    pred.feature_importance
                        .as_ref()
                        .and_then(|w| w.get(feature))
                        .map(|w| (*model, w.abs()))
                })
                .collect();
            ImportanceComparisonRow {
                feature: feature.clone(),
                label: truncate_label(&feature_label(feature), COMPARISON_LABEL_WIDTH),
                weights,
            }
        })
        .collect()
}
