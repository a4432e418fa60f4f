//! Derived-view builders: pure functions from API payloads to chart-ready
//! series. Nothing here holds state; pages call them again on every change.

pub mod comparison;
pub mod controls;
pub mod distribution;
pub mod histogram;
pub mod importance;
pub mod scatter;

pub use comparison::{
    importance_comparison, probability_rows, ImportanceComparisonRow, ProbabilityRow,
};
pub use controls::{prediction_card, prediction_cards, sliders, PredictionCard, SliderView};
pub use distribution::{class_distribution_slices, dataset_overview, DatasetOverview, PieSlice};
pub use histogram::{histogram, histogram_for, Histogram, HistogramBin};
pub use importance::{rank_importance, ImportanceBar, Influence};
pub use scatter::{scatter_pairs, ScatterPoint, ScatterSeries};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ViewError {
    #[error("unknown feature '{0}'")]
    UnknownFeature(String),
    #[error("row {row} has {width} columns; column {index} requested")]
    ColumnOutOfRange { row: usize, index: usize, width: usize },
    #[error("no statistics for feature '{0}'")]
    MissingStats(String),
}

/// Human-readable feature name: underscores become spaces and every word
/// starts upper-case (`"worst_concave points"` -> `"Worst Concave Points"`).
pub fn feature_label(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut prev_word = false;
    for ch in name.chars() {
        let ch = if ch == '_' { ' ' } else { ch };
        let is_word = ch.is_alphanumeric();
        if is_word && !prev_word {
            out.extend(ch.to_uppercase());
        } else {
            out.push(ch);
        }
        prev_word = is_word;
    }
    out
}

/// Cut a label to at most `width` characters.
pub fn truncate_label(label: &str, width: usize) -> String {
    label.chars().take(width).collect()
}
