use serde::Serialize;

use crate::model::{ClassDistribution, ClassLabel, DatasetMetadata};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieSlice {
    pub label: ClassLabel,
    pub count: u64,
    pub percent: f64,
}

/// Benign and malignant slices; empty when there is nothing to divide.
pub fn class_distribution_slices(dist: &ClassDistribution) -> Vec<PieSlice> {
    let total = dist.total();
    if total == 0 {
        return Vec::new();
    }
    [(ClassLabel::Benign, dist.benign), (ClassLabel::Malignant, dist.malignant)]
        .into_iter()
        .map(|(label, count)| PieSlice {
            label,
            count,
            percent: count as f64 / total as f64 * 100.0,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetOverview {
    pub n_samples: usize,
    pub n_features: usize,
    pub benign: u64,
    pub malignant: u64,
    /// Benign share of `n_samples`.
    pub benign_percent: f64,
}

pub fn dataset_overview(meta: &DatasetMetadata) -> DatasetOverview {
    let benign = meta.class_distribution.benign;
    let benign_percent = if meta.n_samples == 0 {
        0.0
    } else {
        benign as f64 / meta.n_samples as f64 * 100.0
    };
    DatasetOverview {
        n_samples: meta.n_samples,
        n_features: meta.n_features,
        benign,
        malignant: meta.class_distribution.malignant,
        benign_percent,
    }
}
