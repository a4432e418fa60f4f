use serde::Serialize;

use super::ViewError;
use crate::config::HISTOGRAM_BINS;
use crate::logging::{log, obj, v_num, v_str, Domain, Level};
use crate::model::{ClassLabel, Dataset};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub label: String,
    pub benign: usize,
    pub malignant: usize,
}

impl HistogramBin {
    fn new(start: f64, end: f64) -> Self {
        Self {
            start,
            end,
            label: format!("{:.1}-{:.1}", start, end),
            benign: 0,
            malignant: 0,
        }
    }

    pub fn total(&self) -> usize {
        self.benign + self.malignant
    }
}

/// Stacked histogram of one feature, split by class.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub feature: String,
    pub min: f64,
    pub max: f64,
    pub bins: Vec<HistogramBin>,
}

impl Histogram {
    pub fn total(&self) -> usize {
        self.bins.iter().map(HistogramBin::total).sum()
    }

    pub fn tallest(&self) -> usize {
        self.bins.iter().map(HistogramBin::total).max().unwrap_or(0)
    }
}

/// Histogram by column name.
pub fn histogram_for(dataset: &Dataset, feature: &str) -> Result<Histogram, ViewError> {
    let index = dataset
        .column_index(feature)
        .ok_or_else(|| ViewError::UnknownFeature(feature.to_string()))?;
    histogram(dataset, index)
}

/// Histogram of column `feature_index` with the standard bin count.
pub fn histogram(dataset: &Dataset, feature_index: usize) -> Result<Histogram, ViewError> {
    histogram_with_bins(dataset, feature_index, HISTOGRAM_BINS)
}

/// Equal-width bins over the shared min/max of both classes. A constant
/// column collapses to one bin holding every row. The last bin is closed
/// so the maximum value is counted.
pub fn histogram_with_bins(
    dataset: &Dataset,
    feature_index: usize,
    bins: usize,
) -> Result<Histogram, ViewError> {
    let feature = dataset
        .features
        .get(feature_index)
        .cloned()
        .unwrap_or_else(|| format!("column {}", feature_index));

    let mut benign = Vec::new();
    let mut malignant = Vec::new();
    for (row_idx, row) in dataset.data.iter().enumerate() {
        let value = *row.get(feature_index).ok_or(ViewError::ColumnOutOfRange {
            row: row_idx,
            index: feature_index,
            width: row.len(),
        })?;
        match dataset.label(row_idx) {
            Some(ClassLabel::Benign) => benign.push(value),
            _ => malignant.push(value),
        }
    }

    let all = benign.iter().chain(malignant.iter());
    let (min, max) = all.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(*v), hi.max(*v))
    });
    if benign.is_empty() && malignant.is_empty() {
        return Ok(Histogram { feature, min: 0.0, max: 0.0, bins: Vec::new() });
    }

    let count = bins.max(1);
    let width = (max - min) / count as f64;
    if width <= 0.0 || !width.is_finite() {
        log(
            Level::Debug,
            Domain::View,
            "constant_feature",
            obj(&[("feature", v_str(&feature)), ("value", v_num(min))]),
        );
        let mut only = HistogramBin::new(min, max);
        only.benign = benign.len();
        only.malignant = malignant.len();
        return Ok(Histogram { feature, min, max, bins: vec![only] });
    }

    let mut out: Vec<HistogramBin> = (0..count)
        .map(|i| {
            let start = min + i as f64 * width;
            HistogramBin::new(start, start + width)
        })
        .collect();
    let slot = |v: f64| (((v - min) / width).floor() as usize).min(count - 1);
    for v in benign {
        out[slot(v)].benign += 1;
    }
    for v in malignant {
        out[slot(v)].malignant += 1;
    }

    Ok(Histogram { feature, min, max, bins: out })
}
