use serde::Serialize;

use super::ViewError;
use crate::model::{ClassLabel, Dataset};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub x: f64,
    pub y: f64,
}

/// Two label-partitioned series for a feature pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterSeries {
    pub x_feature: String,
    pub y_feature: String,
    pub benign: Vec<ScatterPoint>,
    pub malignant: Vec<ScatterPoint>,
}

impl ScatterSeries {
    pub fn len(&self) -> usize {
        self.benign.len() + self.malignant.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn column(dataset: &Dataset, feature: &str) -> Result<usize, ViewError> {
    dataset
        .column_index(feature)
        .ok_or_else(|| ViewError::UnknownFeature(feature.to_string()))
}

/// One `(x, y, label)` triple per row, in row order.
pub fn scatter_triples(
    dataset: &Dataset,
    x_index: usize,
    y_index: usize,
) -> Result<Vec<(f64, f64, ClassLabel)>, ViewError> {
    dataset
        .data
        .iter()
        .enumerate()
        .map(|(row_idx, row)| {
            let pick = |index: usize| {
                row.get(index).copied().ok_or(ViewError::ColumnOutOfRange {
                    row: row_idx,
                    index,
                    width: row.len(),
                })
            };
            let label = dataset.label(row_idx).unwrap_or(ClassLabel::Malignant);
            Ok((pick(x_index)?, pick(y_index)?, label))
        })
        .collect()
}

pub fn scatter_pairs(
    dataset: &Dataset,
    x_feature: &str,
    y_feature: &str,
) -> Result<ScatterSeries, ViewError> {
    let x = column(dataset, x_feature)?;
    let y = column(dataset, y_feature)?;
    let triples = scatter_triples(dataset, x, y)?;
    let mut series = ScatterSeries {
        x_feature: x_feature.to_string(),
        y_feature: y_feature.to_string(),
        benign: Vec::new(),
        malignant: Vec::new(),
    };
    for (x, y, label) in triples {
        match label {
            ClassLabel::Benign => series.benign.push(ScatterPoint { x, y }),
            ClassLabel::Malignant => series.malignant.push(ScatterPoint { x, y }),
        }
    }
    Ok(series)
}
