//! Typed payloads exchanged with the prediction backend.
//!
//! Each schema carries a `validate` that the API client runs on every
//! successful response; a body that decodes but breaks one of these
//! invariants is reported as a schema error rather than reaching the views.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::config::TOP_SLIDERS;

/// Tolerance for the benign + malignant = 1 contract.
pub const PROBABILITY_TOLERANCE: f64 = 1e-6;

// =============================================================================
// Identifiers
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelId {
    LogisticRegression,
    RandomForest,
    GradientBoosting,
}

impl ModelId {
    pub const ALL: [ModelId; 3] = [
        ModelId::LogisticRegression,
        ModelId::RandomForest,
        ModelId::GradientBoosting,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelId::LogisticRegression => "logistic_regression",
            ModelId::RandomForest => "random_forest",
            ModelId::GradientBoosting => "gradient_boosting",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ModelId::LogisticRegression => "Logistic Regression",
            ModelId::RandomForest => "Random Forest",
            ModelId::GradientBoosting => "Gradient Boosting",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ModelId::LogisticRegression => "Linear model with interpretable coefficients",
            ModelId::RandomForest => "Ensemble of decision trees",
            ModelId::GradientBoosting => "Sequential ensemble learning",
        }
    }

    /// Only the linear model reports signed weights worth coloring.
    pub fn is_linear(&self) -> bool {
        matches!(self, ModelId::LogisticRegression)
    }
}

impl Default for ModelId {
    fn default() -> Self {
        ModelId::LogisticRegression
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModelId::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == s.trim())
            .ok_or_else(|| format!("unknown model '{}'", s))
    }
}

/// The two fixed diagnosis classes. Wire encoding: 1 = benign, 0 = malignant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassLabel {
    Benign,
    Malignant,
}

impl ClassLabel {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(ClassLabel::Benign),
            0 => Some(ClassLabel::Malignant),
            _ => None,
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            ClassLabel::Benign => 1,
            ClassLabel::Malignant => 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ClassLabel::Benign => "Benign",
            ClassLabel::Malignant => "Malignant",
        }
    }
}

// =============================================================================
// Metadata and statistics
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDistribution {
    pub benign: u64,
    pub malignant: u64,
}

impl ClassDistribution {
    pub fn total(&self) -> u64 {
        self.benign + self.malignant
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetMetadata {
    pub n_samples: usize,
    pub n_features: usize,
    pub feature_names: Vec<String>,
    #[serde(default)]
    pub target_names: Vec<String>,
    pub class_distribution: ClassDistribution,
    pub top_features: Vec<String>,
}

impl DatasetMetadata {
    pub fn validate(&self) -> Result<(), String> {
        if self.n_features != self.feature_names.len() {
            return Err(format!(
                "n_features is {} but {} feature names were sent",
                self.n_features,
                self.feature_names.len()
            ));
        }
        if let Some(unknown) = self.top_features.iter().find(|f| !self.feature_names.contains(f)) {
            return Err(format!("top feature '{}' is not a dataset feature", unknown));
        }
        Ok(())
    }

    pub fn feature_index(&self, name: &str) -> Option<usize> {
        self.feature_names.iter().position(|f| f == name)
    }

    /// The features exposed as interactive sliders.
    pub fn slider_features(&self) -> &[String] {
        let n = self.top_features.len().min(TOP_SLIDERS);
        &self.top_features[..n]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub std: Option<f64>,
}

impl FeatureStats {
    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }
}

/// Per-feature min/max/mean, keyed by feature name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureStatistics(pub BTreeMap<String, FeatureStats>);

impl FeatureStatistics {
    pub fn get(&self, feature: &str) -> Option<&FeatureStats> {
        self.0.get(feature)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn validate(&self) -> Result<(), String> {
        for (name, s) in &self.0 {
            let finite = s.min.is_finite() && s.max.is_finite() && s.mean.is_finite();
            if !finite {
                return Err(format!("non-finite statistics for '{}'", name));
            }
            if s.min > s.max {
                return Err(format!("min {} exceeds max {} for '{}'", s.min, s.max, name));
            }
        }
        Ok(())
    }
}

// =============================================================================
// Dataset
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// Column names; rows may carry trailing columns beyond these.
    #[serde(default)]
    pub features: Vec<String>,
    pub data: Vec<Vec<f64>>,
    pub target: Vec<u8>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.data.len() != self.target.len() {
            return Err(format!(
                "{} rows but {} target labels",
                self.data.len(),
                self.target.len()
            ));
        }
        if let Some(pos) = self.target.iter().position(|t| ClassLabel::from_code(*t).is_none()) {
            return Err(format!("row {} has label {}; expected 0 or 1", pos, self.target[pos]));
        }
        let width = self.features.len();
        if let Some(pos) = self.data.iter().position(|row| row.len() < width) {
            return Err(format!(
                "row {} has {} columns; expected at least {}",
                pos,
                self.data[pos].len(),
                width
            ));
        }
        Ok(())
    }

    /// Fill in column names when the backend omitted them.
    pub fn with_default_features(mut self, names: &[String]) -> Self {
        if self.features.is_empty() {
            self.features = names.to_vec();
        }
        self
    }

    /// Cross-check against metadata once column names are filled in: the
    /// columns must be the metadata features in order and every row must
    /// carry all of them.
    pub fn validate_against(&self, metadata: &DatasetMetadata) -> Result<(), String> {
        if self.features != metadata.feature_names {
            return Err(format!(
                "dataset columns {:?} do not match the {} metadata features",
                self.features, metadata.n_features
            ));
        }
        self.validate()
    }

    pub fn column_index(&self, feature: &str) -> Option<usize> {
        self.features.iter().position(|f| f == feature)
    }

    pub fn label(&self, row: usize) -> Option<ClassLabel> {
        self.target.get(row).copied().and_then(ClassLabel::from_code)
    }

    /// SHA-256 over rows and labels, for correlating runs against the same payload.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for (row, label) in self.data.iter().zip(&self.target) {
            for v in row {
                hasher.update(v.to_le_bytes());
            }
            hasher.update([*label]);
        }
        hex::encode(hasher.finalize())
    }
}

// =============================================================================
// Feature values and predictions
// =============================================================================

/// User-chosen values for the slider features, keyed by feature name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureValueVector(pub BTreeMap<String, f64>);

impl FeatureValueVector {
    /// Each slider feature set to its statistical mean.
    pub fn from_means(
        metadata: &DatasetMetadata,
        stats: &FeatureStatistics,
    ) -> Result<Self, String> {
        let mut values = BTreeMap::new();
        for feature in metadata.slider_features() {
            let s = stats
                .get(feature)
                .ok_or_else(|| format!("no statistics for top feature '{}'", feature))?;
            values.insert(feature.clone(), s.mean);
        }
        Ok(Self(values))
    }

    pub fn get(&self, feature: &str) -> Option<f64> {
        self.0.get(feature).copied()
    }

    pub fn contains(&self, feature: &str) -> bool {
        self.0.contains_key(feature)
    }

    /// Overwrites an existing entry; returns false for features outside the vector.
    pub fn set(&mut self, feature: &str, value: f64) -> bool {
        match self.0.get_mut(feature) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &f64)> {
        self.0.iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Probabilities {
    pub benign: f64,
    pub malignant: f64,
}

impl Probabilities {
    pub fn sum(&self) -> f64 {
        self.benign + self.malignant
    }

    pub fn is_normalized(&self) -> bool {
        (self.sum() - 1.0).abs() <= PROBABILITY_TOLERANCE
    }

    pub fn confidence(&self) -> f64 {
        self.benign.max(self.malignant)
    }

    pub fn margin(&self) -> f64 {
        (self.benign - self.malignant).abs()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub prediction: u8,
    pub probabilities: Probabilities,
    #[serde(default)]
    pub feature_importance: Option<BTreeMap<String, f64>>,
}

impl PredictionResult {
    pub fn label(&self) -> Option<ClassLabel> {
        ClassLabel::from_code(self.prediction)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.label().is_none() {
            return Err(format!("prediction {} is not a class code", self.prediction));
        }
        let p = self.probabilities;
        for (name, v) in [("benign", p.benign), ("malignant", p.malignant)] {
            if !v.is_finite() || !(0.0..=1.0).contains(&v) {
                return Err(format!("{} probability {} outside [0, 1]", name, v));
            }
        }
        if let Some(weights) = &self.feature_importance {
            if let Some((name, _)) = weights.iter().find(|(_, w)| !w.is_finite()) {
                return Err(format!("non-finite importance for '{}'", name));
            }
        }
        Ok(())
    }
}

/// One prediction per supported model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MultiModelPredictionResult(pub BTreeMap<ModelId, PredictionResult>);

impl MultiModelPredictionResult {
    pub fn get(&self, model: ModelId) -> Option<&PredictionResult> {
        self.0.get(&model)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ModelId, &PredictionResult)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn validate(&self) -> Result<(), String> {
        for (model, result) in &self.0 {
            result.validate().map_err(|e| format!("{}: {}", model, e))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

#[derive(Debug, Serialize)]
pub struct PredictRequest<'a> {
    pub model: ModelId,
    pub features: &'a FeatureValueVector,
}

#[derive(Debug, Serialize)]
pub struct PredictAllRequest<'a> {
    pub features: &'a FeatureValueVector,
}
