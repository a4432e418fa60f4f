use serde::Serialize;
use std::collections::BTreeMap;

use super::feature_label;
use crate::config::TOP_IMPORTANCE;
use crate::model::ModelId;

/// Direction a signed linear weight pushes the prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Influence {
    TowardMalignant,
    TowardBenign,
    Neutral,
}

impl Influence {
    fn of(weight: f64) -> Self {
        if weight > 0.0 {
            Influence::TowardMalignant
        } else if weight < 0.0 {
            Influence::TowardBenign
        } else {
            Influence::Neutral
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportanceBar {
    pub feature: String,
    pub label: String,
    /// |weight|, the sort key.
    pub magnitude: f64,
    /// Signed weight for the linear model, magnitude otherwise.
    pub value: f64,
    /// Only set for the linear model.
    pub influence: Option<Influence>,
}

/// Top bars by absolute weight, largest first.
pub fn rank_importance(weights: &BTreeMap<String, f64>, model: ModelId) -> Vec<ImportanceBar> {
    rank_importance_top(weights, model, TOP_IMPORTANCE)
}

pub fn rank_importance_top(
    weights: &BTreeMap<String, f64>,
    model: ModelId,
    top_n: usize,
) -> Vec<ImportanceBar> {
    let signed = model.is_linear();
    let mut bars: Vec<ImportanceBar> = weights
        .iter()
        .map(|(feature, &w)| ImportanceBar {
            feature: feature.clone(),
            label: feature_label(feature),
            magnitude: w.abs(),
            value: if signed { w } else { w.abs() },
            influence: signed.then(|| Influence::of(w)),
        })
        .collect();
    // stable: ties keep name order
    bars.sort_by(|a, b| b.magnitude.total_cmp(&a.magnitude));
    bars.truncate(top_n);
    bars
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weights(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn sorted_by_magnitude_and_truncated() {
        let w: BTreeMap<String, f64> = (0..30)
            .map(|i| (format!("f{:02}", i), (i as f64 - 15.0) / 10.0))
            .collect();
        let bars = rank_importance(&w, ModelId::RandomForest);
        assert_eq!(bars.len(), TOP_IMPORTANCE);
        assert!(bars.windows(2).all(|p| p[0].magnitude >= p[1].magnitude));
        assert_eq!(bars[0].feature, "f00");
        assert!(bars.iter().all(|b| b.influence.is_none() && b.value >= 0.0));
    }

    #[test]
    fn linear_model_keeps_sign() {
        let w = weights(&[("worst texture", 1.2), ("worst radius", -2.5), ("mean area", 0.0)]);
        let bars = rank_importance(&w, ModelId::LogisticRegression);
        assert_eq!(bars[0].feature, "worst radius");
        assert_eq!(bars[0].value, -2.5);
        assert_eq!(bars[0].magnitude, 2.5);
        assert_eq!(bars[0].influence, Some(Influence::TowardBenign));
        assert_eq!(bars[1].influence, Some(Influence::TowardMalignant));
        assert_eq!(bars[2].influence, Some(Influence::Neutral));
        assert_eq!(bars[0].label, "Worst Radius");
    }

    #[test]
    fn tree_model_reports_magnitude() {
        let w = weights(&[("a", -0.3), ("b", 0.1)]);
        let bars = rank_importance(&w, ModelId::GradientBoosting);
        assert_eq!(bars[0].value, 0.3);
    }

    #[test]
    fn ties_fall_back_to_name_order() {
        let w = weights(&[("b", 0.5), ("a", -0.5), ("c", 0.5)]);
        let names: Vec<_> = rank_importance(&w, ModelId::RandomForest)
            .into_iter()
            .map(|b| b.feature)
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn empty_weights_rank_to_nothing() {
        assert!(rank_importance(&BTreeMap::new(), ModelId::RandomForest).is_empty());
    }
}
