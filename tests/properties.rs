//! Randomized checks of the derived-view invariants.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;

use mldemo::config::{HISTOGRAM_BINS, TOP_IMPORTANCE};
use mldemo::model::{Dataset, ModelId, PredictionResult, Probabilities};
use mldemo::views::{histogram, rank_importance, scatter_pairs};

fn random_dataset(rng: &mut StdRng) -> Dataset {
    let rows = rng.gen_range(0..300);
    let cols = rng.gen_range(1..6);
    let features: Vec<String> = (0..cols).map(|i| format!("f{}", i)).collect();
    let mut data = Vec::with_capacity(rows);
    let mut target = Vec::with_capacity(rows);
    for _ in 0..rows {
        let mut row: Vec<f64> = (0..cols)
            .map(|c| match c {
                // one column is constant, one is clustered on a few values
                0 => 4.2,
                1 => rng.gen_range(0..4) as f64 * 0.5,
                _ => rng.gen_range(-1e3..1e3),
            })
            .collect();
        let label: u8 = rng.gen_range(0..2);
        row.push(label as f64);
        data.push(row);
        target.push(label);
    }
    Dataset { features, data, target }
}

#[test]
fn histogram_counts_cover_every_row() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for _ in 0..200 {
        let dataset = random_dataset(&mut rng);
        for idx in 0..dataset.features.len() {
            let h = histogram(&dataset, idx).unwrap();
            assert_eq!(h.total(), dataset.len(), "feature {} of {} rows", idx, dataset.len());
            assert!(h.bins.len() <= HISTOGRAM_BINS);
            if dataset.is_empty() {
                assert!(h.bins.is_empty());
            } else if h.min == h.max {
                assert_eq!(h.bins.len(), 1);
            } else {
                assert_eq!(h.bins.len(), HISTOGRAM_BINS);
            }
        }
    }
}

#[test]
fn scatter_partitions_rows_by_label() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..50 {
        let dataset = random_dataset(&mut rng);
        let x = dataset.features[0].clone();
        let y = dataset.features[dataset.features.len() - 1].clone();
        let series = scatter_pairs(&dataset, &x, &y).unwrap();
        let benign = dataset.target.iter().filter(|t| **t == 1).count();
        assert_eq!(series.benign.len(), benign);
        assert_eq!(series.len(), dataset.len());
    }
}

#[test]
fn ranking_is_sorted_and_capped() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..200 {
        let n = rng.gen_range(0..60);
        let weights: BTreeMap<String, f64> = (0..n)
            .map(|i| (format!("feature {}", i), rng.gen_range(-3.0..3.0)))
            .collect();
        for model in ModelId::ALL {
            let bars = rank_importance(&weights, model);
            assert_eq!(bars.len(), n.min(TOP_IMPORTANCE));
            assert!(bars.windows(2).all(|w| w[0].magnitude >= w[1].magnitude));
            if let Some(first) = bars.first() {
                let largest = weights.values().map(|w| w.abs()).fold(0.0, f64::max);
                assert_eq!(first.magnitude, largest);
            }
            for bar in &bars {
                let raw = weights[&bar.feature];
                if model.is_linear() {
                    assert_eq!(bar.value, raw);
                } else {
                    assert_eq!(bar.value, raw.abs());
                }
            }
        }
    }
}

#[test]
fn decoded_probabilities_sum_to_one() {
    let mut rng = StdRng::seed_from_u64(99);
    for _ in 0..500 {
        let benign: f64 = rng.gen_range(0.0..=1.0);
        let raw = format!(
            r#"{{"prediction": {}, "probabilities": {{"benign": {}, "malignant": {}}}}}"#,
            if benign >= 0.5 { 1 } else { 0 },
            benign,
            1.0 - benign
        );
        let result: PredictionResult = serde_json::from_str(&raw).unwrap();
        assert!(result.validate().is_ok());
        assert!(result.probabilities.is_normalized(), "{:?}", result.probabilities);
    }
    assert!(!Probabilities { benign: 0.7, malignant: 0.7 }.is_normalized());
}
