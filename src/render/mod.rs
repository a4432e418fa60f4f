//! Page presentation: plain text for the terminal and a self-contained
//! HTML export. Both read the same view structs the controllers build.

mod html;

pub use html::{render_html, write_html};

use serde::Serialize;
use std::fmt::Write;

use crate::controller::{ComparisonView, DemoView, HomeView, LoadState, VisualizationView};
use crate::model::ClassLabel;
use crate::views::{Histogram, Influence};

pub const DISCLAIMER: &str = "Educational Demo Only - Not Medical Advice. \
This application is for learning about machine learning and is NOT a medical diagnostic tool.";

const BAR_WIDTH: usize = 40;

/// A fully built page, ready to print or export.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "page", content = "view", rename_all = "snake_case")]
pub enum Page {
    Home(HomeView),
    Visualization(VisualizationView),
    Demo(DemoView),
    Comparison(ComparisonView),
}

impl Page {
    pub fn title(&self) -> &'static str {
        match self {
            Page::Home(_) => "Breast Cancer Classification Demo",
            Page::Visualization(_) => "Dataset Visualization",
            Page::Demo(_) => "Interactive Model Demo",
            Page::Comparison(_) => "Model Comparison",
        }
    }
}

fn bar(value: f64, max: f64, width: usize) -> String {
    if max.is_nan() || max <= 0.0 || !value.is_finite() {
        return String::new();
    }
    let filled = ((value / max).clamp(0.0, 1.0) * width as f64).round() as usize;
    "#".repeat(filled)
}

fn banner(out: &mut String, title: &str) {
    let _ = writeln!(out, "=== {} ===", title);
    let _ = writeln!(out, "! {}", DISCLAIMER);
    out.push('\n');
}

/// Loading and failure placeholders.
pub fn render_state(title: &str, state: &LoadState) -> String {
    let mut out = String::new();
    banner(&mut out, title);
    match state {
        LoadState::Loading => out.push_str("Loading...\n"),
        LoadState::Ready => {}
        LoadState::Failed(message) => {
            let _ = writeln!(out, "Error: {}", message);
        }
    }
    out
}

pub fn render_text(page: &Page) -> String {
    let mut out = String::new();
    banner(&mut out, page.title());
    match page {
        Page::Home(view) => home(&mut out, view),
        Page::Visualization(view) => visualization(&mut out, view),
        Page::Demo(view) => demo(&mut out, view),
        Page::Comparison(view) => comparison(&mut out, view),
    }
    out
}

fn home(out: &mut String, view: &HomeView) {
    let o = &view.overview;
    let _ = writeln!(out, "Samples:   {}", o.n_samples);
    let _ = writeln!(out, "Features:  {}", o.n_features);
    let _ = writeln!(out, "Benign:    {} ({:.1}%)", o.benign, o.benign_percent);
    let _ = writeln!(out, "Malignant: {}", o.malignant);
    out.push('\n');
    class_split(out, view);
}

fn class_split(out: &mut String, view: &HomeView) {
    let _ = writeln!(out, "Class distribution");
    for slice in &view.slices {
        let _ = writeln!(
            out,
            "  {:<10} {:>5} {:>6.1}% {}",
            slice.label.as_str(),
            slice.count,
            slice.percent,
            bar(slice.percent, 100.0, BAR_WIDTH)
        );
    }
}

fn visualization(out: &mut String, view: &VisualizationView) {
    home(
        out,
        &HomeView { overview: view.overview.clone(), slices: view.slices.clone() },
    );
    out.push('\n');
    for h in &view.histograms {
        histogram(out, h);
        out.push('\n');
    }
    let s = &view.scatter;
    let _ = writeln!(out, "Scatter: {} vs {}", s.x_feature, s.y_feature);
    let _ = writeln!(
        out,
        "  {} benign points, {} malignant points",
        s.benign.len(),
        s.malignant.len()
    );
    for (name, points) in [("benign", &s.benign), ("malignant", &s.malignant)] {
        if let Some(first) = points.first() {
            let _ = writeln!(out, "  first {}: ({:.3}, {:.3})", name, first.x, first.y);
        }
    }
}

fn histogram(out: &mut String, h: &Histogram) {
    let _ = writeln!(out, "{} [{:.2}, {:.2}]", h.feature, h.min, h.max);
    let tallest = h.tallest() as f64;
    for bin in &h.bins {
        let _ = writeln!(
            out,
            "  {:>17} B{:>4} M{:>4} {}{}",
            bin.label,
            bin.benign,
            bin.malignant,
            bar(bin.benign as f64, tallest, BAR_WIDTH),
            "*".repeat(bar(bin.malignant as f64, tallest, BAR_WIDTH).len())
        );
    }
}

fn demo(out: &mut String, view: &DemoView) {
    let _ = writeln!(out, "Models");
    for m in &view.models {
        let marker = if m.active { '>' } else { ' ' };
        let _ = writeln!(out, " {} {:<20} {}", marker, m.name, m.description);
    }
    out.push('\n');
    sliders(out, &view.sliders);
    out.push('\n');
    match (&view.card, &view.error) {
        (Some(card), _) => cards(out, std::slice::from_ref(card)),
        (None, Some(err)) => {
            let _ = writeln!(out, "Prediction failed: {}", err);
        }
        (None, None) => out.push_str("No prediction yet\n"),
    }
    if !view.importance.is_empty() {
        out.push('\n');
        let _ = writeln!(out, "Feature importance");
        let max = view.importance.first().map_or(0.0, |b| b.magnitude);
        for b in &view.importance {
            let direction = match b.influence {
                Some(Influence::TowardMalignant) => " -> malignant",
                Some(Influence::TowardBenign) => " -> benign",
                Some(Influence::Neutral) | None => "",
            };
            let _ = writeln!(
                out,
                "  {:<28} {:>9.4} {}{}",
                b.label,
                b.value,
                bar(b.magnitude, max, BAR_WIDTH / 2),
                direction
            );
        }
    }
}

fn sliders(out: &mut String, sliders: &[crate::views::SliderView]) {
    let _ = writeln!(out, "Features");
    for s in sliders {
        let _ = writeln!(
            out,
            "  {:<28} {:>12.4}  [{:.4} .. {:.4}] {:>5.1}%",
            s.label, s.value, s.min, s.max, s.fill_percent
        );
    }
}

fn cards(out: &mut String, cards: &[crate::views::PredictionCard]) {
    for c in cards {
        let verdict = match c.class {
            ClassLabel::Benign => "Benign",
            ClassLabel::Malignant => "Malignant",
        };
        let _ = writeln!(
            out,
            "{:<20} {:<9} confidence {:>5.1}%{}",
            c.title,
            verdict,
            c.confidence_percent,
            if c.uncertain { "  (uncertain)" } else { "" }
        );
        let _ = writeln!(
            out,
            "  benign {:>5.1}% {}",
            c.benign_percent,
            bar(c.benign_percent, 100.0, BAR_WIDTH / 2)
        );
        let _ = writeln!(
            out,
            "  malignant {:>5.1}% {}",
            c.malignant_percent,
            bar(c.malignant_percent, 100.0, BAR_WIDTH / 2)
        );
    }
}

fn comparison(out: &mut String, view: &ComparisonView) {
    sliders(out, &view.sliders);
    out.push('\n');
    if let Some(err) = &view.error {
        let _ = writeln!(out, "Prediction failed: {}", err);
        return;
    }
    cards(out, &view.cards);
    out.push('\n');
    let _ = writeln!(out, "{:<20} {:>8} {:>10}", "Model", "Benign", "Malignant");
    let _ = writeln!(out, "{}", "-".repeat(40));
    for row in &view.probabilities {
        let _ = writeln!(out, "{:<20} {:>8.3} {:>10.3}", row.name, row.benign, row.malignant);
    }
    if view.importance.is_empty() {
        return;
    }
    out.push('\n');
    let _ = writeln!(out, "Importance by model");
    for row in &view.importance {
        let weights: Vec<String> = row
            .weights
            .iter()
            .map(|(model, w)| format!("{}={:.4}", model.as_str(), w))
            .collect();
        let _ = writeln!(out, "  {:<20} {}", row.label, weights.join(" "));
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::ClassDistribution;
    use crate::views::{class_distribution_slices, DatasetOverview};

    pub(super) fn home_page() -> Page {
        let dist = ClassDistribution { benign: 357, malignant: 212 };
        Page::Home(HomeView {
            overview: DatasetOverview {
                n_samples: 569,
                n_features: 30,
                benign: 357,
                malignant: 212,
                benign_percent: 62.74,
            },
            slices: class_distribution_slices(&dist),
        })
    }

    #[test]
    fn every_page_carries_disclaimer() {
        let text = render_text(&home_page());
        assert!(text.starts_with("=== Breast Cancer Classification Demo ==="));
        assert!(text.contains("NOT a medical diagnostic tool"));
        assert!(text.contains("62.7%"));
        assert!(render_state("Model Comparison", &LoadState::Loading).contains(DISCLAIMER));
    }

    #[test]
    fn visualization_text_leads_with_overview() {
        use crate::controller::{fake, VisualizationView};
        use crate::views::{dataset_overview, histogram_for, scatter_pairs};

        let meta = fake::metadata();
        let dataset = fake::dataset();
        let page = Page::Visualization(VisualizationView {
            overview: dataset_overview(&meta),
            slices: class_distribution_slices(&meta.class_distribution),
            feature_names: meta.feature_names.clone(),
            selected: vec!["worst area".into()],
            histograms: vec![histogram_for(&dataset, "worst area").unwrap()],
            scatter: scatter_pairs(&dataset, "mean radius", "mean texture").unwrap(),
        });
        let text = render_text(&page);
        assert!(text.contains("Samples:   6"));
        assert!(text.contains("Features:  3"));
        assert!(text.contains("Benign:    4 (66.7%)"));
        assert!(text.contains("Scatter: mean radius vs mean texture"));

        let html = render_html(&page).unwrap();
        assert!(html.contains("overview(v.overview) + slices(v) + `<div class=\"grid\">"));
    }

    #[test]
    fn failure_placeholder_shows_message() {
        let text = render_state("Home", &LoadState::Failed("Cannot connect".into()));
        assert!(text.contains("Error: Cannot connect"));
    }

    #[test]
    fn bars_scale_to_width() {
        assert_eq!(bar(50.0, 100.0, 10), "#####");
        assert_eq!(bar(200.0, 100.0, 4), "####");
        assert_eq!(bar(1.0, 0.0, 10), "");
        assert_eq!(bar(f64::NAN, 1.0, 10), "");
    }

    #[test]
    fn page_serializes_with_tag() {
        let json = serde_json::to_value(home_page()).unwrap();
        assert_eq!(json["page"], "home");
        assert_eq!(json["view"]["overview"]["n_samples"], 569);
        assert_eq!(json["view"]["slices"][0]["label"], "benign");
    }
}
