use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use super::{Page, DISCLAIMER};
use crate::logging::{log, obj, v_num, v_str, Domain, Level};

/// Self-contained HTML document with the page data embedded as JSON.
pub fn render_html(page: &Page) -> Result<String> {
    let json = serde_json::to_string(page).context("serialize page data")?;
    // keep the payload from closing the script element early
    let json = json.replace("</", "<\\/");
    Ok(TEMPLATE
        .replace("__MLDEMO_TITLE__", page.title())
        .replace("__MLDEMO_DISCLAIMER__", DISCLAIMER)
        .replace("__MLDEMO_DATA__", &json))
}

pub fn write_html(path: &Path, page: &Page) -> Result<()> {
    let html = render_html(page)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    fs::write(path, &html).with_context(|| format!("write {}", path.display()))?;
    log(
        Level::Info,
        Domain::Render,
        "html_written",
        obj(&[
            ("path", v_str(&path.display().to_string())),
            ("kb", v_num(html.len() as f64 / 1024.0)),
        ]),
    );
    Ok(())
}

const TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>__MLDEMO_TITLE__</title>
  <style>
    :root {
      --bg: #f6f8fa; --panel: #ffffff; --fg: #1f2328; --muted: #656d76;
      --benign: #2da44e; --malignant: #cf222e; --accent: #0969da; --border: #d0d7de;
      --sans: -apple-system, BlinkMacSystemFont, 'Segoe UI', Helvetica, Arial, sans-serif;
      --mono: 'JetBrains Mono', 'SF Mono', monospace;
    }
    * { box-sizing: border-box; margin: 0; padding: 0; }
    body { font-family: var(--sans); background: var(--bg); color: var(--fg); line-height: 1.5; }
    main { max-width: 1100px; margin: 0 auto; padding: 1.5rem; }
    h1 { font-size: 1.5rem; margin-bottom: 1rem; }
    h2 { font-size: 1.05rem; margin: 1.5rem 0 0.5rem; }
    .disclaimer { background: #fff8c5; border: 1px solid #d4a72c; padding: 0.6rem 0.9rem; border-radius: 6px; font-size: 0.85rem; margin-bottom: 1rem; }
    .panel { background: var(--panel); border: 1px solid var(--border); border-radius: 8px; padding: 1rem; margin-bottom: 1rem; }
    .grid { display: grid; grid-template-columns: repeat(auto-fill, minmax(240px, 1fr)); gap: 0.75rem; }
    .row { display: flex; align-items: center; gap: 0.5rem; font-size: 0.8rem; }
    .row .label { width: 12rem; overflow: hidden; text-overflow: ellipsis; white-space: nowrap; }
    .row .num { width: 5rem; text-align: right; font-family: var(--mono); }
    .track { flex: 1; height: 10px; background: #eaeef2; border-radius: 4px; display: flex; overflow: hidden; }
    .fill { height: 100%; }
    .benign { background: var(--benign); }
    .malignant { background: var(--malignant); }
    .accent { background: var(--accent); }
    .hist { display: flex; align-items: flex-end; height: 90px; gap: 1px; }
    .hist .col { flex: 1; display: flex; flex-direction: column-reverse; }
    .card h3 { font-size: 0.95rem; }
    .uncertain { color: #9a6700; font-size: 0.75rem; }
    .muted { color: var(--muted); font-size: 0.8rem; }
  </style>
</head>
<body>
<main>
  <h1>__MLDEMO_TITLE__</h1>
  <div class="disclaimer">__MLDEMO_DISCLAIMER__</div>
  <div id="app"></div>
</main>
<script>
const DATA = __MLDEMO_DATA__;
const app = document.getElementById('app');
const esc = s => String(s).replace(/[&<>"]/g, c => ({'&':'&amp;','<':'&lt;','>':'&gt;','"':'&quot;'}[c]));
const pct = (v, max) => max > 0 ? Math.max(0, Math.min(100, v / max * 100)) : 0;

function barRow(label, value, max, cls, text) {
  return `<div class="row"><span class="label">${esc(label)}</span>
    <span class="track"><span class="fill ${cls}" style="width:${pct(value, max)}%"></span></span>
    <span class="num">${esc(text)}</span></div>`;
}

function slices(view) {
  return `<div class="panel"><h2>Class distribution</h2>` +
    view.slices.map(s => barRow(s.label, s.percent, 100, s.label, s.count + ' (' + s.percent.toFixed(1) + '%)')).join('') +
    `</div>`;
}

function overview(o) {
  return `<div class="panel grid">
    <div><b>${o.n_samples}</b><div class="muted">samples</div></div>
    <div><b>${o.n_features}</b><div class="muted">features</div></div>
    <div><b>${o.benign}</b><div class="muted">benign (${o.benign_percent.toFixed(1)}%)</div></div>
    <div><b>${o.malignant}</b><div class="muted">malignant</div></div></div>`;
}

function histogram(h) {
  const tallest = Math.max(1, ...h.bins.map(b => b.benign + b.malignant));
  const cols = h.bins.map(b => `<div class="col" title="${esc(b.label)}">
      <div class="benign" style="height:${pct(b.benign, tallest) * 0.9}px"></div>
      <div class="malignant" style="height:${pct(b.malignant, tallest) * 0.9}px"></div></div>`).join('');
  return `<div class="panel"><h3>${esc(h.feature)}</h3><div class="hist">${cols}</div>
    <div class="muted">${h.min.toFixed(2)} .. ${h.max.toFixed(2)}</div></div>`;
}

function scatter(s) {
  const pts = s.benign.concat(s.malignant);
  if (!pts.length) return '';
  const xs = pts.map(p => p.x), ys = pts.map(p => p.y);
  const [x0, x1, y0, y1] = [Math.min(...xs), Math.max(...xs), Math.min(...ys), Math.max(...ys)];
  const sx = x => 20 + (x1 > x0 ? (x - x0) / (x1 - x0) : 0.5) * 560;
  const sy = y => 280 - (y1 > y0 ? (y - y0) / (y1 - y0) : 0.5) * 260;
  const dots = (arr, color) => arr.map(p => `<circle cx="${sx(p.x)}" cy="${sy(p.y)}" r="2.5" fill="${color}" opacity="0.6"/>`).join('');
  return `<div class="panel"><h2>${esc(s.x_feature)} vs ${esc(s.y_feature)}</h2>
    <svg viewBox="0 0 600 300" width="100%">${dots(s.benign, '#2da44e')}${dots(s.malignant, '#cf222e')}</svg></div>`;
}

function sliders(list) {
  return `<div class="panel"><h2>Features</h2>` +
    list.map(s => barRow(s.label, s.fill_percent, 100, 'accent', s.value.toFixed(4))).join('') + `</div>`;
}

function cards(list) {
  return `<div class="grid">` + list.map(c => `<div class="panel card"><h3>${esc(c.title)}</h3>
    <div><b class="${c.class}">${c.class === 'benign' ? 'Benign' : 'Malignant'}</b> ${c.confidence_percent.toFixed(1)}%</div>
    ${c.uncertain ? '<div class="uncertain">Uncertain: probabilities are close</div>' : ''}
    ${barRow('benign', c.benign_percent, 100, 'benign', c.benign_percent.toFixed(1) + '%')}
    ${barRow('malignant', c.malignant_percent, 100, 'malignant', c.malignant_percent.toFixed(1) + '%')}</div>`).join('') + `</div>`;
}

function importance(bars) {
  if (!bars.length) return '';
  const max = bars[0].magnitude;
  return `<div class="panel"><h2>Feature importance</h2>` + bars.map(b =>
    barRow(b.label, b.magnitude, max, b.influence === 'toward_benign' ? 'benign' : (b.influence === 'toward_malignant' ? 'malignant' : 'accent'), b.value.toFixed(4))).join('') + `</div>`;
}

function probabilityRows(rows) {
  if (!rows.length) return '';
  return `<div class="panel" id="probability-comparison"><h2>Probability comparison</h2>` + rows.map(r =>
    `<div class="muted">${esc(r.name)}</div>` +
    barRow('benign', r.benign, 1, 'benign', (r.benign * 100).toFixed(1) + '%') +
    barRow('malignant', r.malignant, 1, 'malignant', (r.malignant * 100).toFixed(1) + '%')).join('') + `</div>`;
}

function comparisonImportance(rows) {
  if (!rows.length) return '';
  const max = Math.max(0, ...rows.flatMap(r => Object.values(r.weights)));
  return `<div class="panel"><h2>Importance by model</h2>` + rows.map(r =>
    `<div class="muted">${esc(r.label)}</div>` +
    Object.entries(r.weights).map(([m, w]) => barRow(m, w, max, 'accent', w.toFixed(4))).join('')).join('') + `</div>`;
}

const v = DATA.view;
let html = '';
switch (DATA.page) {
  case 'home':
    html = overview(v.overview) + slices(v);
    break;
  case 'visualization':
    html = overview(v.overview) + slices(v) + `<div class="grid">${v.histograms.map(histogram).join('')}</div>` + scatter(v.scatter);
    break;
  case 'demo':
    html = `<div class="panel">${v.models.map(m => `<div class="row"><b>${m.active ? '&#9679;' : '&#9675;'}</b> ${esc(m.name)} <span class="muted">${esc(m.description)}</span></div>`).join('')}</div>` +
      sliders(v.sliders) + (v.card ? cards([v.card]) : `<div class="panel muted">${esc(v.error || 'No prediction yet')}</div>`) +
      importance(v.importance);
    break;
  case 'comparison':
    html = sliders(v.sliders) + (v.error ? `<div class="panel muted">${esc(v.error)}</div>` : cards(v.cards) + probabilityRows(v.probabilities) + comparisonImportance(v.importance));
    break;
}
app.innerHTML = html;
</script>
</body>
</html>
"##;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::fake;
    use crate::controller::ComparisonView;
    use crate::model::{FeatureValueVector, ModelId, MultiModelPredictionResult};
    use crate::render::tests::home_page;
    use crate::views;

    #[test]
    fn html_embeds_page_json() {
        let html = render_html(&home_page()).unwrap();
        assert!(html.contains("<title>Breast Cancer Classification Demo</title>"));
        assert!(html.contains(DISCLAIMER));
        assert!(html.contains(r#"const DATA = {"page":"home""#));
        assert!(!html.contains("__MLDEMO_DATA__"));
    }

    #[test]
    fn comparison_html_draws_probability_panel() {
        let metadata = fake::metadata();
        let results = MultiModelPredictionResult(
            ModelId::ALL
                .iter()
                .map(|m| (*m, fake::predict(*m, &FeatureValueVector::default())))
                .collect(),
        );
        let page = Page::Comparison(ComparisonView {
            sliders: Vec::new(),
            cards: views::prediction_cards(&results),
            probabilities: views::probability_rows(&results),
            importance: views::importance_comparison(&metadata.feature_names, &results),
            error: None,
        });
        let html = render_html(&page).unwrap();
        assert!(html.contains("probabilityRows(v.probabilities)"));
        assert!(html.contains(r#"const DATA = {"page":"comparison""#));
        assert!(html.contains(r#""probabilities":[{"model":"logistic_regression""#));
    }

    #[test]
    fn html_written_into_nested_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pages").join("home.html");
        write_html(&path, &home_page()).unwrap();
        let written = fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("<!DOCTYPE html>"));
    }
}
