use anyhow::{anyhow, bail, Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::BufReader;

use mldemo::api::{DashboardApi, HttpApi};
use mldemo::config::Config;
use mldemo::controller::{
    run_session, ComparisonController, ControlError, DemoController, HomeController,
    InteractivePage, LoadState, VisualizationController,
};
use mldemo::logging::{log, obj, v_str, Domain, Level};
use mldemo::model::ModelId;
use mldemo::render::{self, Page};

const USAGE: &str = "usage: mldemo <home|visualize|demo|compare|health> [options]
  --model <id>          logistic_regression | random_forest | gradient_boosting (demo)
  --set <feature>=<v>   move a slider before rendering (repeatable; demo, compare)
  --features a,b,...    histogram selection (visualize)
  --x <feature>         scatter x axis (visualize)
  --y <feature>         scatter y axis (visualize)
  --html <path>         also write the page as a self-contained HTML file
  --interactive         read commands from stdin (demo, compare):
                          set <feature> <value> | model <id> | show | quit";

#[derive(Debug, Default)]
struct Args {
    command: String,
    model: Option<ModelId>,
    sets: Vec<(String, f64)>,
    features: Option<Vec<String>>,
    x: Option<String>,
    y: Option<String>,
    html: Option<PathBuf>,
    interactive: bool,
}

fn parse_args(raw: &[String]) -> Result<Args> {
    let mut iter = raw.iter();
    let command = iter.next().ok_or_else(|| anyhow!("missing command"))?.clone();
    let mut args = Args { command, ..Args::default() };
    while let Some(flag) = iter.next() {
        let mut value = || iter.next().cloned().ok_or_else(|| anyhow!("{} needs a value", flag));
        match flag.as_str() {
            "--model" => args.model = Some(value()?.parse().map_err(|e: String| anyhow!(e))?),
            "--set" => {
                let raw = value()?;
                let (feature, v) = raw
                    .rsplit_once('=')
                    .ok_or_else(|| anyhow!("--set expects <feature>=<value>, got '{}'", raw))?;
                let v: f64 = v
                    .trim()
                    .parse()
                    .with_context(|| format!("bad value in --set {}", raw))?;
                args.sets.push((feature.trim().to_string(), v));
            }
            "--features" => {
                args.features = Some(
                    value()?
                        .split(',')
                        .map(|f| f.trim().to_string())
                        .filter(|f| !f.is_empty())
                        .collect(),
                )
            }
            "--x" => args.x = Some(value()?),
            "--y" => args.y = Some(value()?),
            "--html" => args.html = Some(PathBuf::from(value()?)),
            "--interactive" => args.interactive = true,
            other => bail!("unknown option '{}'", other),
        }
    }
    Ok(args)
}

/// Render whatever the page currently shows; used after each applied prediction.
fn print_view<V>(view: Result<V, ControlError>, wrap: fn(V) -> Page) {
    match view {
        Ok(v) => println!("{}", render::render_text(&wrap(v))),
        Err(err) => eprintln!("cannot render: {}", err),
    }
}

async fn interactive<P: InteractivePage>(
    page: &mut P,
    api: &Arc<HttpApi>,
    show: impl FnMut(&P),
) -> Result<()> {
    eprintln!("commands: set <feature> <value> | model <id> | show | quit");
    let input = BufReader::new(tokio::io::stdin());
    run_session(page, Arc::clone(api), input, show)
        .await
        .context("reading stdin")?;
    Ok(())
}

fn finish(page: &Page, html: Option<&PathBuf>) -> Result<()> {
    println!("{}", render::render_text(page));
    if let Some(path) = html {
        render::write_html(path, page)?;
        println!("{} written", path.display());
    }
    Ok(())
}

fn ready_or_bail(title: &str, state: &LoadState) -> Result<()> {
    if state.is_ready() {
        return Ok(());
    }
    print!("{}", render::render_state(title, state));
    bail!("{} did not load", title)
}

async fn run(args: Args, api: Arc<HttpApi>) -> Result<()> {
    match args.command.as_str() {
        "health" => {
            let status = api.health().await?;
            println!("{} {}", status.status, status.message.as_deref().unwrap_or(""));
            if !status.is_healthy() {
                bail!("backend reports '{}'", status.status);
            }
        }
        "home" => {
            let mut page = HomeController::new();
            let state = page.mount(api.as_ref()).await.clone();
            ready_or_bail("Breast Cancer Classification Demo", &state)?;
            let view = page.view().ok_or_else(|| anyhow!("home page has no data"))?;
            finish(&Page::Home(view), args.html.as_ref())?;
        }
        "visualize" => {
            let mut page = VisualizationController::new();
            let state = page.mount(api.as_ref()).await.clone();
            ready_or_bail("Dataset Visualization", &state)?;
            if let Some(features) = args.features {
                page.select_features(features)?;
            }
            if args.x.is_some() || args.y.is_some() {
                let (x, y) = page.axes();
                let x = args.x.clone().unwrap_or_else(|| x.to_string());
                let y = args.y.clone().unwrap_or_else(|| y.to_string());
                page.set_axes(&x, &y)?;
            }
            finish(&Page::Visualization(page.view()?), args.html.as_ref())?;
        }
        "demo" => {
            let mut page = DemoController::with_model(args.model.unwrap_or_default());
            let state = page.mount(api.as_ref()).await.clone();
            ready_or_bail("Interactive Model Demo", &state)?;
            for (feature, value) in &args.sets {
                page.on_slider_change(api.as_ref(), feature, *value).await?;
            }
            if args.interactive {
                interactive(&mut page, &api, |p: &DemoController| print_view(p.view(), Page::Demo))
                    .await?;
            }
            finish(&Page::Demo(page.view()?), args.html.as_ref())?;
        }
        "compare" => {
            let mut page = ComparisonController::new();
            let state = page.mount(api.as_ref()).await.clone();
            ready_or_bail("Model Comparison", &state)?;
            for (feature, value) in &args.sets {
                page.on_slider_change(api.as_ref(), feature, *value).await?;
            }
            if args.interactive {
                let show = |p: &ComparisonController| print_view(p.view(), Page::Comparison);
                interactive(&mut page, &api, show).await?;
            }
            finish(&Page::Comparison(page.view()?), args.html.as_ref())?;
        }
        other => bail!("unknown command '{}'\n{}", other, USAGE),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let raw: Vec<String> = std::env::args().skip(1).collect();
    if raw.is_empty() || raw.iter().any(|a| a == "-h" || a == "--help") {
        println!("{}", USAGE);
        return Ok(());
    }
    let args = parse_args(&raw)?;
    let cfg = Config::from_env();
    let api = Arc::new(HttpApi::new(&cfg)?);
    log(
        Level::Info,
        Domain::System,
        "startup",
        obj(&[
            ("command", v_str(&args.command)),
            ("api_base", v_str(api.base().as_str())),
        ]),
    );
    run(args, api).await
}
