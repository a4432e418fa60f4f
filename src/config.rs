use anyhow::{anyhow, Context, Result};
use url::Url;

/// Equal-width bins per histogram.
pub const HISTOGRAM_BINS: usize = 20;
/// Bars kept by the feature-importance ranker.
pub const TOP_IMPORTANCE: usize = 15;
/// Top features exposed as sliders.
pub const TOP_SLIDERS: usize = 10;
/// Probability gap below which a prediction is flagged uncertain.
pub const UNCERTAINTY_MARGIN: f64 = 0.15;
/// Histograms shown when the visualization page first loads.
pub const DEFAULT_SELECTED_FEATURES: usize = 6;
/// Feature labels in the importance comparison are cut to this width.
pub const COMPARISON_LABEL_WIDTH: usize = 20;

pub const DEFAULT_API_PATH: &str = "/api";
pub const DEFAULT_DEV_PROXY: &str = "http://127.0.0.1:5001";

#[derive(Debug, Clone)]
pub struct Config {
    /// Explicit base URL override; relative values resolve against `dev_proxy`.
    pub api_url: Option<String>,
    /// Origin the relative default API path is served from during development.
    pub dev_proxy: String,
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: None,
            dev_proxy: DEFAULT_DEV_PROXY.to_string(),
            timeout_secs: 30,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            api_url: std::env::var("MLDEMO_API_URL").ok().filter(|v| !v.trim().is_empty()),
            dev_proxy: std::env::var("MLDEMO_DEV_PROXY")
                .unwrap_or_else(|_| DEFAULT_DEV_PROXY.to_string()),
            timeout_secs: std::env::var("MLDEMO_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
        }
    }

    /// Point the client at an explicit backend.
    pub fn with_api_url(api_url: impl Into<String>) -> Self {
        Self {
            api_url: Some(api_url.into()),
            ..Self::default()
        }
    }

    /// Effective API base, always ending in `/` so endpoint names join under it.
    pub fn api_base(&self) -> Result<Url> {
        let raw = self.api_url.as_deref().unwrap_or(DEFAULT_API_PATH).trim();
        let mut base = if raw.starts_with('/') {
            let proxy = Url::parse(&self.dev_proxy)
                .with_context(|| format!("invalid MLDEMO_DEV_PROXY: {}", self.dev_proxy))?;
            proxy
                .join(raw)
                .with_context(|| format!("cannot resolve {} against {}", raw, self.dev_proxy))?
        } else {
            Url::parse(raw).with_context(|| format!("invalid MLDEMO_API_URL: {}", raw))?
        };

        if base.cannot_be_a_base() {
            return Err(anyhow!("API URL cannot carry endpoint paths: {}", base));
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(base)
    }
}
