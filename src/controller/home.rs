use serde::Serialize;

use super::LoadState;
use crate::api::DashboardApi;
use crate::logging::log_page_error;
use crate::model::DatasetMetadata;
use crate::views::{self, DatasetOverview, PieSlice};

const PAGE: &str = "home";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HomeView {
    pub overview: DatasetOverview,
    pub slices: Vec<PieSlice>,
}

/// Landing page: dataset overview and class balance.
#[derive(Debug, Clone)]
pub struct HomeController {
    state: LoadState,
    metadata: Option<DatasetMetadata>,
}

impl Default for HomeController {
    fn default() -> Self {
        Self { state: LoadState::Loading, metadata: None }
    }
}

impl HomeController {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn mount<A: DashboardApi + ?Sized>(&mut self, api: &A) -> &LoadState {
        self.state = LoadState::Loading;
        match api.fetch_metadata().await {
            Ok(meta) => {
                self.metadata = Some(meta);
                self.state = LoadState::Ready;
            }
            Err(err) => {
                log_page_error(PAGE, "load", &err.to_string());
                self.metadata = None;
                self.state = LoadState::Failed(err.to_string());
            }
        }
        &self.state
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn metadata(&self) -> Option<&DatasetMetadata> {
        self.metadata.as_ref()
    }

    pub fn view(&self) -> Option<HomeView> {
        let meta = self.metadata.as_ref()?;
        Some(HomeView {
            overview: views::dataset_overview(meta),
            slices: views::class_distribution_slices(&meta.class_distribution),
        })
    }
}
