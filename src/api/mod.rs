use async_trait::async_trait;

use crate::model::{
    Dataset, DatasetMetadata, FeatureStatistics, FeatureValueVector, HealthStatus, ModelId,
    MultiModelPredictionResult, PredictionResult,
};

mod error;
mod http;

pub use error::ApiError;
pub use http::HttpApi;

/// The backend operations the dashboard consumes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Endpoint {
    Health,
    Metadata,
    FeatureStats,
    Dataset,
    Predict,
    PredictAll,
}

impl Endpoint {
    /// Path relative to the API base.
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Health => "health",
            Endpoint::Metadata => "metadata",
            Endpoint::FeatureStats => "feature-stats",
            Endpoint::Dataset => "dataset",
            Endpoint::Predict => "predict",
            Endpoint::PredictAll => "predict-all",
        }
    }

    pub fn method(&self) -> &'static str {
        match self {
            Endpoint::Predict | Endpoint::PredictAll => "POST",
            _ => "GET",
        }
    }

    pub fn fallback_message(&self) -> &'static str {
        match self {
            Endpoint::Health => "Failed to check backend health",
            Endpoint::Metadata => "Failed to fetch metadata",
            Endpoint::FeatureStats => "Failed to fetch feature stats",
            Endpoint::Dataset => "Failed to fetch dataset",
            Endpoint::Predict => "Failed to make prediction",
            Endpoint::PredictAll => "Failed to make predictions",
        }
    }
}

/// Read-mostly view of the prediction backend. Every call is a single
/// attempt; failures come back as [`ApiError`].
#[async_trait]
pub trait DashboardApi: Send + Sync {
    async fn health(&self) -> Result<HealthStatus, ApiError>;
    async fn fetch_metadata(&self) -> Result<DatasetMetadata, ApiError>;
    async fn fetch_feature_statistics(&self) -> Result<FeatureStatistics, ApiError>;
    async fn fetch_dataset(&self) -> Result<Dataset, ApiError>;
    async fn predict_one(
        &self,
        model: ModelId,
        features: &FeatureValueVector,
    ) -> Result<PredictionResult, ApiError>;
    async fn predict_all(
        &self,
        features: &FeatureValueVector,
    ) -> Result<MultiModelPredictionResult, ApiError>;
}
