use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use url::Url;

use super::{ApiError, DashboardApi, Endpoint};
use crate::config::Config;
use crate::logging::{log, log_request, obj, v_num, v_str, Domain, Level, ProfileScope};
use crate::model::{
    Dataset, DatasetMetadata, FeatureStatistics, FeatureValueVector, HealthStatus, ModelId,
    MultiModelPredictionResult, PredictAllRequest, PredictRequest, PredictionResult,
};

/// reqwest-backed client for the prediction backend.
pub struct HttpApi {
    client: Client,
    base: Url,
}

impl HttpApi {
    pub fn new(cfg: &Config) -> Result<Self> {
        let base = cfg.api_base()?;
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .context("building HTTP client")?;
        log(
            Level::Debug,
            Domain::Config,
            "api_base",
            obj(&[
                ("base", v_str(base.as_str())),
                ("timeout_secs", v_num(cfg.timeout_secs as f64)),
            ]),
        );
        Ok(Self { client, base })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    fn url(&self, endpoint: Endpoint) -> Result<Url, ApiError> {
        self.base
            .join(endpoint.path())
            .map_err(|e| ApiError::Unexpected(format!("{}: {}", endpoint.fallback_message(), e)))
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: Endpoint) -> Result<T, ApiError> {
        let url = self.url(endpoint)?;
        self.execute(endpoint, self.client.get(url)).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.url(endpoint)?;
        self.execute(endpoint, self.client.post(url).json(body)).await
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        let scope =
            ProfileScope::with_context("api_request", &[("endpoint", v_str(endpoint.path()))]);

        let response = match request.send().await {
            Ok(resp) => resp,
            Err(err) => {
                log_request(endpoint.method(), endpoint.path(), None, scope.elapsed_ms());
                return Err(ApiError::from_transport(endpoint, self.base.as_str(), &err));
            }
        };

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| ApiError::from_transport(endpoint, self.base.as_str(), &err))?;
        log_request(endpoint.method(), endpoint.path(), Some(status.as_u16()), scope.elapsed_ms());

        if !status.is_success() {
            return Err(ApiError::from_status(status.as_u16(), &body));
        }
        serde_json::from_slice(&body).map_err(|e| ApiError::schema(endpoint, e.to_string()))
    }
}

fn check<T>(endpoint: Endpoint, value: T, verdict: Result<(), String>) -> Result<T, ApiError> {
    verdict.map_err(|reason| ApiError::schema(endpoint, reason))?;
    Ok(value)
}

fn warn_unnormalized(model: ModelId, result: &PredictionResult) {
    if !result.probabilities.is_normalized() {
        log(
            Level::Warn,
            Domain::Api,
            "unnormalized_probabilities",
            obj(&[
                ("model", v_str(model.as_str())),
                ("sum", v_num(result.probabilities.sum())),
            ]),
        );
    }
}

#[async_trait]
impl DashboardApi for HttpApi {
    async fn health(&self) -> Result<HealthStatus, ApiError> {
        self.get(Endpoint::Health).await
    }

    async fn fetch_metadata(&self) -> Result<DatasetMetadata, ApiError> {
        let meta: DatasetMetadata = self.get(Endpoint::Metadata).await?;
        let verdict = meta.validate();
        check(Endpoint::Metadata, meta, verdict)
    }

    async fn fetch_feature_statistics(&self) -> Result<FeatureStatistics, ApiError> {
        let stats: FeatureStatistics = self.get(Endpoint::FeatureStats).await?;
        let verdict = stats.validate();
        check(Endpoint::FeatureStats, stats, verdict)
    }

    async fn fetch_dataset(&self) -> Result<Dataset, ApiError> {
        let dataset: Dataset = self.get(Endpoint::Dataset).await?;
        let verdict = dataset.validate();
        let dataset = check(Endpoint::Dataset, dataset, verdict)?;
        log(
            Level::Info,
            Domain::Api,
            "dataset_loaded",
            obj(&[
                ("endpoint", v_str(Endpoint::Dataset.path())),
                ("rows", v_num(dataset.len() as f64)),
                ("fingerprint", v_str(&dataset.fingerprint())),
            ]),
        );
        Ok(dataset)
    }

    async fn predict_one(
        &self,
        model: ModelId,
        features: &FeatureValueVector,
    ) -> Result<PredictionResult, ApiError> {
        let body = PredictRequest { model, features };
        let result: PredictionResult = self.post(Endpoint::Predict, &body).await?;
        let verdict = result.validate();
        let result = check(Endpoint::Predict, result, verdict)?;
        warn_unnormalized(model, &result);
        Ok(result)
    }

    async fn predict_all(
        &self,
        features: &FeatureValueVector,
    ) -> Result<MultiModelPredictionResult, ApiError> {
        let body = PredictAllRequest { features };
        let results: MultiModelPredictionResult = self.post(Endpoint::PredictAll, &body).await?;
        let verdict = results.validate();
        let results = check(Endpoint::PredictAll, results, verdict)?;
        for (model, result) in results.iter() {
            warn_unnormalized(*model, result);
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_urls_join_under_base() {
        let api = HttpApi::new(&Config::with_api_url("http://localhost:5000/api")).unwrap();
        assert_eq!(
            api.url(Endpoint::FeatureStats).unwrap().as_str(),
            "http://localhost:5000/api/feature-stats"
        );
        assert_eq!(
            api.url(Endpoint::PredictAll).unwrap().as_str(),
            "http://localhost:5000/api/predict-all"
        );
    }

    #[test]
    fn invalid_base_fails_construction() {
        assert!(HttpApi::new(&Config::with_api_url("::nope::")).is_err());
    }
}
