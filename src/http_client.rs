//! HTTP client wrapper (§4.6): typed POST calls to the inference server,
//! response-shape validation, and structured error classification. Mirrors
//! the single-client, one-method-per-endpoint shape this codebase already
//! uses for its LLM API client.

use crate::domain::wire::{
    L1PredictResult, L2PredictResult, L3PredictResult, UserInputL1, UserInputL2, UserInputL3,
    ValidationErrorBody,
};
use crate::error::{EngineError, Result};
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;
use tracing::warn;

/// Thin wrapper around a shared `reqwest::Client`, safe for concurrent use.
#[derive(Clone)]
pub struct PredictionHttpClient {
    client: Client,
    base_url: String,
}

impl PredictionHttpClient {
    pub fn new(base_url: impl Into<String>, timeout: std::time::Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EngineError::config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, base_url: base_url.into() })
    }

    pub async fn predict_l1(&self, input: &UserInputL1) -> Result<Vec<L1PredictResult>> {
        let raw: Vec<L1PredictResult> = self.post("/predict/l1", input, None).await?;
        Ok(filter_valid(raw, |r| !r.priority_type.is_empty(), "predict_l1"))
    }

    pub async fn predict_l1_batch(
        &self,
        items: &[UserInputL1],
        concurrency: usize,
    ) -> Result<Vec<L1PredictResult>> {
        let body = json!({ "items": items });
        let raw: Vec<Vec<L1PredictResult>> = self
            .post("/predict/l1/batch", &body, Some(("concurrency", concurrency.to_string())))
            .await?;
        let flattened: Vec<L1PredictResult> = raw.into_iter().flatten().collect();
        Ok(filter_valid(flattened, |r| !r.priority_type.is_empty(), "predict_l1/batch"))
    }

    pub async fn predict_l2(&self, input: &UserInputL2) -> Result<Vec<L2PredictResult>> {
        let raw: Vec<L2PredictResult> = self.post("/predict/l2", input, None).await?;
        Ok(filter_valid(raw, |r| !r.admission_code.is_empty(), "predict_l2"))
    }

    pub async fn predict_l2_batch(
        &self,
        items: &[UserInputL2],
        concurrency: usize,
    ) -> Result<Vec<L2PredictResult>> {
        let body = json!({ "items": items });
        let raw: Vec<Vec<L2PredictResult>> = self
            .post("/predict/l2/batch", &body, Some(("concurrency", concurrency.to_string())))
            .await?;
        let flattened: Vec<L2PredictResult> = raw.into_iter().flatten().collect();
        Ok(filter_valid(flattened, |r| !r.admission_code.is_empty(), "predict_l2/batch"))
    }

    pub async fn calculate_l3(&self, input: &UserInputL3) -> Result<L3PredictResult> {
        self.post("/calculate/l3", input, None).await
    }

    pub async fn calculate_l3_batch(&self, items: &[UserInputL3]) -> Result<Vec<L3PredictResult>> {
        self.post("/calculate/l3/batch", items, None).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        query: Option<(&str, String)>,
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.client.post(&url).json(body);
        if let Some((key, value)) = query {
            req = req.query(&[(key, value)]);
        }

        let response = req.send().await.map_err(|e| {
            EngineError::transport(format!("request to {path} failed: {e}"))
        })?;

        let status = response.status();
        if status == StatusCode::UNPROCESSABLE_ENTITY {
            let body_text = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ValidationErrorBody>(&body_text)
                .map(|b| b.detail.iter().map(|d| d.joined()).collect::<Vec<_>>().join("; "))
                .unwrap_or_else(|_| body_text);
            return Err(EngineError::Validation(detail));
        }
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(EngineError::transport(format!(
                "{path} returned HTTP {status}: {body_text}"
            )));
        }

        let body_text = response.text().await.map_err(|e| {
            EngineError::transport(format!("failed to read response body from {path}: {e}"))
        })?;
        serde_json::from_str(&body_text).map_err(|e| {
            EngineError::transport(format!("failed to parse response body from {path}: {e}"))
        })
    }
}

/// Drops elements failing the shape validator, logging a warning per
/// element; never propagates — an empty result is a legitimate success.
fn filter_valid<T>(items: Vec<T>, is_valid: impl Fn(&T) -> bool, endpoint: &str) -> Vec<T> {
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        if is_valid(&item) {
            out.push(item);
        } else {
            warn!(endpoint, "dropping response element that failed shape validation");
        }
    }
    out
}
