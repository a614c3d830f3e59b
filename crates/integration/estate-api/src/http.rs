//! reqwest implementation of [`PriceApi`]

use crate::{compose_legacy_metadata, PriceApi};
use async_trait::async_trait;
use estate_core::{Error, PredictionMetadata, PredictionRequest, PredictionResult, Result};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

const DEFAULT_PREDICT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// HTTP client for the prediction backend
#[derive(Debug, Clone)]
pub struct HttpPriceApi {
    /// Base URL including the `/api` prefix
    base: Url,
    client: reqwest::Client,
    request_timeout: Duration,
    predict_timeout: Duration,
}

impl HttpPriceApi {
    pub fn new(base_url: &str) -> Result<Self> {
        let base = Url::parse(base_url)
            .map_err(|e| Error::InvalidInput(format!("invalid API base '{}': {}", base_url, e)))?;
        if base.cannot_be_a_base() {
            return Err(Error::InvalidInput(format!(
                "API base '{}' cannot carry a path",
                base_url
            )));
        }
        Ok(Self {
            base,
            client: reqwest::Client::new(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            predict_timeout: DEFAULT_PREDICT_TIMEOUT,
        })
    }

    /// Set the bound on metadata and lookup requests
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the bound on a single predict request
    pub fn predict_timeout(mut self, timeout: Duration) -> Self {
        self.predict_timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        self.base.as_str()
    }

    /// Base URL with `segments` appended, each percent-encoded
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| Error::InvalidInput(format!("API base '{}' cannot carry a path", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T> {
        let url = self.endpoint(segments)?;
        let response = self.get(url).await?;
        decode(response, Some(self.request_timeout)).await
    }

    async fn get(&self, url: Url) -> Result<Response> {
        tracing::debug!("GET {}", url);
        self.client
            .get(url)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| transport_error(e, Some(self.request_timeout)))
    }
}

#[async_trait]
impl PriceApi for HttpPriceApi {
    async fn cities(&self) -> Result<Vec<String>> {
        self.get_json(&["cities"]).await
    }

    async fn districts(&self, city: &str) -> Result<Vec<String>> {
        self.get_json(&["districts", city]).await
    }

    async fn available_dates(&self) -> Result<BTreeMap<i32, Vec<u32>>> {
        self.get_json(&["available-dates"]).await
    }

    async fn metadata(&self) -> Result<PredictionMetadata> {
        let url = self.endpoint(&["model", "metadata"])?;
        let response = self.get(url).await?;

        if response.status() == StatusCode::NOT_FOUND {
            tracing::warn!("Backend has no /model/metadata, composing from legacy endpoints");
            return compose_legacy_metadata(self).await;
        }
        decode(response, Some(self.request_timeout)).await
    }

    async fn predict(&self, request: &PredictionRequest) -> Result<PredictionResult> {
        let url = self.endpoint(&["predict"])?;
        tracing::debug!("POST {}", url);
        let timeout = Some(self.predict_timeout);
        let response = self
            .client
            .post(url)
            .timeout(self.predict_timeout)
            .json(request)
            .send()
            .await
            .map_err(|e| transport_error(e, timeout))?;

        let result: PredictionResult = decode(response, timeout).await?;
        result.validate()
    }
}

fn transport_error(err: reqwest::Error, timeout: Option<Duration>) -> Error {
    match timeout {
        Some(timeout) if err.is_timeout() => Error::Timeout(timeout.as_millis() as u64),
        _ => Error::Network(err.to_string()),
    }
}

async fn decode<T: DeserializeOwned>(response: Response, timeout: Option<Duration>) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        return Err(Error::Network(format!("HTTP {}", status)));
    }
    let body = response
        .bytes()
        .await
        .map_err(|e| transport_error(e, timeout))?;
    serde_json::from_slice(&body).map_err(|e| Error::MalformedResponse(e.to_string()))
}
