//! HTTP client for the Obscura backend.

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::error::ApiError;
use crate::types::{
    HealthResponse, IntentResponse, QuoteRequest, QuotesResponse, SwapRequest,
    TransferRequest,
};

/// Production backend.
pub const DEFAULT_BASE_URL: &str = "https://obscurabackend-production.up.railway.app";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Typed client for the backend's REST API.
#[derive(Debug, Clone)]
pub struct ObscuraClient {
    http: reqwest::Client,
    base_url: String,
}

impl ObscuraClient {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        Url::parse(base_url).map_err(|e| ApiError::InvalidUrl(format!("{base_url}: {e}")))?;
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn builder(&self, method: Method, url: &str) -> RequestBuilder {
        self.http
            .request(method, url)
            .header(CONTENT_TYPE, "application/json")
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        url: String,
        body: Option<&(impl Serialize + ?Sized)>,
    ) -> Result<T, ApiError> {
        debug!(%method, %url, "obscura api request");

        let mut request = self.builder(method, &url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<Value>().await {
                Ok(body) => error_message(&body)
                    .unwrap_or_else(|| format!("HTTP {}", status.as_u16())),
                Err(_) => "Unknown error".to_string(),
            };
            warn!(status = status.as_u16(), %url, %message, "obscura api request failed");
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(Method::GET, format!("{}{path}", self.base_url), None::<&Value>)
            .await
    }

    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &(impl Serialize + ?Sized),
    ) -> Result<T, ApiError> {
        self.send(Method::POST, format!("{}{path}", self.base_url), Some(body))
            .await
    }

    /// `GET /health`
    pub async fn health(&self) -> Result<HealthResponse, ApiError> {
        self.get("/health").await
    }

    /// `GET /`, free-form service description.
    pub async fn info(&self) -> Result<Value, ApiError> {
        self.get("/").await
    }

    /// `POST /api/v1/transfer`
    pub async fn transfer(&self, request: &TransferRequest) -> Result<IntentResponse, ApiError> {
        self.post("/api/v1/transfer", request).await
    }

    /// `POST /api/v1/swap`
    pub async fn swap(&self, request: &SwapRequest) -> Result<IntentResponse, ApiError> {
        self.post("/api/v1/swap", request).await
    }

    /// `GET /api/v1/intents/{id}`. The id is percent-encoded as one path
    /// segment.
    pub async fn get_intent(&self, intent_id: &str) -> Result<Value, ApiError> {
        let mut url = Url::parse(&format!("{}/api/v1/intents", self.base_url))
            .map_err(|e| ApiError::InvalidUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl(format!("{} cannot be a base", self.base_url)))?
            .push(intent_id);
        self.send(Method::GET, url.into(), None::<&Value>).await
    }

    /// `POST /api/v1/quotes`
    pub async fn get_quotes(&self, request: &QuoteRequest) -> Result<QuotesResponse, ApiError> {
        self.post("/api/v1/quotes", request).await
    }

    /// `GET /api/v1/batches`
    pub async fn get_batches(&self) -> Result<Value, ApiError> {
        self.get("/api/v1/batches").await
    }
}

/// Non-empty `error` string of a failure body.
fn error_message(body: &Value) -> Option<String> {
    body.get("error")
        .and_then(Value::as_str)
        .filter(|message| !message.is_empty())
        .map(str::to_string)
}

impl Default for ObscuraClient {
    fn default() -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}
