//! Image Service Abstraction
//!
//! Interface to the remote generative image service. One call produces one image for
//! one prompt; retry and backoff live in the generation client, not here. The HTTP
//! implementation speaks the Imagen `:predict` protocol.

use crate::asset::{GeneratedAsset, PNG_MIME};
use crate::error::MediaError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

/// Number of images requested per call.
pub const SAMPLE_COUNT: u32 = 1;

/// Remote image service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base URL, without the `/models/...` suffix
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,

    /// API credential supplied by the host; empty by default
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_model() -> String {
    "imagen-4.0-generate-001".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    120
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            api_key: None,
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl ServiceConfig {
    /// Validate service configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.model.trim().is_empty() {
            return Err("Model cannot be empty".to_string());
        }
        if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
            return Err(format!("Endpoint must be an http(s) URL: {}", self.endpoint));
        }
        if self.request_timeout_secs == 0 {
            return Err("Request timeout must be greater than zero".to_string());
        }
        Ok(())
    }

    /// Credential to pass through, empty when none is configured.
    pub fn api_key_or_empty(&self) -> &str {
        self.api_key.as_deref().unwrap_or("")
    }

    /// Human-readable credential status that never prints the key itself.
    pub fn api_key_status(&self) -> &'static str {
        match self.api_key.as_deref() {
            Some(key) if !key.is_empty() => "configured",
            _ => "not set",
        }
    }
}

/// Image service trait
#[async_trait]
pub trait ImageService: Send + Sync {
    /// Generate one image for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<GeneratedAsset, MediaError>;

    /// Get the service name
    fn service_name(&self) -> &str;

    /// Get the model name
    fn model_name(&self) -> &str;
}

#[derive(Serialize)]
struct PredictRequest<'a> {
    instances: Vec<PredictInstance<'a>>,
    parameters: PredictParameters,
}

#[derive(Serialize)]
struct PredictInstance<'a> {
    prompt: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PredictParameters {
    sample_count: u32,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    bytes_base64_encoded: Option<String>,
    mime_type: Option<String>,
}

fn build_predict_request(prompt: &str) -> PredictRequest<'_> {
    PredictRequest {
        instances: vec![PredictInstance { prompt }],
        parameters: PredictParameters {
            sample_count: SAMPLE_COUNT,
        },
    }
}

fn asset_from_response(response: PredictResponse) -> Result<GeneratedAsset, MediaError> {
    let prediction = response
        .predictions
        .into_iter()
        .next()
        .ok_or(MediaError::MissingPayload)?;

    match prediction.bytes_base64_encoded {
        Some(payload) if !payload.is_empty() => Ok(GeneratedAsset::new(
            payload,
            prediction.mime_type.unwrap_or_else(|| PNG_MIME.to_string()),
        )),
        _ => Err(MediaError::MissingPayload),
    }
}

// Helper function to map HTTP errors to MediaError
fn map_http_error(error: reqwest::Error) -> MediaError {
    if let Some(status) = error.status() {
        map_status(status.as_u16(), &error.to_string())
    } else if error.is_timeout() {
        MediaError::Transport(format!("Request timeout: {}", error))
    } else if error.is_connect() {
        MediaError::Transport(format!("Connection error: {}", error))
    } else {
        MediaError::Transport(format!("HTTP error: {}", error))
    }
}

fn map_status(status: u16, detail: &str) -> MediaError {
    match status {
        401 | 403 => MediaError::ServiceAuthFailed(format!("Authentication failed: {}", detail)),
        429 => MediaError::ServiceRateLimit(format!("Rate limit exceeded: {}", detail)),
        _ => MediaError::ServiceRequestFailed(format!(
            "Request failed with status {}: {}",
            status, detail
        )),
    }
}

fn build_service_http_client(config: &ServiceConfig) -> Result<Client, MediaError> {
    Client::builder()
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .build()
        .map_err(|e| MediaError::ServiceError(format!("Failed to create HTTP client: {}", e)))
}

/// Imagen `:predict` client
pub struct ImagenClient {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl ImagenClient {
    pub fn new(config: &ServiceConfig) -> Result<Self, MediaError> {
        let client = build_service_http_client(config)?;
        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key_or_empty().to_string(),
        })
    }

    fn predict_url(&self) -> String {
        format!("{}/models/{}:predict", self.endpoint, self.model)
    }
}

#[async_trait]
impl ImageService for ImagenClient {
    async fn generate(&self, prompt: &str) -> Result<GeneratedAsset, MediaError> {
        let response = self
            .client
            .post(self.predict_url())
            .query(&[("key", self.api_key.as_str())])
            .header("Content-Type", "application/json")
            .json(&build_predict_request(prompt))
            .send()
            .await
            .map_err(map_http_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(map_status(status.as_u16(), &error_text));
        }

        let body: PredictResponse = response
            .json()
            .await
            .map_err(|e| MediaError::MalformedResponse(format!("Failed to parse response: {}", e)))?;

        asset_from_response(body)
    }

    fn service_name(&self) -> &str {
        "imagen"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Service factory for creating image service clients
pub struct ServiceFactory;

impl ServiceFactory {
    pub fn create_client(config: &ServiceConfig) -> Result<Arc<dyn ImageService>, MediaError> {
        Ok(Arc::new(ImagenClient::new(config)?))
    }
}

// Scripted service for testing
#[cfg(test)]
pub struct MockService {
    script: parking_lot::Mutex<std::collections::VecDeque<Result<GeneratedAsset, MediaError>>>,
    fallback: Result<GeneratedAsset, MediaError>,
    calls: parking_lot::Mutex<Vec<(String, tokio::time::Instant)>>,
}

#[cfg(test)]
impl MockService {
    /// Replays `script` in order, then answers every later call with `fallback`.
    pub fn new(
        script: Vec<Result<GeneratedAsset, MediaError>>,
        fallback: Result<GeneratedAsset, MediaError>,
    ) -> Self {
        Self {
            script: parking_lot::Mutex::new(script.into()),
            fallback,
            calls: parking_lot::Mutex::new(Vec::new()),
        }
    }

    pub fn always_ok(payload: &str) -> Self {
        Self::new(Vec::new(), Ok(GeneratedAsset::png(payload)))
    }

    pub fn always_failing() -> Self {
        Self::new(
            Vec::new(),
            Err(MediaError::ServiceRequestFailed("status 500".to_string())),
        )
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn call_instants(&self) -> Vec<tokio::time::Instant> {
        self.calls.lock().iter().map(|(_, at)| *at).collect()
    }
}

#[cfg(test)]
#[async_trait]
impl ImageService for MockService {
    async fn generate(&self, prompt: &str) -> Result<GeneratedAsset, MediaError> {
        self.calls
            .lock()
            .push((prompt.to_string(), tokio::time::Instant::now()));
        let next = self.script.lock().pop_front();
        next.unwrap_or_else(|| self.fallback.clone())
    }

    fn service_name(&self) -> &str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}
