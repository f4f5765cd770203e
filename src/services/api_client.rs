//! Ticket backend API client.
//!
//! Provides the HTTP client every resource service goes through: one request
//! per call, JSON bodies, the backend's error envelope decoded into
//! [`AppError::Api`], and streamed multipart uploads with progress events.

use crate::error::{AppError, CODE_NOT_LOGGED_IN, CODE_NO_PERMISSION};
use crate::models::{SelectedFile, UploadEvent};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Size of one streamed upload chunk.
const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// Multipart field name of an uploaded file.
const UPLOAD_FIELD: &str = "tiedosto";

/// API client configuration.
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Base URL, e.g. `https://tickets.example.com/api`.
    pub base_url: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self {
            base_url: crate::config::DEFAULT_API_BASE_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

impl From<&crate::config::AppConfig> for ApiClientConfig {
    fn from(config: &crate::config::AppConfig) -> Self {
        Self {
            base_url: config.api_base_url.clone(),
            timeout_secs: config.timeout_secs,
        }
    }
}

/// Error envelope of the backend: `{"error": {"tunnus": 1000, "virheilmoitus": "..."}}`.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    tunnus: Option<i64>,
    virheilmoitus: Option<String>,
}

/// Ticket backend API client.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    config: ApiClientConfig,
}

impl ApiClient {
    /// Create a new client. The cookie jar keeps the session cookie set by
    /// the auth endpoint.
    pub fn new(config: ApiClientConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Decode a response: the typed body on success, the error envelope
    /// otherwise. An empty success body reads as JSON `null`.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: Response,
        endpoint: &str,
    ) -> Result<T, AppError> {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if status.is_success() {
            let body = if body.trim().is_empty() { "null" } else { body.as_str() };
            return serde_json::from_str(body).map_err(|e| {
                AppError::internal(format!("Failed to parse response from {}: {}", endpoint, e))
            });
        }

        let envelope = serde_json::from_str::<ErrorEnvelope>(&body).ok();
        let code = envelope
            .as_ref()
            .and_then(|e| e.error.tunnus)
            .or(match status {
                StatusCode::UNAUTHORIZED => Some(CODE_NOT_LOGGED_IN),
                StatusCode::FORBIDDEN => Some(CODE_NO_PERMISSION),
                _ => None,
            });
        let message = envelope
            .and_then(|e| e.error.virheilmoitus)
            .unwrap_or_else(|| match status {
                StatusCode::NOT_FOUND => "Resource not found".to_string(),
                _ => format!("Request failed ({})", status.as_u16()),
            });

        log::debug!(
            "[api] {} failed with {} (code {:?})",
            endpoint,
            status.as_u16(),
            code
        );
        Err(AppError::api_full(message, status.as_u16(), endpoint, code))
    }

    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, AppError> {
        let response = self.client.get(self.api_url(endpoint)).send().await?;
        self.handle_response(response, endpoint).await
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T, AppError> {
        let response = self
            .client
            .post(self.api_url(endpoint))
            .json(body)
            .send()
            .await?;
        self.handle_response(response, endpoint).await
    }

    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T, AppError> {
        let response = self
            .client
            .put(self.api_url(endpoint))
            .json(body)
            .send()
            .await?;
        self.handle_response(response, endpoint).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, AppError> {
        let response = self.client.delete(self.api_url(endpoint)).send().await?;
        self.handle_response(response, endpoint).await
    }

    /// Upload one file as multipart form data.
    ///
    /// Events arrive in order: `Sent`, `Progress` as chunks are streamed,
    /// `HeadersReceived`, and `Complete` once the backend accepted the file.
    /// A dropped receiver does not abort the upload.
    pub async fn upload<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        file: &SelectedFile,
        events: &mpsc::UnboundedSender<UploadEvent>,
    ) -> Result<T, AppError> {
        let content = file.content.clone();
        let len = content.len();
        let progress = events.clone();
        let chunks = (0..len).step_by(UPLOAD_CHUNK_SIZE).map(move |start| {
            let end = (start + UPLOAD_CHUNK_SIZE).min(len);
            let _ = progress.send(UploadEvent::Progress((end * 100 / len) as u8));
            Ok::<_, std::io::Error>(content[start..end].to_vec())
        });

        let part = Part::stream_with_length(
            Body::wrap_stream(futures::stream::iter(chunks)),
            len as u64,
        )
        .file_name(file.name.clone());
        let form = Form::new().part(UPLOAD_FIELD, part);

        let _ = events.send(UploadEvent::Sent);
        let response = self
            .client
            .post(self.api_url(endpoint))
            .multipart(form)
            .send()
            .await?;
        let _ = events.send(UploadEvent::HeadersReceived(response.status().as_u16()));

        let result = self.handle_response(response, endpoint).await?;
        let _ = events.send(UploadEvent::Complete);
        Ok(result)
    }
}
