// file: src/backend/client.rs
// description: Elasticsearch REST client handle with connection management
// reference: https://www.elastic.co/guide/en/elasticsearch/reference/current/rest-apis.html

use crate::config::BackendConfig;
use crate::error::{PipelineError, Result};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

/// One connection handle per invocation, borrowed by the index and query
/// clients.
#[derive(Clone)]
pub struct ElasticClient {
    http: Client,
    config: BackendConfig,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorCause,
}

#[derive(Debug, Deserialize)]
struct ErrorCause {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    reason: Option<String>,
}

/// A non-success answer from the backend.
#[derive(Debug, Clone)]
pub struct BackendFailure {
    pub status: StatusCode,
    pub kind: Option<String>,
    pub message: String,
}

impl BackendFailure {
    pub async fn from_response(response: Response) -> Self {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Self::from_body(status, &body)
    }

    pub fn from_body(status: StatusCode, body: &str) -> Self {
        match serde_json::from_str::<ErrorEnvelope>(body) {
            Ok(envelope) => Self {
                status,
                message: envelope
                    .error
                    .reason
                    .unwrap_or_else(|| envelope.error.kind.clone()),
                kind: Some(envelope.error.kind),
            },
            Err(_) => Self {
                status,
                kind: None,
                message: body.trim().to_string(),
            },
        }
    }

    pub fn is_kind(&self, kind: &str) -> bool {
        self.kind.as_deref() == Some(kind)
    }
}

impl std::fmt::Display for BackendFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            Some(kind) => write!(f, "status {} ({}): {}", self.status, kind, self.message),
            None => write!(f, "status {}: {}", self.status, self.message),
        }
    }
}

impl ElasticClient {
    pub fn new(config: BackendConfig) -> Result<Self> {
        info!("Using search backend at {}", config.endpoint);

        let mut builder = Client::builder().danger_accept_invalid_certs(!config.verify_certs);
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        let http = builder
            .build()
            .map_err(|e| PipelineError::Backend(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Fails with [`PipelineError::Unreachable`] unless the root endpoint answers.
    pub async fn ping(&self) -> Result<()> {
        debug!("Checking search backend connection");

        let response = self
            .http
            .get(self.url(""))
            .send()
            .await
            .map_err(|e| self.unreachable(e.to_string()))?;

        if !response.status().is_success() {
            let failure = BackendFailure::from_response(response).await;
            return Err(self.unreachable(failure.to_string()));
        }

        info!("Search backend connection successful");
        Ok(())
    }

    pub async fn index_exists(&self, index: &str) -> Result<bool> {
        let response = self.http.head(self.url(index)).send().await?;

        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(PipelineError::Backend(format!(
                "Unexpected status {} checking index {}",
                status, index
            ))),
        }
    }

    /// Raw create call; "already exists" is left to the caller to judge.
    pub async fn create_index(&self, index: &str) -> std::result::Result<(), BackendFailure> {
        let response = self
            .http
            .put(self.url(index))
            .send()
            .await
            .map_err(|e| BackendFailure {
                status: StatusCode::SERVICE_UNAVAILABLE,
                kind: None,
                message: e.to_string(),
            })?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(BackendFailure::from_response(response).await)
        }
    }

    pub fn http(&self) -> &Client {
        &self.http
    }

    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    pub fn index_name(&self) -> &str {
        &self.config.index_name
    }

    pub fn refresh_on_index(&self) -> bool {
        self.config.refresh_on_index
    }

    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.endpoint.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn unreachable(&self, message: String) -> PipelineError {
        PipelineError::Unreachable {
            endpoint: self.config.endpoint.clone(),
            message,
        }
    }
}
