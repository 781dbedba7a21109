// file: src/backend/index.rs
// description: index existence management and document submission
// reference: https://www.elastic.co/guide/en/elasticsearch/reference/current/docs-index_.html

use crate::backend::client::{BackendFailure, ElasticClient};
use crate::error::{PipelineError, Result};
use crate::models::DocumentRecord;
use serde::Deserialize;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexStatus {
    Existing,
    Created,
}

pub struct IndexManager<'a> {
    client: &'a ElasticClient,
}

impl<'a> IndexManager<'a> {
    pub fn new(client: &'a ElasticClient) -> Self {
        Self { client }
    }

    /// Creates the configured index if it is missing. Safe to call repeatedly;
    /// any failure here must stop the upload.
    pub async fn ensure_index(&self) -> Result<IndexStatus> {
        let index = self.client.index_name();

        let exists = self
            .client
            .index_exists(index)
            .await
            .map_err(|e| PipelineError::IndexCreation {
                index: index.to_string(),
                message: e.to_string(),
            })?;

        if exists {
            debug!("Index '{}' exists", index);
            return Ok(IndexStatus::Existing);
        }

        warn!("Index '{}' does not exist, creating it", index);

        match self.client.create_index(index).await {
            Ok(()) => {
                info!("Created index '{}'", index);
                Ok(IndexStatus::Created)
            }
            Err(failure) if failure.is_kind("resource_already_exists_exception") => {
                info!("Index '{}' was created concurrently", index);
                Ok(IndexStatus::Existing)
            }
            Err(failure) => Err(PipelineError::IndexCreation {
                index: index.to_string(),
                message: failure.to_string(),
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct IndexResponse {
    #[serde(rename = "_id")]
    id: String,
}

pub struct DocumentIndexer<'a> {
    client: &'a ElasticClient,
}

impl<'a> DocumentIndexer<'a> {
    pub fn new(client: &'a ElasticClient) -> Self {
        Self { client }
    }

    /// Submits one record and returns the backend id. No retry.
    pub async fn index_document(&self, record: &DocumentRecord) -> Result<String> {
        let index = self.client.index_name();
        let mut url = self.client.url(&format!("{}/_doc", index));
        if self.client.refresh_on_index() {
            url.push_str("?refresh=wait_for");
        }
        let request = self.client.http().post(url).json(record);

        debug!(
            "Indexing {} ({} characters) into '{}'",
            record.filename,
            record.text.chars().count(),
            index
        );

        let response = request
            .send()
            .await
            .map_err(|e| self.submit_error(record, e.to_string()))?;

        if !response.status().is_success() {
            let failure = BackendFailure::from_response(response).await;
            return Err(self.submit_error(record, failure.to_string()));
        }

        let body: IndexResponse = response
            .json()
            .await
            .map_err(|e| self.submit_error(record, format!("Unreadable response: {}", e)))?;

        info!("Indexed {} as document {}", record.path, body.id);
        Ok(body.id)
    }

    fn submit_error(&self, record: &DocumentRecord, message: String) -> PipelineError {
        PipelineError::IndexSubmit {
            path: record.path.clone(),
            message,
        }
    }
}
