// file: src/pipeline/orchestrator.rs
// description: coordinates extraction, index management and search for one invocation
// reference: orchestrates the upload and search workflows

use crate::backend::{DocumentIndexer, ElasticClient, IndexManager, IndexStatus, QueryClient};
use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::exporter::JsonExporter;
use crate::extractor::{Extraction, TextExtractor};
use crate::models::{DocumentRecord, FormattedResult};
use crate::utils::{OperationTimer, Validator};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

const SLOW_EXTRACTION: Duration = Duration::from_secs(120);

#[derive(Debug, Clone)]
pub struct UploadReport {
    pub document_id: String,
    pub record: DocumentRecord,
    pub extraction: Extraction,
    pub index_status: IndexStatus,
}

pub struct PipelineOrchestrator<'a> {
    config: &'a Config,
    client: &'a ElasticClient,
}

impl<'a> PipelineOrchestrator<'a> {
    pub fn new(config: &'a Config, client: &'a ElasticClient) -> Self {
        Self { config, client }
    }

    /// Ensure index, extract, index. The index is confirmed before any text is
    /// submitted; an empty extraction is still indexed.
    pub async fn upload(&self, path: &Path, extractor: TextExtractor) -> Result<UploadReport> {
        Validator::validate_file_path(path)?;

        let index_status = IndexManager::new(self.client).ensure_index().await?;

        let extraction = Self::run_extraction(path, extractor).await?;
        let record = DocumentRecord::from_path(extraction.text.clone(), path);
        if record.is_empty() {
            warn!(
                "No text could be extracted from {}, indexing an empty document",
                path.display()
            );
        }

        let document_id = DocumentIndexer::new(self.client)
            .index_document(&record)
            .await?;

        Ok(UploadReport {
            document_id,
            record,
            extraction,
            index_status,
        })
    }

    pub async fn search(&self, query: &str) -> Result<Vec<FormattedResult>> {
        let hits = QueryClient::new(self.client, &self.config.search)
            .search(query)
            .await?;

        Ok(JsonExporter::new(self.config.search.snippet_length).format(&hits))
    }

    async fn run_extraction(path: &Path, extractor: TextExtractor) -> Result<Extraction> {
        let owned_path = path.to_path_buf();

        let extraction = tokio::task::spawn_blocking(move || {
            let timer = OperationTimer::new("text extraction");
            let extraction = extractor.extract(&owned_path);
            timer.warn_if_slow(SLOW_EXTRACTION, &owned_path.display().to_string());
            timer.finish();
            extraction
        })
        .await
        .map_err(|e| PipelineError::Pdf(format!("Extraction task failed: {}", e)))?;

        info!(
            "Extracted {} characters via {}",
            extraction.text.chars().count(),
            extraction.method
        );
        Ok(extraction)
    }
}
