// file: src/config.rs
// description: application configuration management with toml support
// reference: https://docs.rs/config

use crate::error::{PipelineError, Result};
use crate::utils::Validator;
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Legacy variable honoured for the backend address.
pub const ENDPOINT_ENV_VAR: &str = "ES_HOST";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub backend: BackendConfig,
    pub extraction: ExtractionConfig,
    pub search: SearchConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    pub endpoint: String,
    pub index_name: String,
    #[serde(default)]
    pub verify_certs: bool,
    #[serde(default)]
    pub refresh_on_index: bool,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExtractionConfig {
    pub ocr_command: String,
    pub ocr_language: String,
    #[serde(default = "default_true")]
    pub show_progress: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    pub fuzziness: String,
    pub max_results: usize,
    pub snippet_length: usize,
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Layers built-in defaults, the optional TOML file, `PDF_SEARCH__*`
    /// variables and finally `ES_HOST`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv().ok();

        let defaults = config::Config::try_from(&Self::default_config())
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        let mut builder = config::Config::builder().add_source(defaults);

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(false));
        } else {
            builder = builder.add_source(
                config::File::from(Path::new("config/default.toml")).required(false),
            );
        }

        builder = builder.add_source(
            config::Environment::with_prefix("PDF_SEARCH")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        let mut config: Config = settings
            .try_deserialize()
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        config.apply_endpoint_override(std::env::var(ENDPOINT_ENV_VAR).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self {
            backend: BackendConfig {
                endpoint: "http://localhost:9200".to_string(),
                index_name: "pdf_index".to_string(),
                verify_certs: false,
                refresh_on_index: false,
                timeout_secs: None,
            },
            extraction: ExtractionConfig {
                ocr_command: "tesseract".to_string(),
                ocr_language: "eng".to_string(),
                show_progress: true,
            },
            search: SearchConfig {
                fuzziness: "AUTO".to_string(),
                max_results: 10,
                snippet_length: 50,
            },
        }
    }

    pub fn apply_endpoint_override(&mut self, endpoint: Option<String>) {
        if let Some(endpoint) = endpoint.filter(|e| !e.trim().is_empty()) {
            self.backend.endpoint = endpoint.trim().to_string();
        }
    }

    pub fn validate(&self) -> Result<()> {
        Validator::validate_url(&self.backend.endpoint)
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        if self.backend.index_name.trim().is_empty() {
            return Err(PipelineError::Config(
                "index_name must not be empty".to_string(),
            ));
        }

        if self.search.max_results == 0 {
            return Err(PipelineError::Config(
                "max_results must be greater than 0".to_string(),
            ));
        }

        if self.search.snippet_length == 0 {
            return Err(PipelineError::Config(
                "snippet_length must be greater than 0".to_string(),
            ));
        }

        if self.extraction.ocr_command.trim().is_empty() {
            return Err(PipelineError::Config(
                "ocr_command must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}
