// file: src/utils/validation.rs
// description: input validation for upload paths, queries and endpoints
// reference: input validation patterns

use crate::error::{PipelineError, Result};
use std::path::Path;
use tracing::warn;

pub struct Validator;

impl Validator {
    /// The upload target must exist and be a regular file.
    pub fn validate_file_path(path: &Path) -> Result<()> {
        if !path.exists() {
            return Err(PipelineError::Validation(format!(
                "File does not exist: {}",
                path.display()
            )));
        }

        if !path.is_file() {
            return Err(PipelineError::Validation(format!(
                "Path is not a file: {}",
                path.display()
            )));
        }

        if !Self::has_pdf_extension(path) {
            warn!(
                "{} does not have a .pdf extension, attempting extraction anyway",
                path.display()
            );
        }

        Ok(())
    }

    pub fn has_pdf_extension(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
    }

    pub fn validate_query(query: &str) -> Result<()> {
        if query.trim().is_empty() {
            return Err(PipelineError::Validation(
                "Search query is empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn validate_url(url: &str) -> Result<()> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(PipelineError::Validation(format!(
                "Invalid URL format: {}",
                url
            )));
        }
        Ok(())
    }

    /// Keeps at most `max_chars` characters, cutting on char boundaries.
    pub fn truncate_chars(text: &str, max_chars: usize) -> String {
        match text.char_indices().nth(max_chars) {
            Some((byte_idx, _)) => text[..byte_idx].to_string(),
            None => text.to_string(),
        }
    }
}
