// file: src/models/document.rs
// description: normalized document record submitted to the search index
// reference: internal data structures

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Field names match the `text`, `filename` and `path` fields of the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub text: String,
    pub filename: String,
    pub path: String,
}

impl DocumentRecord {
    pub fn new(text: String, filename: String, path: String) -> Self {
        Self {
            text,
            filename,
            path,
        }
    }

    /// `path` is stored exactly as given; `filename` is its last component.
    pub fn from_path(text: String, path: &Path) -> Self {
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self::new(text, filename, path.display().to_string())
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_record_from_relative_path() {
        let record = DocumentRecord::from_path(
            "invoice 2024 total due".to_string(),
            Path::new("docs/invoices/march.pdf"),
        );

        assert_eq!(record.filename, "march.pdf");
        assert_eq!(record.path, "docs/invoices/march.pdf");
        assert!(!record.is_empty());
    }

    #[test]
    fn test_record_from_absolute_path() {
        let record = DocumentRecord::from_path(String::new(), Path::new("/srv/scans/contract.pdf"));

        assert_eq!(record.filename, "contract.pdf");
        assert_eq!(record.path, "/srv/scans/contract.pdf");
        assert!(record.is_empty());
    }

    #[test]
    fn test_record_serializes_index_fields() {
        let record = DocumentRecord::new(
            "hello".to_string(),
            "a.pdf".to_string(),
            "/tmp/a.pdf".to_string(),
        );

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"text": "hello", "filename": "a.pdf", "path": "/tmp/a.pdf"})
        );
    }
}
