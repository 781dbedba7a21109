// file: src/models/search_result.rs
// description: Search hits returned by the backend and their presentation form
// reference: Used for fuzzy full-text search results

use crate::utils::Validator;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Backend-assigned document id
    pub id: String,

    /// Relevance score, absent when the backend does not report one
    pub score: Option<f64>,

    /// Extracted document text as persisted
    pub text: String,

    pub filename: String,

    pub path: String,

    /// Highlight fragments for the text field, in backend order
    pub highlights: Vec<String>,
}

impl SearchHit {
    pub fn first_highlight(&self) -> Option<&str> {
        self.highlights.first().map(String::as_str)
    }
}

/// One entry of the printed result list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormattedResult {
    pub filename: String,
    pub path: String,
    pub highlighted: String,
}

impl FormattedResult {
    /// Takes the first `max_chars` characters of the first highlight
    /// fragment, or an empty string when the hit has none.
    pub fn from_hit(hit: &SearchHit, max_chars: usize) -> Self {
        let highlighted = hit
            .first_highlight()
            .map(|fragment| Validator::truncate_chars(fragment, max_chars))
            .unwrap_or_default();

        Self {
            filename: hit.filename.clone(),
            path: hit.path.clone(),
            highlighted,
        }
    }
}
