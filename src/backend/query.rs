// file: src/backend/query.rs
// description: fuzzy full-text search with highlighting
// reference: https://www.elastic.co/guide/en/elasticsearch/reference/current/query-dsl-match-query.html

use crate::backend::client::{BackendFailure, ElasticClient};
use crate::config::SearchConfig;
use crate::error::{PipelineError, Result};
use crate::models::SearchHit;
use crate::utils::Validator;
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Field holding the extracted document text.
pub const TEXT_FIELD: &str = "text";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: HitsEnvelope,
}

#[derive(Debug, Deserialize)]
struct HitsEnvelope {
    #[serde(default)]
    hits: Vec<RawHit>,
}

#[derive(Debug, Deserialize)]
struct RawHit {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_score", default)]
    score: Option<f64>,
    #[serde(rename = "_source", default)]
    source: RawSource,
    #[serde(default)]
    highlight: HashMap<String, Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSource {
    text: String,
    filename: String,
    path: String,
}

pub struct QueryClient<'a> {
    client: &'a ElasticClient,
    fuzziness: String,
    max_results: usize,
}

impl<'a> QueryClient<'a> {
    pub fn new(client: &'a ElasticClient, config: &SearchConfig) -> Self {
        Self {
            client,
            fuzziness: config.fuzziness.clone(),
            max_results: config.max_results,
        }
    }

    pub fn build_query(&self, query: &str) -> Value {
        json!({
            "size": self.max_results,
            "query": {
                "match": {
                    TEXT_FIELD: {
                        "query": query,
                        "fuzziness": self.fuzziness,
                    }
                }
            },
            "highlight": {
                "fields": {
                    TEXT_FIELD: {}
                }
            }
        })
    }

    /// Hits in backend relevance order. `Ok(vec![])` means no match; a
    /// failed request is an error. A missing index has no matches.
    pub async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        Validator::validate_query(query)?;

        let index = self.client.index_name();
        info!("Searching '{}' for: {}", index, query);

        let response = self
            .client
            .http()
            .post(self.client.url(&format!("{}/_search", index)))
            .json(&self.build_query(query))
            .send()
            .await
            .map_err(|e| PipelineError::Backend(format!("Search request failed: {}", e)))?;

        if !response.status().is_success() {
            let failure = BackendFailure::from_response(response).await;
            if failure.is_kind("index_not_found_exception") {
                warn!("Index '{}' does not exist, nothing has been uploaded yet", index);
                return Ok(Vec::new());
            }
            return Err(PipelineError::Backend(format!("Search failed with {}", failure)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| PipelineError::Backend(format!("Failed to read search response: {}", e)))?;

        let hits = parse_hits(&body)?;
        info!("Search returned {} hits", hits.len());
        Ok(hits)
    }
}

pub fn parse_hits(body: &str) -> Result<Vec<SearchHit>> {
    let response: SearchResponse = serde_json::from_str(body)?;

    let hits = response
        .hits
        .hits
        .into_iter()
        .map(|mut raw| {
            let highlights = raw.highlight.remove(TEXT_FIELD).unwrap_or_default();
            debug!("Hit {} with {} highlight fragments", raw.id, highlights.len());
            SearchHit {
                id: raw.id,
                score: raw.score,
                text: raw.source.text,
                filename: raw.source.filename,
                path: raw.source.path,
                highlights,
            }
        })
        .collect();

    Ok(hits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_query_body() {
        let config = Config::default_config();
        let client = ElasticClient::new(config.backend.clone()).unwrap();
        let query_client = QueryClient::new(&client, &config.search);

        let body = query_client.build_query("invoice total");
        assert_eq!(
            body,
            json!({
                "size": 10,
                "query": {"match": {"text": {"query": "invoice total", "fuzziness": "AUTO"}}},
                "highlight": {"fields": {"text": {}}}
            })
        );
    }

    #[test]
    fn test_parse_hits_keeps_order_and_highlights() {
        let body = r#"{
            "took": 3,
            "hits": {
                "total": {"value": 2, "relation": "eq"},
                "max_score": 1.4,
                "hits": [
                    {
                        "_index": "pdf_index", "_id": "a1", "_score": 1.4,
                        "_source": {"text": "invoice 2024 total due", "filename": "march.pdf", "path": "/srv/march.pdf"},
                        "highlight": {"text": ["<em>invoice</em> 2024 total due"]}
                    },
                    {
                        "_index": "pdf_index", "_id": "b2", "_score": 0.3,
                        "_source": {"text": "invoices archive", "filename": "old.pdf", "path": "old.pdf"}
                    }
                ]
            }
        }"#;

        let hits = parse_hits(body).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, "a1");
        assert_eq!(hits[0].filename, "march.pdf");
        assert_eq!(hits[0].first_highlight(), Some("<em>invoice</em> 2024 total due"));
        assert_eq!(hits[1].id, "b2");
        assert_eq!(hits[1].score, Some(0.3));
        assert!(hits[1].highlights.is_empty());
    }

    #[test]
    fn test_parse_empty_hits() {
        let body = r#"{"hits": {"total": {"value": 0, "relation": "eq"}, "max_score": null, "hits": []}}"#;
        assert!(parse_hits(body).unwrap().is_empty());
    }

    #[test]
    fn test_parse_malformed_body() {
        assert!(matches!(
            parse_hits("<html>bad gateway</html>"),
            Err(PipelineError::Serialization(_))
        ));
    }
}
