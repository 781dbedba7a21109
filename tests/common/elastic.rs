// file: tests/common/elastic.rs
// description: in-process stand-in for the Elasticsearch endpoints the crate uses

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, head, post};
use axum::{Json, Router};
use pdf_search::Config;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

/// Indexing into or searching this index answers with a 500.
pub const FAILING_INDEX: &str = "explode";

#[derive(Default)]
struct FakeState {
    indices: HashMap<String, Vec<Value>>,
    create_calls: usize,
    requests: usize,
    implicit_creates: usize,
    next_id: usize,
}

type Shared = Arc<Mutex<FakeState>>;

pub struct FakeElastic {
    addr: SocketAddr,
    state: Shared,
}

impl FakeElastic {
    pub async fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(FakeState::default()));

        let app = Router::new()
            .route("/", get(root))
            .route("/:index", head(index_exists).put(create_index))
            .route("/:index/_doc", post(index_document))
            .route("/:index/_search", post(search))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    pub fn endpoint(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn config(&self) -> Config {
        let mut config = Config::default_config();
        config.backend.endpoint = self.endpoint();
        config.backend.refresh_on_index = true;
        config.extraction.show_progress = false;
        config
    }

    pub fn create_calls(&self) -> usize {
        self.state.lock().unwrap().create_calls
    }

    pub fn requests(&self) -> usize {
        self.state.lock().unwrap().requests
    }

    /// Documents that arrived before their index had been created.
    pub fn implicit_creates(&self) -> usize {
        self.state.lock().unwrap().implicit_creates
    }

    pub fn documents(&self, index: &str) -> Vec<Value> {
        self.state
            .lock()
            .unwrap()
            .indices
            .get(index)
            .cloned()
            .unwrap_or_default()
    }
}

fn error_body(status: StatusCode, kind: &str, reason: &str) -> (StatusCode, Json<Value>) {
    (
        status,
        Json(json!({
            "error": {"root_cause": [], "type": kind, "reason": reason},
            "status": status.as_u16(),
        })),
    )
}

async fn root(State(state): State<Shared>) -> Json<Value> {
    state.lock().unwrap().requests += 1;
    Json(json!({"name": "fake", "version": {"number": "8.13.0"}, "tagline": "You Know, for Search"}))
}

async fn index_exists(State(state): State<Shared>, Path(index): Path<String>) -> StatusCode {
    let mut state = state.lock().unwrap();
    state.requests += 1;
    if state.indices.contains_key(&index) {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn create_index(
    State(state): State<Shared>,
    Path(index): Path<String>,
) -> (StatusCode, Json<Value>) {
    let mut state = state.lock().unwrap();
    state.requests += 1;

    if state.indices.contains_key(&index) {
        return error_body(
            StatusCode::BAD_REQUEST,
            "resource_already_exists_exception",
            &format!("index [{}] already exists", index),
        );
    }

    state.create_calls += 1;
    state.indices.insert(index.clone(), Vec::new());
    (
        StatusCode::OK,
        Json(json!({"acknowledged": true, "shards_acknowledged": true, "index": index})),
    )
}

async fn index_document(
    State(state): State<Shared>,
    Path(index): Path<String>,
    Json(document): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let mut state = state.lock().unwrap();
    state.requests += 1;

    if index == FAILING_INDEX {
        return error_body(
            StatusCode::INTERNAL_SERVER_ERROR,
            "mapper_parsing_exception",
            "failed to parse document",
        );
    }

    if !state.indices.contains_key(&index) {
        state.implicit_creates += 1;
    }

    state.next_id += 1;
    let id = format!("doc-{}", state.next_id);
    state.indices.entry(index.clone()).or_default().push(json!({
        "_id": id,
        "_source": document,
    }));

    (
        StatusCode::CREATED,
        Json(json!({"_index": index, "_id": id, "result": "created"})),
    )
}

async fn search(
    State(state): State<Shared>,
    Path(index): Path<String>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let mut state = state.lock().unwrap();
    state.requests += 1;

    if index == FAILING_INDEX {
        return error_body(
            StatusCode::INTERNAL_SERVER_ERROR,
            "search_phase_execution_exception",
            "all shards failed",
        );
    }

    let Some(documents) = state.indices.get(&index) else {
        return error_body(
            StatusCode::NOT_FOUND,
            "index_not_found_exception",
            &format!("no such index [{}]", index),
        );
    };

    let hits = run_match(&index, documents, &body);
    (
        StatusCode::OK,
        Json(json!({
            "took": 1,
            "timed_out": false,
            "hits": {"total": {"value": hits.len(), "relation": "eq"}, "hits": hits},
        })),
    )
}

/// Crude `match` + `fuzziness: AUTO` + highlight imitation.
fn run_match(index: &str, documents: &[Value], body: &Value) -> Vec<Value> {
    let query = body["query"]["match"]["text"]["query"]
        .as_str()
        .unwrap_or_default();
    let terms: Vec<String> = query.split_whitespace().map(normalize).collect();
    let size = body["size"].as_u64().unwrap_or(10) as usize;
    let wants_highlight = body["highlight"]["fields"]["text"].is_object();

    let mut scored: Vec<(usize, Value)> = Vec::new();
    for stored in documents {
        let source = &stored["_source"];
        let text = source["text"].as_str().unwrap_or_default();

        let mut score = 0;
        let marked: Vec<String> = text
            .split_whitespace()
            .map(|word| {
                let norm = normalize(word);
                if !norm.is_empty() && terms.iter().any(|t| fuzzy_match(t, &norm)) {
                    score += 1;
                    format!("<em>{}</em>", word)
                } else {
                    word.to_string()
                }
            })
            .collect();

        if score == 0 {
            continue;
        }

        let mut hit = json!({
            "_index": index,
            "_id": stored["_id"],
            "_score": score as f64,
            "_source": source,
        });
        if wants_highlight {
            let fragment: String = marked.join(" ").chars().take(100).collect();
            hit["highlight"] = json!({"text": [fragment]});
        }
        scored.push((score, hit));
    }

    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().take(size).map(|(_, hit)| hit).collect()
}

fn normalize(word: &str) -> String {
    word.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

fn fuzzy_match(term: &str, word: &str) -> bool {
    let allowed = match term.chars().count() {
        0..=2 => 0,
        3..=5 => 1,
        _ => 2,
    };
    levenshtein(term, word) <= allowed
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b.len()).collect();

    for (i, ca) in a.iter().enumerate() {
        let mut current = vec![i + 1; b.len() + 1];
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != cb);
            current[j + 1] = substitution.min(previous[j + 1] + 1).min(current[j] + 1);
        }
        previous = current;
    }

    previous[b.len()]
}
