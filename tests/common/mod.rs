#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use serde_json::Value;

use lingua_backend_rust::qlearn::{
    AdaptiveSelector, JsonFileStore, MemoryStore, SelectorConfig, TableStore,
};

pub fn greedy_config() -> SelectorConfig {
    let mut config = SelectorConfig::default();
    config.learning.epsilon = 0.0;
    config
}

pub fn create_selector(
    config: SelectorConfig,
    store: Arc<dyn TableStore>,
) -> Arc<AdaptiveSelector> {
    Arc::new(AdaptiveSelector::new(config, store))
}

pub fn create_file_app(dir: &tempfile::TempDir) -> (Router, Arc<AdaptiveSelector>) {
    let store = Arc::new(JsonFileStore::new(dir.path().join("qtable.json")));
    let selector = create_selector(greedy_config(), store);
    (lingua_backend_rust::create_app(Arc::clone(&selector)), selector)
}

pub fn create_memory_app() -> (Router, Arc<AdaptiveSelector>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let selector = create_selector(greedy_config(), store.clone());
    (lingua_backend_rust::create_app(Arc::clone(&selector)), selector, store)
}

pub fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
