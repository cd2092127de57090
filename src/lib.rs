pub mod config;
pub mod logging;
pub mod qlearn;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;

use std::sync::Arc;

use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::qlearn::{AdaptiveSelector, JsonFileStore, SelectorConfig, TableStore};
use crate::state::AppState;

pub fn create_selector(config: &config::Config) -> Arc<AdaptiveSelector> {
    let store: Arc<dyn TableStore> = Arc::new(JsonFileStore::new(config.qtable_path.clone()));
    Arc::new(AdaptiveSelector::new(SelectorConfig::from_env(), store))
}

pub fn create_app(selector: Arc<AdaptiveSelector>) -> axum::Router {
    routes::router(AppState::new(selector))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
