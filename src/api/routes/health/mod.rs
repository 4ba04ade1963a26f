//! Router for the liveness check

use std::sync::{Arc, RwLock};

use axum::{Router, routing::get};

use crate::api::state::AppState;

type SharedState = Arc<RwLock<AppState>>;

async fn health_handler() -> &'static str {
    "ok"
}

pub fn router() -> Router<SharedState> {
    Router::new().route("/", get(health_handler))
}
