//! API routes module

pub mod chat;
mod health;

use std::sync::{Arc, RwLock};

use crate::api::state::AppState;
use axum::Router;

type SharedState = Arc<RwLock<AppState>>;

/// Create the combined API router
pub fn router() -> Router<SharedState> {
    Router::new()
        // Conversational assistant
        .nest("/chat", chat::router())
        // Liveness
        .nest("/health", health::router())
}
