//! API route configuration.

use std::sync::Arc;

use axum::{routing::get, Router};

use crate::handlers;
use crate::state::AppState;

/// Creates the API router with all routes configured.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/healthz", get(handlers::healthz))
        
        // Calendar feed (GET also answers HEAD)
        .route("/calendar.ics", get(handlers::calendar))
        
        .with_state(state)
}
