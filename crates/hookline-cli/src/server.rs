use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};

use hookline_core::ports::{CallbackStore, Clock};

use crate::handlers;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CallbackStore>,
    /// Deadlines are computed as `clock.now() + in`.
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(store: Arc<dyn CallbackStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/callback", post(handlers::create_callback))
        .route("/callback/{id}", get(handlers::get_callback))
        .with_state(state)
}
