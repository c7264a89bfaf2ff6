//! Strive: turns recorded GPX tracks into stored activity summaries.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod routes;
pub mod service;
pub mod state;
pub mod store;
pub mod types;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// The full HTTP application for `state`.
pub fn app(state: state::AppState) -> Router {
    let max_file_size = state.config.max_file_size;

    routes::router()
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(axum::extract::DefaultBodyLimit::max(max_file_size))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
