//! Corpus REST API
//!
//! Exposes the content repository over HTTP: dual authentication (bearer
//! tokens and API keys), field-level visibility, and atomic partial
//! updates against the document store.

pub mod error;
pub mod gateway;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod state;

pub use corpus_core::{init_logging, ApiConfig};
pub use server::{CorpusServer, CorpusServerBuilder};
pub use state::AppState;

use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        Method,
    },
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main application router.
pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE]);

    Router::new()
        .nest(&state.config.prefix(), routes::api_routes(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024)) // 10MB max body size
        .with_state(state)
}
