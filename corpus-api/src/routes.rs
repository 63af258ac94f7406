//! Route definitions
//!
//! The gateway middleware is layered on the API router only; requests
//! outside the prefix never see identity resolution.

use crate::{gateway, handlers, state::AppState};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};

pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/login", post(handlers::auth::login))
        .route("/logout", post(handlers::auth::logout))
        .route("/attachments", post(handlers::attachments::upload))
        .route(
            "/{collection}",
            get(handlers::content::list).post(handlers::content::create),
        )
        .route(
            "/{collection}/{id}",
            get(handlers::content::get_one)
                .put(handlers::content::replace)
                .patch(handlers::content::patch)
                .delete(handlers::content::delete),
        )
        .route("/{collection}/{id}/move", post(handlers::content::move_page))
        .layer(middleware::from_fn_with_state(state, gateway::resolve))
}
