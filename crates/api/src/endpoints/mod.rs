//! HTTP endpoints.

mod admin;
mod follow;
mod posts;

use axum::{
    Router,
    http::{StatusCode, Uri},
    middleware,
    routing::get,
};
use folio_common::AppError;

use crate::middleware::{AppState, auth_middleware, login_required};
use crate::page_cache::cache_page;

async fn health() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(uri.path().to_string())
}

/// Create the application router.
///
/// Every route sees the caller resolved by [`auth_middleware`]; protected
/// routes additionally sit behind [`login_required`], and the main feed
/// behind the page cache.
pub fn router(state: AppState) -> Router {
    let cached = Router::new()
        .route("/", get(posts::index))
        .route_layer(middleware::from_fn_with_state(state.clone(), cache_page));

    let protected = Router::new()
        .merge(posts::protected_router())
        .merge(follow::router())
        .merge(admin::router())
        .route_layer(middleware::from_fn_with_state(state.clone(), login_required));

    Router::new()
        .merge(cached)
        .merge(posts::public_router())
        .merge(protected)
        .route("/healthz", get(health))
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
