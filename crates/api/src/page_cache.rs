//! Full-page cache middleware.
//!
//! Successful GET responses are buffered, stored under the request path
//! and replayed byte for byte until the entry expires or the cache is
//! flushed. Cache failures never fail the request; the page is rendered
//! as if the cache were empty.

use axum::{
    body::{Body, to_bytes},
    extract::State,
    http::{HeaderValue, Method, Request, StatusCode, header::CONTENT_TYPE},
    middleware::Next,
    response::{IntoResponse, Response},
};
use folio_common::{AppError, CachedPage, cache_key};
use tracing::warn;

use crate::middleware::AppState;

/// Serve GET requests from the page cache, filling it on a miss.
pub async fn cache_page(State(state): State<AppState>, req: Request<Body>, next: Next) -> Response {
    if req.method() != Method::GET {
        return next.run(req).await;
    }

    let key = cache_key(req.uri());
    match state.page_cache.get(&key).await {
        Ok(Some(page)) => return replay(page),
        Ok(None) => {}
        Err(e) => warn!(error = %e, key = %key, "Page cache lookup failed"),
    }

    let response = next.run(req).await;
    if response.status() != StatusCode::OK {
        return response;
    }

    let (parts, body) = response.into_parts();
    let body = match to_bytes(body, usize::MAX).await {
        Ok(body) => body,
        Err(e) => return AppError::Internal(format!("Failed to buffer page: {e}")).into_response(),
    };

    let content_type = parts
        .headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();
    let page = CachedPage {
        content_type,
        body: body.clone(),
    };
    if let Err(e) = state.page_cache.set(&key, page).await {
        warn!(error = %e, key = %key, "Failed to store page");
    }

    Response::from_parts(parts, Body::from(body))
}

fn replay(page: CachedPage) -> Response {
    let mut response = Response::new(Body::from(page.body));
    if let Ok(value) = HeaderValue::from_str(&page.content_type) {
        response.headers_mut().insert(CONTENT_TYPE, value);
    }
    response
}
