//! Operational endpoints.

use axum::{Router, extract::State, http::StatusCode, routing::post};
use folio_common::{AppError, AppResult};
use tracing::info;

use crate::{extractors::AuthUser, middleware::AppState};

/// Drop every cached page.
async fn flush_cache(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> AppResult<StatusCode> {
    if !user.is_admin {
        return Err(AppError::Forbidden(
            "Only administrators can flush the page cache".to_string(),
        ));
    }

    state.page_cache.flush().await?;
    info!(user_id = %user.id, "Page cache flushed by administrator");
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<AppState> {
    Router::new().route("/admin/cache/flush", post(flush_cache))
}
