//! Follow endpoints.

use axum::{
    Router,
    extract::{Path, State},
    response::Redirect,
    routing::get,
};
use folio_common::AppResult;
use folio_db::repositories::PostScope;

use crate::{
    endpoints::posts::profile_url,
    extractors::{AuthUser, PageParam},
    middleware::AppState,
    response::{FollowPage, Rendered, feed_page},
};

/// Posts by everyone the caller follows.
async fn follow_index(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    PageParam(page): PageParam,
) -> AppResult<Rendered<FollowPage>> {
    let page = state
        .post_service
        .feed(PostScope::FollowedBy(&user.id), page)
        .await?;

    Ok(Rendered(FollowPage {
        view: "follow",
        page: feed_page(page),
    }))
}

/// Follow an author. Repeats and self-follows are ignored.
async fn follow_author(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(username): Path<String>,
) -> AppResult<Redirect> {
    state.follow_service.follow(&user.id, &username).await?;
    Ok(Redirect::to("/follow/"))
}

/// Stop following an author.
async fn unfollow_author(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(username): Path<String>,
) -> AppResult<Redirect> {
    let author = state.follow_service.unfollow(&user.id, &username).await?;
    Ok(Redirect::to(&profile_url(&author.username)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/follow/", get(follow_index))
        .route("/profile/{username}/follow/", get(follow_author))
        .route("/profile/{username}/unfollow/", get(unfollow_author))
}
