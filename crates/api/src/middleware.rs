//! API middleware.

#![allow(missing_docs)]

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use folio_common::{AppError, PageCache, StorageBackend, config::AuthConfig};
use folio_core::{CommentService, FollowService, GroupService, PostService, UserService};
use folio_db::{
    entities::user,
    repositories::{
        CommentRepository, FollowRepository, GroupRepository, PostRepository, UserRepository,
    },
};
use sea_orm::DatabaseConnection;
use tracing::debug;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub post_service: PostService,
    pub comment_service: CommentService,
    pub follow_service: FollowService,
    pub group_service: GroupService,
    /// Cache in front of the main feed.
    pub page_cache: PageCache,
    /// Login entry point and session cookie name.
    pub auth: AuthConfig,
}

impl AppState {
    /// Wire repositories and services over one database connection.
    #[must_use]
    pub fn new(
        db: Arc<DatabaseConnection>,
        storage: Arc<dyn StorageBackend>,
        page_cache: PageCache,
        auth: AuthConfig,
        page_size: u64,
    ) -> Self {
        let user_repo = UserRepository::new(Arc::clone(&db));
        let group_repo = GroupRepository::new(Arc::clone(&db));
        let post_repo = PostRepository::new(Arc::clone(&db));
        let comment_repo = CommentRepository::new(Arc::clone(&db));
        let follow_repo = FollowRepository::new(Arc::clone(&db));

        Self {
            user_service: UserService::new(
                user_repo.clone(),
                post_repo.clone(),
                follow_repo.clone(),
            ),
            post_service: PostService::new(
                post_repo.clone(),
                group_repo.clone(),
                user_repo.clone(),
                storage,
                page_size,
            ),
            comment_service: CommentService::new(comment_repo, post_repo, user_repo.clone()),
            follow_service: FollowService::new(follow_repo, user_repo),
            group_service: GroupService::new(group_repo),
            page_cache,
            auth,
        }
    }
}

/// Authentication middleware.
///
/// Resolves the caller from a bearer token or the session cookie and puts
/// the user into request extensions. Unknown tokens leave the request
/// anonymous.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let bearer = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_string);
    let token = bearer.or_else(|| {
        CookieJar::from_headers(req.headers())
            .get(&state.auth.session_cookie)
            .map(|cookie| cookie.value().to_string())
    });

    if let Some(token) = token {
        match state.user_service.authenticate_by_token(&token).await {
            Ok(user) => {
                req.extensions_mut().insert(user);
            }
            Err(AppError::Unauthorized) => debug!("Ignored unknown session token"),
            Err(e) => return e.into_response(),
        }
    }

    next.run(req).await
}

/// Login guard for protected routes.
///
/// Anonymous callers are sent to the login entry point with the path they
/// asked for in `next`.
pub async fn login_required(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if req.extensions().get::<user::Model>().is_some() {
        return next.run(req).await;
    }

    let requested = req
        .uri()
        .path_and_query()
        .map_or_else(|| req.uri().path(), |pq| pq.as_str());
    debug!(path = %requested, "Redirecting anonymous caller to login");
    Redirect::to(&login_redirect(&state.auth.login_url, requested)).into_response()
}

/// Login URL carrying `next` as the return path.
#[must_use]
pub fn login_redirect(login_url: &str, next: &str) -> String {
    let separator = if login_url.contains('?') { '&' } else { '?' };
    let next = urlencoding::encode(next).replace("%2F", "/");
    format!("{login_url}{separator}next={next}")
}
