//! Post endpoints: feeds, detail, create, edit, delete, comment.

use axum::{
    Form, Router,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use folio_common::{AppError, AppResult};
use folio_core::{CommentForm, FormErrors, FormOutcome};
use folio_db::repositories::PostScope;
use tracing::debug;

use crate::{
    extractors::{AuthUser, MaybeAuthUser, PageParam, PostFormPayload},
    middleware::AppState,
    response::{
        CommentFormView, CommentView, GroupPage, GroupView, IndexPage, PostDetailPage,
        PostFormPage, PostFormValues, ProfilePage, Rendered, feed_page,
    },
};

/// Detail page of a post.
pub(crate) fn post_url(post_id: &str) -> String {
    format!("/posts/{}/", urlencoding::encode(post_id))
}

/// Feed of an author.
pub(crate) fn profile_url(username: &str) -> String {
    format!("/profile/{}/", urlencoding::encode(username))
}

/// Main feed, newest first.
pub async fn index(
    State(state): State<AppState>,
    PageParam(page): PageParam,
) -> AppResult<Rendered<IndexPage>> {
    let page = state.post_service.feed(PostScope::All, page).await?;

    Ok(Rendered(IndexPage {
        view: "index",
        page: feed_page(page),
    }))
}

/// Feed of one group.
async fn group_posts(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    PageParam(page): PageParam,
) -> AppResult<Rendered<GroupPage>> {
    let group = state.group_service.get_by_slug(&slug).await?;
    let page = state
        .post_service
        .feed(PostScope::Group(&group.id), page)
        .await?;

    Ok(Rendered(GroupPage {
        view: "group",
        group: group.into(),
        page: feed_page(page),
    }))
}

/// Feed of one author, with follow state for the viewer.
async fn profile(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(username): Path<String>,
    PageParam(page): PageParam,
) -> AppResult<Rendered<ProfilePage>> {
    let author = state.user_service.get_by_username(&username).await?;
    let stats = state.user_service.profile_stats(&author.id).await?;
    let following = state
        .follow_service
        .is_following(viewer.as_ref().map(|v| v.id.as_str()), &author.id)
        .await?;
    let page = state
        .post_service
        .feed(PostScope::Author(&author.id), page)
        .await?;

    Ok(Rendered(ProfilePage {
        view: "profile",
        author: author.into(),
        stats,
        following,
        page: feed_page(page),
    }))
}

/// One post with its comments and an empty comment form.
async fn post_detail(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> AppResult<Rendered<PostDetailPage>> {
    let entry = state.post_service.get(&post_id).await?;
    let author_post_count = state.post_service.count_by_author(&entry.author.id).await?;
    let comments = state.comment_service.list_for_post(&post_id).await?;

    Ok(Rendered(PostDetailPage {
        view: "post_detail",
        post: entry.into(),
        author_post_count,
        comments: comments.into_iter().map(CommentView::from).collect(),
        form: CommentFormView::default(),
    }))
}

async fn render_form(
    state: &AppState,
    post_id: Option<String>,
    values: PostFormValues,
    errors: FormErrors,
) -> AppResult<Response> {
    let groups = state
        .group_service
        .choices()
        .await?
        .into_iter()
        .map(GroupView::from)
        .collect();

    Ok(Rendered(PostFormPage {
        view: "create_post",
        is_edit: post_id.is_some(),
        post_id,
        values,
        errors,
        groups,
    })
    .into_response())
}

/// Empty post form.
async fn create_form(State(state): State<AppState>, AuthUser(_user): AuthUser) -> AppResult<Response> {
    render_form(&state, None, PostFormValues::default(), FormErrors::new()).await
}

/// Publish a post as the caller.
async fn create(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    PostFormPayload(form): PostFormPayload,
) -> AppResult<Response> {
    let values = PostFormValues::from_form(&form, None);

    match state.post_service.create(&user.id, form).await? {
        FormOutcome::Saved(_) => Ok(Redirect::to(&profile_url(&user.username)).into_response()),
        FormOutcome::Invalid(errors) => render_form(&state, None, values, errors).await,
    }
}

/// Post form filled with the current values. Authors only.
async fn edit_form(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(post_id): Path<String>,
) -> AppResult<Response> {
    match state.post_service.get_for_edit(&user.id, &post_id).await {
        Ok(_) => {}
        Err(AppError::Forbidden(_)) => return Ok(Redirect::to(&post_url(&post_id)).into_response()),
        Err(e) => return Err(e),
    }

    let entry = state.post_service.get(&post_id).await?;
    let values = PostFormValues::from_post(&entry.post, entry.image_url);
    render_form(&state, Some(post_id), values, FormErrors::new()).await
}

/// Apply an edit. Non-authors are sent back to the post untouched.
async fn edit(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(post_id): Path<String>,
    PostFormPayload(form): PostFormPayload,
) -> AppResult<Response> {
    let values = PostFormValues::from_form(&form, None);

    match state.post_service.update(&user.id, &post_id, form).await {
        Ok(FormOutcome::Saved(_)) => Ok(Redirect::to(&post_url(&post_id)).into_response()),
        Ok(FormOutcome::Invalid(errors)) => {
            let current = state.post_service.get(&post_id).await?;
            let values = PostFormValues {
                image: current.image_url,
                ..values
            };
            render_form(&state, Some(post_id), values, errors).await
        }
        Err(AppError::Forbidden(_)) => {
            debug!(post_id = %post_id, user_id = %user.id, "Rejected edit by non-author");
            Ok(Redirect::to(&post_url(&post_id)).into_response())
        }
        Err(e) => Err(e),
    }
}

/// Delete a post. Always lands on the main feed.
async fn delete(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(post_id): Path<String>,
) -> AppResult<Redirect> {
    state.post_service.delete(&user.id, &post_id).await?;
    Ok(Redirect::to("/"))
}

/// Comment on a post as the caller.
async fn add_comment(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(post_id): Path<String>,
    Form(form): Form<CommentForm>,
) -> AppResult<Redirect> {
    if let FormOutcome::Invalid(errors) = state
        .comment_service
        .add(&user.id, &post_id, form)
        .await?
    {
        debug!(post_id = %post_id, ?errors, "Dropped invalid comment");
    }
    Ok(Redirect::to(&post_url(&post_id)))
}

/// Routes open to everyone. The main feed is mounted separately, behind the page cache.
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/group/{slug}/", get(group_posts))
        .route("/profile/{username}/", get(profile))
        .route("/posts/{post_id}/", get(post_detail))
}

/// Routes that need a signed-in caller.
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/create/", get(create_form).post(create))
        .route("/posts/{post_id}/edit/", get(edit_form).post(edit))
        .route("/delete/{post_id}", post(delete))
        .route("/posts/{post_id}/comment/", post(add_comment))
}
