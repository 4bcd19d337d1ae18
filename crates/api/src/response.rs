//! Rendered pages.
//!
//! Every GET page is a JSON document. Field order is fixed by the structs
//! below, so rendering the same data twice yields the same bytes.

use axum::{
    http::header::CONTENT_TYPE,
    response::{IntoResponse, Response},
};
use folio_common::AppError;
use folio_core::{CommentWithAuthor, FormErrors, Page, PostEntry, PostForm, ProfileStats};
use folio_db::entities::{group, post, user};
use serde::Serialize;

/// A page document ready to send.
#[derive(Debug)]
pub struct Rendered<T>(pub T);

impl<T: Serialize> IntoResponse for Rendered<T> {
    fn into_response(self) -> Response {
        match serde_json::to_vec(&self.0) {
            Ok(body) => ([(CONTENT_TYPE, "application/json")], body).into_response(),
            Err(e) => AppError::Internal(format!("Failed to render page: {e}")).into_response(),
        }
    }
}

/// Public view of a user.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: String,
    pub username: String,
    pub name: Option<String>,
}

impl From<user::Model> for UserView {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            name: user.name,
        }
    }
}

/// Public view of a group.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupView {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub description: String,
}

impl From<group::Model> for GroupView {
    fn from(group: group::Model) -> Self {
        Self {
            id: group.id,
            title: group.title,
            slug: group.slug,
            description: group.description,
        }
    }
}

/// A post as shown in feeds and on its detail page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub id: String,
    pub text: String,
    pub created_at: String,
    pub author: UserView,
    pub group: Option<GroupView>,
    pub image: Option<String>,
}

impl From<PostEntry> for PostView {
    fn from(entry: PostEntry) -> Self {
        Self {
            id: entry.post.id,
            text: entry.post.text,
            created_at: entry.post.created_at.to_rfc3339(),
            author: entry.author.into(),
            group: entry.group.map(Into::into),
            image: entry.image_url,
        }
    }
}

/// A comment under a post.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: String,
    pub text: String,
    pub created_at: String,
    pub author: UserView,
}

impl From<CommentWithAuthor> for CommentView {
    fn from(entry: CommentWithAuthor) -> Self {
        Self {
            id: entry.comment.id,
            text: entry.comment.text,
            created_at: entry.comment.created_at.to_rfc3339(),
            author: entry.author.into(),
        }
    }
}

/// A feed page of posts.
pub type FeedPage = Page<PostView>;

/// Convert a page of core entries into views.
#[must_use]
pub fn feed_page(page: Page<PostEntry>) -> FeedPage {
    page.map(PostView::from)
}

/// `GET /`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexPage {
    pub view: &'static str,
    pub page: FeedPage,
}

/// `GET /group/{slug}/`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupPage {
    pub view: &'static str,
    pub group: GroupView,
    pub page: FeedPage,
}

/// `GET /profile/{username}/`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePage {
    pub view: &'static str,
    pub author: UserView,
    pub stats: ProfileStats,
    pub following: bool,
    pub page: FeedPage,
}

/// Empty comment form shown under a post.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentFormView {
    pub text: String,
    pub errors: FormErrors,
}

/// `GET /posts/{post_id}/`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDetailPage {
    pub view: &'static str,
    pub post: PostView,
    pub author_post_count: u64,
    pub comments: Vec<CommentView>,
    pub form: CommentFormView,
}

/// Values shown in a post form.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostFormValues {
    pub text: String,
    pub group: Option<String>,
    pub image: Option<String>,
}

impl PostFormValues {
    /// Values of a stored post.
    #[must_use]
    pub fn from_post(post: &post::Model, image_url: Option<String>) -> Self {
        Self {
            text: post.text.clone(),
            group: post.group_id.clone(),
            image: image_url,
        }
    }

    /// Values of a rejected submission.
    #[must_use]
    pub fn from_form(form: &PostForm, image_url: Option<String>) -> Self {
        Self {
            text: form.text.clone(),
            group: form.group.clone(),
            image: image_url,
        }
    }
}

/// `GET /create/` and `GET /posts/{post_id}/edit/`, or a rejected submission.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostFormPage {
    pub view: &'static str,
    pub is_edit: bool,
    pub post_id: Option<String>,
    pub values: PostFormValues,
    pub errors: FormErrors,
    pub groups: Vec<GroupView>,
}

/// `GET /follow/`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowPage {
    pub view: &'static str,
    pub page: FeedPage,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use chrono::{TimeZone, Utc};

    fn entry() -> PostEntry {
        let created_at = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        PostEntry {
            post: post::Model {
                id: "p1".to_string(),
                text: "hello".to_string(),
                author_id: "u1".to_string(),
                group_id: None,
                image: None,
                created_at: created_at.into(),
            },
            author: user::Model {
                id: "u1".to_string(),
                username: "alice".to_string(),
                username_lower: "alice".to_string(),
                name: None,
                token: Some("secret".to_string()),
                is_admin: true,
                created_at: created_at.into(),
            },
            group: None,
            image_url: None,
        }
    }

    #[test]
    fn test_post_view_hides_private_user_fields() {
        let value = serde_json::to_value(PostView::from(entry())).unwrap();

        assert_eq!(value["author"]["username"], "alice");
        assert_eq!(value["createdAt"], "2025-03-01T12:00:00+00:00");
        assert!(value["author"].get("token").is_none());
        assert!(value["author"].get("isAdmin").is_none());
    }

    #[tokio::test]
    async fn test_rendering_is_deterministic() {
        let render = || {
            Rendered(IndexPage {
                view: "index",
                page: feed_page(Page::from_slice(&[entry()], folio_core::PageNumber::FIRST, 10)),
            })
            .into_response()
        };

        let first = to_bytes(render().into_body(), usize::MAX).await.unwrap();
        let second = to_bytes(render().into_body(), usize::MAX).await.unwrap();
        assert_eq!(first, second);
    }
}
