//! Comment service.

use std::collections::HashMap;

use chrono::Utc;
use folio_common::{AppError, AppResult, IdGenerator};
use folio_db::{
    entities::{comment, user},
    repositories::{CommentRepository, PostRepository, UserRepository},
};
use sea_orm::Set;
use tracing::info;
use validator::Validate;

use crate::forms::{CommentForm, FormErrors, FormOutcome};

/// A comment together with the user who wrote it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentWithAuthor {
    /// The comment.
    pub comment: comment::Model,
    /// Its author.
    pub author: user::Model,
}

/// Comment service for business logic.
#[derive(Clone)]
pub struct CommentService {
    comment_repo: CommentRepository,
    post_repo: PostRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

impl CommentService {
    /// Create a new comment service.
    #[must_use]
    pub const fn new(
        comment_repo: CommentRepository,
        post_repo: PostRepository,
        user_repo: UserRepository,
    ) -> Self {
        Self {
            comment_repo,
            post_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Add a comment by `author_id` to `post_id`.
    ///
    /// The post must exist; an invalid form writes nothing.
    pub async fn add(
        &self,
        author_id: &str,
        post_id: &str,
        form: CommentForm,
    ) -> AppResult<FormOutcome<comment::Model>> {
        let post = self.post_repo.get_by_id(post_id).await?;

        if let Err(errors) = form.validate() {
            return Ok(FormOutcome::Invalid(FormErrors::from(&errors)));
        }

        let model = comment::ActiveModel {
            id: Set(self.id_gen.generate()),
            post_id: Set(post.id),
            author_id: Set(author_id.to_string()),
            text: Set(form.text),
            created_at: Set(Utc::now().into()),
        };

        let comment = self.comment_repo.create(model).await?;
        info!(comment_id = %comment.id, post_id = %comment.post_id, author_id = %author_id, "Added comment");
        Ok(FormOutcome::Saved(comment))
    }

    /// Comments on a post, oldest first.
    pub async fn list_for_post(&self, post_id: &str) -> AppResult<Vec<CommentWithAuthor>> {
        let comments = self.comment_repo.find_by_post(post_id).await?;

        let mut author_ids: Vec<String> = comments.iter().map(|c| c.author_id.clone()).collect();
        author_ids.sort_unstable();
        author_ids.dedup();

        let authors: HashMap<String, user::Model> = self
            .user_repo
            .find_by_ids(&author_ids)
            .await?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect();

        comments
            .into_iter()
            .map(|comment| {
                let author = authors
                    .get(&comment.author_id)
                    .cloned()
                    .ok_or_else(|| AppError::UserNotFound(comment.author_id.clone()))?;
                Ok(CommentWithAuthor { comment, author })
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Duration;
    use folio_db::test_utils::TestDatabase;

    fn service(db: &TestDatabase) -> CommentService {
        CommentService::new(
            CommentRepository::new(db.connection()),
            PostRepository::new(db.connection()),
            UserRepository::new(db.connection()),
        )
    }

    #[tokio::test]
    async fn test_add_comment_forces_author_and_post() {
        let db = TestDatabase::in_memory().await.unwrap();
        let author = db.create_user("author").await.unwrap();
        let reader = db.create_user("reader").await.unwrap();
        let post = db
            .create_post(&author, "hello", None, Duration::zero())
            .await
            .unwrap();
        let service = service(&db);

        let outcome = service
            .add(&reader.id, &post.id, CommentForm::new("  nice post "))
            .await
            .unwrap();
        let FormOutcome::Saved(comment) = outcome else {
            panic!("expected the comment to be saved");
        };

        assert_eq!(comment.author_id, reader.id);
        assert_eq!(comment.post_id, post.id);
        assert_eq!(comment.text, "nice post");

        let listed = service.list_for_post(&post.id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].author.username, "reader");
    }

    #[tokio::test]
    async fn test_blank_comment_writes_nothing() {
        let db = TestDatabase::in_memory().await.unwrap();
        let author = db.create_user("author").await.unwrap();
        let post = db
            .create_post(&author, "hello", None, Duration::zero())
            .await
            .unwrap();
        let service = service(&db);

        let outcome = service
            .add(&author.id, &post.id, CommentForm::new("   "))
            .await
            .unwrap();

        assert!(matches!(outcome, FormOutcome::Invalid(errors) if !errors.get("text").is_empty()));
        assert!(service.list_for_post(&post.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_comment_on_unknown_post() {
        let db = TestDatabase::in_memory().await.unwrap();
        let author = db.create_user("author").await.unwrap();

        let result = service(&db)
            .add(&author.id, "missing", CommentForm::new("hi"))
            .await;

        assert!(matches!(result, Err(AppError::PostNotFound(_))));
    }

    #[tokio::test]
    async fn test_comments_listed_oldest_first() {
        let db = TestDatabase::in_memory().await.unwrap();
        let author = db.create_user("author").await.unwrap();
        let post = db
            .create_post(&author, "hello", None, Duration::zero())
            .await
            .unwrap();
        db.create_comment(&post, &author, "first").await.unwrap();
        db.create_comment(&post, &author, "second").await.unwrap();

        let texts: Vec<String> = service(&db)
            .list_for_post(&post.id)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.comment.text)
            .collect();

        assert_eq!(texts, ["first", "second"]);
    }
}
