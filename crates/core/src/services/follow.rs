//! Follow service.

use chrono::Utc;
use folio_common::{AppError, AppResult, IdGenerator};
use folio_db::{
    entities::{follow, user},
    repositories::{FollowRepository, UserRepository},
};
use sea_orm::Set;
use tracing::{debug, info};

/// Follow service for business logic.
#[derive(Clone)]
pub struct FollowService {
    follow_repo: FollowRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

impl FollowService {
    /// Create a new follow service.
    #[must_use]
    pub const fn new(follow_repo: FollowRepository, user_repo: UserRepository) -> Self {
        Self {
            follow_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Follow the author called `username`.
    ///
    /// Following yourself, or someone you already follow, changes nothing.
    /// Returns whether a new edge was created.
    pub async fn follow(&self, user_id: &str, username: &str) -> AppResult<bool> {
        let author = self.user_repo.get_by_username(username).await?;

        if author.id == user_id {
            debug!(user_id = %user_id, "Ignored self-follow");
            return Ok(false);
        }

        let model = follow::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            author_id: Set(author.id.clone()),
            created_at: Set(Utc::now().into()),
        };

        let created = self.follow_repo.create_if_absent(model).await?;
        if created {
            info!(user_id = %user_id, author_id = %author.id, "Followed author");
        } else {
            debug!(user_id = %user_id, author_id = %author.id, "Already following");
        }
        Ok(created)
    }

    /// Stop following the author called `username`.
    ///
    /// Returns the author so the caller can link back to them.
    pub async fn unfollow(&self, user_id: &str, username: &str) -> AppResult<user::Model> {
        let author = self.user_repo.get_by_username(username).await?;

        if !self.follow_repo.delete_by_pair(user_id, &author.id).await? {
            return Err(AppError::FollowNotFound(format!(
                "{user_id} -> {}",
                author.username
            )));
        }

        info!(user_id = %user_id, author_id = %author.id, "Unfollowed author");
        Ok(author)
    }

    /// Whether `viewer` follows `author_id`. Anonymous viewers follow nobody.
    pub async fn is_following(&self, viewer: Option<&str>, author_id: &str) -> AppResult<bool> {
        match viewer {
            Some(user_id) if user_id != author_id => {
                self.follow_repo.is_following(user_id, author_id).await
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use folio_db::test_utils::TestDatabase;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn service(db: &TestDatabase) -> FollowService {
        FollowService::new(
            FollowRepository::new(db.connection()),
            UserRepository::new(db.connection()),
        )
    }

    #[tokio::test]
    async fn test_follow_twice_keeps_one_edge() {
        let db = TestDatabase::in_memory().await.unwrap();
        let alice = db.create_user("alice").await.unwrap();
        let bob = db.create_user("bob").await.unwrap();
        let service = service(&db);

        assert!(service.follow(&alice.id, "bob").await.unwrap());
        assert!(!service.follow(&alice.id, "bob").await.unwrap());

        let repo = FollowRepository::new(db.connection());
        assert_eq!(repo.count_followers(&bob.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_follow_self_is_noop() {
        let db = TestDatabase::in_memory().await.unwrap();
        let alice = db.create_user("alice").await.unwrap();
        let service = service(&db);

        assert!(!service.follow(&alice.id, "Alice").await.unwrap());

        let repo = FollowRepository::new(db.connection());
        assert_eq!(repo.count_following(&alice.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_follow_unknown_author() {
        let db = TestDatabase::in_memory().await.unwrap();
        let alice = db.create_user("alice").await.unwrap();

        let result = service(&db).follow(&alice.id, "ghost").await;
        assert!(matches!(result, Err(AppError::UserNotFound(_))));
    }

    #[tokio::test]
    async fn test_unfollow_without_edge_is_not_found() {
        let db = TestDatabase::in_memory().await.unwrap();
        let alice = db.create_user("alice").await.unwrap();
        db.create_user("bob").await.unwrap();

        let result = service(&db).unfollow(&alice.id, "bob").await;
        assert!(matches!(result, Err(AppError::FollowNotFound(_))));
    }

    #[tokio::test]
    async fn test_unfollow_removes_edge() {
        let db = TestDatabase::in_memory().await.unwrap();
        let alice = db.create_user("alice").await.unwrap();
        let bob = db.create_user("bob").await.unwrap();
        db.create_follow(&alice, &bob).await.unwrap();
        let service = service(&db);

        let author = service.unfollow(&alice.id, "bob").await.unwrap();

        assert_eq!(author.id, bob.id);
        assert!(!service.is_following(Some(&alice.id), &bob.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_anonymous_viewer_follows_nobody() {
        // No query results: any database access would fail the test
        let conn = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = FollowService::new(
            FollowRepository::new(conn.clone()),
            UserRepository::new(conn),
        );

        assert!(!service.is_following(None, "u1").await.unwrap());
        assert!(!service.is_following(Some("u1"), "u1").await.unwrap());
    }
}
