//! User service.

use folio_common::{AppError, AppResult};
use folio_db::{
    entities::user,
    repositories::{FollowRepository, PostRepository, UserRepository},
};
use serde::Serialize;

/// Counters shown on an author's profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileStats {
    /// Posts written by the author.
    pub post_count: u64,
    /// Users following the author.
    pub followers_count: u64,
    /// Authors the user follows.
    pub following_count: u64,
}

/// User service for business logic.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    post_repo: PostRepository,
    follow_repo: FollowRepository,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub const fn new(
        user_repo: UserRepository,
        post_repo: PostRepository,
        follow_repo: FollowRepository,
    ) -> Self {
        Self {
            user_repo,
            post_repo,
            follow_repo,
        }
    }

    /// Get a user by ID.
    pub async fn get(&self, id: &str) -> AppResult<user::Model> {
        self.user_repo.get_by_id(id).await
    }

    /// Get a user by username, ignoring case.
    pub async fn get_by_username(&self, username: &str) -> AppResult<user::Model> {
        self.user_repo.get_by_username(username).await
    }

    /// Authenticate a user by session token.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<user::Model> {
        self.user_repo
            .find_by_token(token)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    /// Post and follow counters for a profile page.
    pub async fn profile_stats(&self, user_id: &str) -> AppResult<ProfileStats> {
        Ok(ProfileStats {
            post_count: self.post_repo.count_by_author(user_id).await?,
            followers_count: self.follow_repo.count_followers(user_id).await?,
            following_count: self.follow_repo.count_following(user_id).await?,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, Value};
    use std::sync::Arc;

    fn create_test_user(id: &str, username: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: username.to_string(),
            username_lower: username.to_lowercase(),
            name: None,
            token: Some("test_token".to_string()),
            is_admin: false,
            created_at: Utc::now().into(),
        }
    }

    fn service(db: MockDatabase) -> UserService {
        let db = Arc::new(db.into_connection());
        UserService::new(
            UserRepository::new(db.clone()),
            PostRepository::new(db.clone()),
            FollowRepository::new(db),
        )
    }

    #[tokio::test]
    async fn test_authenticate_by_token_success() {
        let user = create_test_user("u1", "alice");
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[user.clone()]]),
        );

        let result = service.authenticate_by_token("test_token").await.unwrap();
        assert_eq!(result.id, "u1");
    }

    #[tokio::test]
    async fn test_authenticate_by_token_unknown() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()]),
        );

        let result = service.authenticate_by_token("bogus").await;
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_profile_stats() {
        let count = |n: i64| [[maplit::btreemap! { "num_items" => Value::BigInt(Some(n)) }]];
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results(count(12))
                .append_query_results(count(3))
                .append_query_results(count(4)),
        );

        let stats = service.profile_stats("u1").await.unwrap();
        assert_eq!(
            stats,
            ProfileStats {
                post_count: 12,
                followers_count: 3,
                following_count: 4,
            }
        );
    }
}
