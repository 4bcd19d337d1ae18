//! Post repository.

use std::sync::Arc;

use crate::entities::{Post, follow, post};
use folio_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Select,
    sea_query::Query,
};

/// Which posts a feed query covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostScope<'a> {
    /// Every post.
    All,
    /// Posts filed under the group with this ID.
    Group(&'a str),
    /// Posts written by the user with this ID.
    Author(&'a str),
    /// Posts written by anyone the user with this ID follows.
    FollowedBy(&'a str),
}

impl PostScope<'_> {
    fn select(self) -> Select<Post> {
        let query = Post::find();
        let query = match self {
            Self::All => query,
            Self::Group(group_id) => query.filter(post::Column::GroupId.eq(group_id)),
            Self::Author(author_id) => query.filter(post::Column::AuthorId.eq(author_id)),
            Self::FollowedBy(user_id) => query.filter(
                post::Column::AuthorId.in_subquery(
                    Query::select()
                        .column(follow::Column::AuthorId)
                        .from(follow::Entity)
                        .and_where(follow::Column::UserId.eq(user_id))
                        .to_owned(),
                ),
            ),
        };

        // Newest first; the ID breaks ties between posts sharing a timestamp
        query
            .order_by_desc(post::Column::CreatedAt)
            .order_by_desc(post::Column::Id)
    }
}

/// Post repository for database operations.
#[derive(Clone)]
pub struct PostRepository {
    db: Arc<DatabaseConnection>,
}

impl PostRepository {
    /// Create a new post repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a post by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<post::Model>> {
        Post::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a post by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<post::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::PostNotFound(id.to_string()))
    }

    /// Create a new post.
    pub async fn create(&self, model: post::ActiveModel) -> AppResult<post::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a post. Only fields marked as set are written.
    pub async fn update(&self, model: post::ActiveModel) -> AppResult<post::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a post if, and only if, `author_id` wrote it.
    ///
    /// Returns whether a row was removed.
    pub async fn delete_owned(&self, id: &str, author_id: &str) -> AppResult<bool> {
        let result = Post::delete_many()
            .filter(post::Column::Id.eq(id))
            .filter(post::Column::AuthorId.eq(author_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected > 0)
    }

    /// Count the posts in a scope.
    pub async fn count(&self, scope: PostScope<'_>) -> AppResult<u64> {
        scope
            .select()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count posts written by a user.
    pub async fn count_by_author(&self, author_id: &str) -> AppResult<u64> {
        self.count(PostScope::Author(author_id)).await
    }

    /// Fetch one page of a scope, newest first. `page_index` is zero-based.
    pub async fn find_page(
        &self,
        scope: PostScope<'_>,
        page_size: u64,
        page_index: u64,
    ) -> AppResult<Vec<post::Model>> {
        scope
            .select()
            .paginate(self.db.as_ref(), page_size)
            .fetch_page(page_index)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, QueryTrait, Value};

    fn create_test_post(id: &str, author_id: &str) -> post::Model {
        post::Model {
            id: id.to_string(),
            text: format!("post {id}"),
            author_id: author_id.to_string(),
            group_id: None,
            image: None,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<post::Model>::new()])
                .into_connection(),
        );

        let repo = PostRepository::new(db);
        let result = repo.get_by_id("missing").await;

        assert!(matches!(result, Err(AppError::PostNotFound(id)) if id == "missing"));
    }

    #[tokio::test]
    async fn test_count_by_author() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => Value::BigInt(Some(7))
                }]])
                .into_connection(),
        );

        let repo = PostRepository::new(db);
        assert_eq!(repo.count_by_author("u1").await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_find_page_returns_rows() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_post("p2", "u1"), create_test_post("p1", "u1")]])
                .into_connection(),
        );

        let repo = PostRepository::new(db);
        let page = repo.find_page(PostScope::All, 10, 0).await.unwrap();

        assert_eq!(
            page.iter().map(|p| p.id.as_str()).collect::<Vec<_>>(),
            ["p2", "p1"]
        );
    }

    #[tokio::test]
    async fn test_delete_owned_reports_no_match() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = PostRepository::new(db);
        assert!(!repo.delete_owned("p1", "intruder").await.unwrap());
    }

    #[test]
    fn test_followed_scope_uses_subquery() {
        let sql = PostScope::FollowedBy("u1")
            .select()
            .build(DatabaseBackend::Postgres)
            .to_string();

        assert!(sql.contains(r#""post"."author_id" IN (SELECT "author_id" FROM "follow""#));
        assert!(sql.contains(r#"ORDER BY "post"."created_at" DESC, "post"."id" DESC"#));
    }

    #[test]
    fn test_group_scope_filters_by_group() {
        let sql = PostScope::Group("g1")
            .select()
            .build(DatabaseBackend::Postgres)
            .to_string();

        assert!(sql.contains(r#""post"."group_id" = 'g1'"#));
    }

    #[tokio::test]
    async fn test_followed_scope_on_sqlite() {
        use crate::test_utils::TestDatabase;
        use chrono::Duration;

        let db = TestDatabase::in_memory().await.unwrap();
        let reader = db.create_user("reader").await.unwrap();
        let followed = db.create_user("followed").await.unwrap();
        let stranger = db.create_user("stranger").await.unwrap();
        db.create_follow(&reader, &followed).await.unwrap();

        db.create_post(&followed, "older", None, Duration::minutes(2))
            .await
            .unwrap();
        db.create_post(&followed, "newer", None, Duration::minutes(1))
            .await
            .unwrap();
        db.create_post(&stranger, "unrelated", None, Duration::zero())
            .await
            .unwrap();

        let repo = PostRepository::new(db.connection());
        let scope = PostScope::FollowedBy(&reader.id);

        assert_eq!(repo.count(scope).await.unwrap(), 2);
        let texts: Vec<String> = repo
            .find_page(scope, 10, 0)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.text)
            .collect();
        assert_eq!(texts, ["newer", "older"]);
    }
}
