//! Test utilities for database operations.
//!
//! [`TestDatabase`] is a migrated in-memory SQLite database with a few
//! seeding helpers. Each instance is private to the test that created it.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use folio_common::IdGenerator;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, DbErr, Set};
use sea_orm_migration::MigratorTrait;
use tracing::info;

use crate::entities::{comment, follow, group, post, user};
use crate::migrations::Migrator;

/// A migrated, throwaway database.
pub struct TestDatabase {
    /// Database connection.
    pub conn: Arc<DatabaseConnection>,
    id_gen: IdGenerator,
}

impl TestDatabase {
    /// Open a fresh in-memory database and run every migration.
    pub async fn in_memory() -> Result<Self, DbErr> {
        // A single pooled connection: each SQLite memory connection is its own database
        let mut opt = ConnectOptions::new("sqlite::memory:");
        opt.max_connections(1)
            .min_connections(1)
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;
        Migrator::up(&conn, None).await?;

        info!("Created in-memory test database");

        Ok(Self {
            conn: Arc::new(conn),
            id_gen: IdGenerator::new(),
        })
    }

    /// Get the database connection.
    #[must_use]
    pub fn connection(&self) -> Arc<DatabaseConnection> {
        Arc::clone(&self.conn)
    }

    /// Insert a regular user. The session token is `token-{username}`.
    pub async fn create_user(&self, username: &str) -> Result<user::Model, DbErr> {
        self.insert_user(username, false).await
    }

    /// Insert an admin user. The session token is `token-{username}`.
    pub async fn create_admin(&self, username: &str) -> Result<user::Model, DbErr> {
        self.insert_user(username, true).await
    }

    async fn insert_user(&self, username: &str, is_admin: bool) -> Result<user::Model, DbErr> {
        user::ActiveModel {
            id: Set(self.id_gen.generate()),
            username: Set(username.to_string()),
            username_lower: Set(username.to_lowercase()),
            name: Set(None),
            token: Set(Some(format!("token-{username}"))),
            is_admin: Set(is_admin),
            created_at: Set(Utc::now().into()),
        }
        .insert(self.conn.as_ref())
        .await
    }

    /// Insert a group.
    pub async fn create_group(&self, title: &str, slug: &str) -> Result<group::Model, DbErr> {
        group::ActiveModel {
            id: Set(self.id_gen.generate()),
            title: Set(title.to_string()),
            slug: Set(slug.to_string()),
            description: Set(String::new()),
            created_at: Set(Utc::now().into()),
        }
        .insert(self.conn.as_ref())
        .await
    }

    /// Insert a post published `age` ago.
    ///
    /// Explicit ages keep feed order deterministic regardless of how fast
    /// the rows are written.
    pub async fn create_post(
        &self,
        author: &user::Model,
        text: &str,
        group: Option<&group::Model>,
        age: Duration,
    ) -> Result<post::Model, DbErr> {
        self.create_post_at(author, text, group, Utc::now() - age)
            .await
    }

    /// Insert a post with an exact publication time.
    pub async fn create_post_at(
        &self,
        author: &user::Model,
        text: &str,
        group: Option<&group::Model>,
        created_at: DateTime<Utc>,
    ) -> Result<post::Model, DbErr> {
        post::ActiveModel {
            id: Set(self.id_gen.generate()),
            text: Set(text.to_string()),
            author_id: Set(author.id.clone()),
            group_id: Set(group.map(|g| g.id.clone())),
            image: Set(None),
            created_at: Set(created_at.into()),
        }
        .insert(self.conn.as_ref())
        .await
    }

    /// Insert a comment.
    pub async fn create_comment(
        &self,
        post: &post::Model,
        author: &user::Model,
        text: &str,
    ) -> Result<comment::Model, DbErr> {
        comment::ActiveModel {
            id: Set(self.id_gen.generate()),
            post_id: Set(post.id.clone()),
            author_id: Set(author.id.clone()),
            text: Set(text.to_string()),
            created_at: Set(Utc::now().into()),
        }
        .insert(self.conn.as_ref())
        .await
    }

    /// Insert a follow edge from `user` to `author`.
    pub async fn create_follow(
        &self,
        user: &user::Model,
        author: &user::Model,
    ) -> Result<follow::Model, DbErr> {
        follow::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user.id.clone()),
            author_id: Set(author.id.clone()),
            created_at: Set(Utc::now().into()),
        }
        .insert(self.conn.as_ref())
        .await
    }
}
