use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{error, info};
use uuid::Uuid;

use crate::domain::error::DomainError;
use crate::domain::post::{NewPost, Post, PostPatch, PostWithAuthor};
use crate::domain::user::PublicProfile;

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create(&self, new: NewPost) -> Result<Post, DomainError>;
    async fn find_with_author(&self, id: i64) -> Result<Option<PostWithAuthor>, DomainError>;
    async fn update(&self, id: i64, patch: PostPatch) -> Result<Option<Post>, DomainError>;
    async fn delete(&self, id: i64) -> Result<bool, DomainError>;
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<PostWithAuthor>, DomainError>;
    async fn list_by_author(
        &self,
        author_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PostWithAuthor>, DomainError>;
    async fn count(&self) -> Result<i64, DomainError>;
    async fn count_by_author(&self, author_id: Uuid) -> Result<i64, DomainError>;
}

#[derive(Clone)]
pub struct PostgresPostRepository {
    pool: PgPool,
}

impl PostgresPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Flat row for the posts-with-author JOIN; sqlx has no nested FromRow.
#[derive(sqlx::FromRow)]
struct PostAuthorRow {
    id: i64,
    author_id: Uuid,
    title: String,
    content: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    username: String,
    first_name: String,
    last_name: String,
    email: String,
}

impl From<PostAuthorRow> for PostWithAuthor {
    fn from(row: PostAuthorRow) -> Self {
        PostWithAuthor {
            post: Post {
                id: row.id,
                author_id: row.author_id,
                title: row.title,
                content: row.content,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
            author: PublicProfile {
                id: row.author_id,
                username: row.username,
                first_name: row.first_name,
                last_name: row.last_name,
                email: row.email,
            },
        }
    }
}

const POST_AUTHOR_SELECT: &str = r#"
    SELECT p.id, p.author_id, p.title, p.content, p.created_at, p.updated_at,
           u.username, u.first_name, u.last_name, u.email
    FROM posts p
    JOIN users u ON u.id = p.author_id
"#;

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn create(&self, new: NewPost) -> Result<Post, DomainError> {
        let now = Utc::now();
        let post = sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (author_id, title, content, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            RETURNING id, author_id, title, content, created_at, updated_at
            "#,
        )
        .bind(new.author_id)
        .bind(&new.title)
        .bind(&new.content)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to create post: {}", e);
            DomainError::Internal(format!("database error: {}", e))
        })?;

        info!(post_id = %post.id, author_id = %post.author_id, "post created");
        Ok(post)
    }

    async fn find_with_author(&self, id: i64) -> Result<Option<PostWithAuthor>, DomainError> {
        let query = format!("{} WHERE p.id = $1", POST_AUTHOR_SELECT);
        sqlx::query_as::<_, PostAuthorRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map(|row| row.map(PostWithAuthor::from))
            .map_err(|e| {
                error!("db error find_with_author {}: {}", id, e);
                DomainError::Internal(e.to_string())
            })
    }

    async fn update(&self, id: i64, patch: PostPatch) -> Result<Option<Post>, DomainError> {
        let now = Utc::now();
        let post = sqlx::query_as::<_, Post>(
            r#"
            UPDATE posts
            SET
                title = COALESCE($1, title),
                content = COALESCE($2, content),
                updated_at = $3
            WHERE id = $4
            RETURNING id, author_id, title, content, created_at, updated_at
            "#,
        )
        .bind(patch.title)
        .bind(patch.content)
        .bind(now)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to update post {}: {}", id, e);
            DomainError::Internal(e.to_string())
        })?;

        if post.is_some() {
            info!(post_id = %id, "post updated");
        }

        Ok(post)
    }

    async fn delete(&self, id: i64) -> Result<bool, DomainError> {
        let deleted = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::Internal(e.to_string()))?;

        if deleted.rows_affected() > 0 {
            info!(post_id = %id, "post deleted");
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<PostWithAuthor>, DomainError> {
        let query = format!(
            "{} ORDER BY p.created_at DESC, p.id DESC LIMIT $1 OFFSET $2",
            POST_AUTHOR_SELECT
        );
        sqlx::query_as::<_, PostAuthorRow>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map(|rows| rows.into_iter().map(PostWithAuthor::from).collect())
            .map_err(|e| {
                error!("db error while fetching posts: {}", e);
                DomainError::Internal(e.to_string())
            })
    }

    async fn list_by_author(
        &self,
        author_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PostWithAuthor>, DomainError> {
        let query = format!(
            "{} WHERE p.author_id = $1 ORDER BY p.created_at DESC, p.id DESC LIMIT $2 OFFSET $3",
            POST_AUTHOR_SELECT
        );
        sqlx::query_as::<_, PostAuthorRow>(&query)
            .bind(author_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map(|rows| rows.into_iter().map(PostWithAuthor::from).collect())
            .map_err(|e| {
                error!("db error while fetching posts for {}: {}", author_id, e);
                DomainError::Internal(e.to_string())
            })
    }

    async fn count(&self) -> Result<i64, DomainError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM posts")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::Internal(e.to_string()))
    }

    async fn count_by_author(&self, author_id: Uuid) -> Result<i64, DomainError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE author_id = $1")
            .bind(author_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::Internal(e.to_string()))
    }
}
