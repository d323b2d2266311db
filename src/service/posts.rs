//! Posts of one tenant database.

use crate::error::AppError;
use crate::service::validation::{RequestValidator, Validate, MAX_VARCHAR};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use utoipa::ToSchema;

#[derive(Clone, Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct Post {
    pub id: i32,
    pub user_id: i32,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Deserialize, ToSchema)]
pub struct CreatePostRequest {
    #[schema(example = "My First Post")]
    pub title: String,
    #[schema(example = "This is the content of my first post")]
    pub content: String,
}

impl Validate for CreatePostRequest {
    fn validate(&self) -> Result<(), AppError> {
        RequestValidator::required("title", &self.title)?;
        RequestValidator::max_length("title", &self.title, MAX_VARCHAR)?;
        RequestValidator::required("content", &self.content)
    }
}

const POST_COLUMNS: &str = "id, user_id, title, content, created_at, updated_at";

pub struct PostService;

impl PostService {
    pub async fn create(pool: &PgPool, user_id: i32, req: &CreatePostRequest) -> Result<Post, AppError> {
        let sql = format!(
            "INSERT INTO posts (user_id, title, content, updated_at) VALUES ($1, $2, $3, NOW()) RETURNING {}",
            POST_COLUMNS
        );
        let post = sqlx::query_as::<_, Post>(&sql)
            .bind(user_id)
            .bind(&req.title)
            .bind(&req.content)
            .fetch_one(pool)
            .await?;
        Ok(post)
    }

    /// All posts, newest first.
    pub async fn list(pool: &PgPool) -> Result<Vec<Post>, AppError> {
        let sql = format!("SELECT {} FROM posts ORDER BY created_at DESC, id DESC", POST_COLUMNS);
        let posts = sqlx::query_as::<_, Post>(&sql).fetch_all(pool).await?;
        Ok(posts)
    }

    pub async fn read(pool: &PgPool, id: i32) -> Result<Option<Post>, AppError> {
        let sql = format!("SELECT {} FROM posts WHERE id = $1", POST_COLUMNS);
        let post = sqlx::query_as::<_, Post>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(post)
    }
}
