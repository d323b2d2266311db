//! Posts of the caller's tenant.

use crate::error::AppError;
use crate::extractors::AuthUser;
use crate::handlers::auth::tenant_pool;
use crate::service::{CreatePostRequest, Post, PostService, RequestValidator, Validate};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

#[utoipa::path(
    post,
    path = "/posts",
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "Post created", body = Post),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer" = [])),
    tag = "posts"
)]
pub async fn create_post(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(body): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<Post>), AppError> {
    body.validate()?;
    let pool = tenant_pool(&state, claims.tenant_id).await?;
    let post = PostService::create(&pool, claims.user_id, &body).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

#[utoipa::path(
    get,
    path = "/posts",
    responses(
        (status = 200, description = "Posts, newest first", body = [Post]),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer" = [])),
    tag = "posts"
)]
pub async fn list_posts(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<Vec<Post>>, AppError> {
    let pool = tenant_pool(&state, claims.tenant_id).await?;
    Ok(Json(PostService::list(&pool).await?))
}

#[utoipa::path(
    get,
    path = "/posts/{id}",
    params(("id" = i32, Path, description = "Post id")),
    responses(
        (status = 200, description = "The post", body = Post),
        (status = 404, description = "No such post in this tenant")
    ),
    security(("bearer" = [])),
    tag = "posts"
)]
pub async fn get_post(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<i32>,
) -> Result<Json<Post>, AppError> {
    RequestValidator::positive_id("id", id)?;
    let pool = tenant_pool(&state, claims.tenant_id).await?;
    let post = PostService::read(&pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("post {}", id)))?;
    Ok(Json(post))
}
