//! Registration, login and the caller's identity.

use crate::error::{AppError, AuthError, TenantError};
use crate::extractors::AuthUser;
use crate::password::{hash_password, verify_password};
use crate::response::{MeResponse, TokenResponse};
use crate::service::{LoginRequest, RegisterRequest, UserService, Validate};
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use sqlx::PgPool;

/// Pool of the tenant named in a request body or carried in a token.
///
/// An id with no directory entry is answered 400 "invalid tenant ID" on every
/// route, including the bearer-authenticated post routes where a signed token
/// names a tenant that is gone. Other registry failures keep their own status.
pub(crate) async fn tenant_pool(state: &AppState, tenant_id: i32) -> Result<PgPool, AppError> {
    state.tenants.resolve(tenant_id).await.map_err(tenant_failure)
}

fn tenant_failure(e: TenantError) -> AppError {
    match e {
        TenantError::UnknownTenant(_) => AppError::BadRequest("invalid tenant ID".into()),
        other => AppError::Tenant(other),
    }
}

async fn blocking<T, F>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, AuthError> + Send + 'static,
    T: Send + 'static,
{
    let out = tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AuthError::Hashing(e.to_string()))??;
    Ok(out)
}

#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = TokenResponse),
        (status = 400, description = "Unknown tenant"),
        (status = 409, description = "Email already registered in this tenant")
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), AppError> {
    body.validate()?;
    let pool = tenant_pool(&state, body.tenant_id).await?;
    if UserService::exists_by_email(&pool, &body.email).await? {
        return Err(AppError::Conflict("user already exists".into()));
    }

    let cost = state.bcrypt_cost;
    let password = body.password.clone();
    let hash = blocking(move || hash_password(&password, cost)).await?;
    let user = UserService::create(&pool, &body.email, &hash).await?;
    let token = state.tokens.issue(user.id, body.tenant_id, &user.email)?;

    tracing::info!(tenant_id = body.tenant_id, user_id = user.id, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(TokenResponse::new("User registered successfully", token)),
    ))
}

#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = TokenResponse),
        (status = 400, description = "Unknown tenant"),
        (status = 401, description = "Wrong email or password")
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    body.validate()?;
    let pool = tenant_pool(&state, body.tenant_id).await?;
    let user = UserService::find_by_email(&pool, &body.email)
        .await?
        .ok_or(AuthError::InvalidCredential)?;

    let password = body.password.clone();
    let hash = user.password_hash.clone();
    let matches = blocking(move || Ok(verify_password(&password, &hash))).await?;
    if !matches {
        return Err(AuthError::InvalidCredential.into());
    }

    let token = state.tokens.issue(user.id, body.tenant_id, &user.email)?;
    Ok(Json(TokenResponse::new("Login successful", token)))
}

#[utoipa::path(
    get,
    path = "/me",
    responses(
        (status = 200, description = "Caller identity", body = MeResponse),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn me(AuthUser(claims): AuthUser) -> Json<MeResponse> {
    Json(MeResponse {
        user_id: claims.user_id,
        tenant_id: claims.tenant_id,
        email: claims.email,
    })
}
