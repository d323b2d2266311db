//! Tenant creation.

use crate::error::AppError;
use crate::service::Validate;
use crate::state::AppState;
use crate::tenant::{CreateTenantRequest, Tenant};
use axum::{extract::State, http::StatusCode, Json};

#[utoipa::path(
    post,
    path = "/tenants",
    request_body = CreateTenantRequest,
    responses(
        (status = 201, description = "Tenant database created", body = Tenant),
        (status = 409, description = "Name or database already taken"),
        (status = 422, description = "Invalid name")
    ),
    tag = "tenants"
)]
pub async fn create_tenant(
    State(state): State<AppState>,
    Json(body): Json<CreateTenantRequest>,
) -> Result<(StatusCode, Json<Tenant>), AppError> {
    body.validate()?;
    let tenant = state.provisioner.create_tenant(&body.name).await?;
    Ok((StatusCode::CREATED, Json(tenant)))
}
