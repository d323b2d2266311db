//! OpenAPI document served at `/openapi.json`.

use crate::handlers;
use crate::response::{MeResponse, TokenResponse};
use crate::service::{CreatePostRequest, LoginRequest, Post, RegisterRequest};
use crate::tenant::{CreateTenantRequest, Tenant};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::tenant::create_tenant,
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::me,
        handlers::post::create_post,
        handlers::post::list_posts,
        handlers::post::get_post,
    ),
    components(schemas(
        Tenant,
        CreateTenantRequest,
        RegisterRequest,
        LoginRequest,
        TokenResponse,
        MeResponse,
        Post,
        CreatePostRequest,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "tenants", description = "Tenant provisioning"),
        (name = "auth", description = "Per-tenant users and tokens"),
        (name = "posts", description = "Posts of the caller's tenant")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
