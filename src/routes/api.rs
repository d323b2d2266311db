//! Tenant, authentication and post routes.

use crate::handlers::{create_post, create_tenant, get_post, list_posts, login, me, register};
use crate::state::AppState;
use axum::{routing::get, routing::post, Router};

pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/tenants", post(create_tenant))
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(me))
        .route("/posts", get(list_posts).post(create_post))
        .route("/posts/:id", get(get_post))
        .with_state(state)
}
