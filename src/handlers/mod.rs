//! HTTP handlers for tenants, authentication and posts.

pub mod auth;
pub mod post;
pub mod tenant;
pub use auth::{login, me, register};
pub use post::{create_post, get_post, list_posts};
pub use tenant::create_tenant;
