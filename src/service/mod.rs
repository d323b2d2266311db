//! Tenant-scoped data access and request validation.

mod posts;
mod users;
mod validation;
pub use posts::{CreatePostRequest, Post, PostService};
pub use users::{LoginRequest, RegisterRequest, User, UserService};
pub use validation::{RequestValidator, Validate, MAX_VARCHAR};
