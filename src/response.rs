//! Response bodies shared by the handlers.

use serde::Serialize;
use utoipa::ToSchema;

/// Body of a successful register or login.
#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    pub message: String,
    pub token: String,
}

impl TokenResponse {
    pub fn new(message: &str, token: String) -> Self {
        TokenResponse {
            message: message.to_string(),
            token,
        }
    }
}

/// The authenticated caller, as carried in the token.
#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    pub user_id: i32,
    pub tenant_id: i32,
    pub email: String,
}

pub fn error_body(code: &str, message: String) -> serde_json::Value {
    serde_json::json!({
        "error": {
            "code": code,
            "message": message
        }
    })
}
