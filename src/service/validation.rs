//! Request validation for tenant, auth and post bodies.

use crate::error::AppError;
use regex::Regex;

const EMAIL_PATTERN: &str = r"^[^@\s]+@[^@\s]+\.[^@\s]+$";

/// Column limit shared by names, emails and titles.
pub const MAX_VARCHAR: usize = 255;
pub const MIN_PASSWORD: usize = 6;

/// Implemented by request bodies checked before they reach a service.
pub trait Validate {
    fn validate(&self) -> Result<(), AppError>;
}

pub struct RequestValidator;

impl RequestValidator {
    pub fn required(field: &str, value: &str) -> Result<(), AppError> {
        if value.trim().is_empty() {
            return Err(AppError::Validation(format!("{} is required", field)));
        }
        Ok(())
    }

    pub fn max_length(field: &str, value: &str, max: usize) -> Result<(), AppError> {
        if value.chars().count() > max {
            return Err(AppError::Validation(format!(
                "{} must be at most {} characters",
                field, max
            )));
        }
        Ok(())
    }

    pub fn min_length(field: &str, value: &str, min: usize) -> Result<(), AppError> {
        if value.chars().count() < min {
            return Err(AppError::Validation(format!(
                "{} must be at least {} characters",
                field, min
            )));
        }
        Ok(())
    }

    pub fn email(field: &str, value: &str) -> Result<(), AppError> {
        let re = Regex::new(EMAIL_PATTERN)
            .map_err(|_| AppError::Validation(format!("invalid pattern for {}", field)))?;
        if !re.is_match(value) {
            return Err(AppError::Validation(format!("{} must be a valid email", field)));
        }
        Ok(())
    }

    pub fn positive_id(field: &str, value: i32) -> Result<(), AppError> {
        if value <= 0 {
            return Err(AppError::Validation(format!("{} is required", field)));
        }
        Ok(())
    }
}
