//! User validation utilities

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Errors that can occur during user validation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum UserValidationError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{field} is too short. Minimum length is {min} characters")]
    NameTooShort { field: &'static str, min: usize },

    #[error("Invalid E-mail Address: '{0}'")]
    InvalidEmail(String),
}

/// Minimum length of first and last names, in characters
pub const MIN_NAME_LENGTH: usize = 2;

/// Basic `local@domain.tld` shape
static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r".+@.+\..+").unwrap());

/// Validate a first or last name
///
/// Rules:
/// - Cannot be empty
/// - Minimum 2 characters
pub fn validate_name(field: &'static str, value: &str) -> Result<(), UserValidationError> {
    if value.is_empty() {
        return Err(UserValidationError::Missing(field));
    }

    if value.chars().count() < MIN_NAME_LENGTH {
        return Err(UserValidationError::NameTooShort {
            field,
            min: MIN_NAME_LENGTH,
        });
    }

    Ok(())
}

/// Validate an email address
///
/// Only the shape is checked here; uniqueness belongs to the store.
pub fn validate_email(email: &str) -> Result<(), UserValidationError> {
    if email.is_empty() {
        return Err(UserValidationError::Missing("email"));
    }

    if !EMAIL_PATTERN.is_match(email) {
        return Err(UserValidationError::InvalidEmail(email.to_string()));
    }

    Ok(())
}

/// Validate that a password was supplied
///
/// No length or complexity policy is applied.
pub fn validate_password(password: Option<&str>) -> Result<(), UserValidationError> {
    match password {
        Some(p) if !p.is_empty() => Ok(()),
        _ => Err(UserValidationError::Missing("password")),
    }
}
