use thiserror::Error;

use super::user::UserValidationError;

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Validation error: {0}")]
    Validation(#[from] UserValidationError),

    #[error("Duplicate key: {field} '{value}' already exists")]
    DuplicateKey { field: String, value: String },

    #[error("Password hashing failed: {message}")]
    Hashing { message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn duplicate_key(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::DuplicateKey {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn hashing(message: impl Into<String>) -> Self {
        Self::Hashing {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// True for the uniqueness violation raised by a store's email index
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, Self::DuplicateKey { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error() {
        let error = DomainError::from(UserValidationError::NameTooShort {
            field: "firstName",
            min: 2,
        });
        assert_eq!(
            error.to_string(),
            "Validation error: firstName is too short. Minimum length is 2 characters"
        );
    }

    #[test]
    fn test_duplicate_key_error() {
        let error = DomainError::duplicate_key("email", "ann@example.com");
        assert_eq!(
            error.to_string(),
            "Duplicate key: email 'ann@example.com' already exists"
        );
        assert!(error.is_duplicate_key());
    }

    #[test]
    fn test_hashing_error() {
        let error = DomainError::hashing("salt generation failed");
        assert_eq!(
            error.to_string(),
            "Password hashing failed: salt generation failed"
        );
        assert!(!error.is_duplicate_key());
    }
}
