//! User repository trait

use async_trait::async_trait;
use std::fmt::Debug;

use super::entity::{User, UserId};
use crate::domain::DomainError;

/// Which fields a read returns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Projection {
    /// Every field except the password
    #[default]
    Default,
    /// Every field including the stored password hash
    WithPassword,
}

impl Projection {
    pub fn includes_password(&self) -> bool {
        matches!(self, Self::WithPassword)
    }
}

/// Repository trait for user storage
///
/// Implementations enforce email uniqueness and must refuse a user whose
/// password is still marked modified.
#[async_trait]
pub trait UserRepository: Send + Sync + Debug {
    /// Get a user by their ID
    async fn get(&self, id: &UserId, projection: Projection) -> Result<Option<User>, DomainError>;

    /// Get a user by exact email
    async fn get_by_email(
        &self,
        email: &str,
        projection: Projection,
    ) -> Result<Option<User>, DomainError>;

    /// Insert a new user
    async fn create(&self, user: User) -> Result<User, DomainError>;

    /// Replace an existing user; an unset password keeps the stored hash
    async fn update(&self, user: &User) -> Result<User, DomainError>;

    /// Check if an email is taken
    async fn email_exists(&self, email: &str) -> Result<bool, DomainError> {
        Ok(self.get_by_email(email, Projection::Default).await?.is_some())
    }
}

/// Reject a user that still carries plaintext
pub(crate) fn ensure_password_hashed(user: &User) -> Result<(), DomainError> {
    if user.is_password_modified() {
        return Err(DomainError::internal(format!(
            "User '{}' has an unhashed password",
            user.id()
        )));
    }
    Ok(())
}
