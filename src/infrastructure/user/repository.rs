//! In-memory user repository implementation

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::user::{ensure_password_hashed, Projection, User, UserId, UserRepository};
use crate::domain::DomainError;

/// In-memory implementation of UserRepository
///
/// Records are kept with their password hash; the email index plays the role
/// of a unique index. Locks are always taken records first, then index.
#[derive(Debug)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<UserId, User>>>,
    /// Index for email -> user ID lookup
    email_index: Arc<RwLock<HashMap<String, UserId>>>,
}

impl InMemoryUserRepository {
    /// Create a new empty repository
    pub fn new() -> Self {
        Self {
            users: Arc::new(RwLock::new(HashMap::new())),
            email_index: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Number of stored users
    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn project(user: &User, projection: Projection) -> User {
    if projection.includes_password() {
        user.clone()
    } else {
        user.clone().without_password()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn get(&self, id: &UserId, projection: Projection) -> Result<Option<User>, DomainError> {
        let users = self.users.read().await;
        Ok(users.get(id).map(|u| project(u, projection)))
    }

    async fn get_by_email(
        &self,
        email: &str,
        projection: Projection,
    ) -> Result<Option<User>, DomainError> {
        let users = self.users.read().await;
        let email_index = self.email_index.read().await;

        Ok(email_index
            .get(email)
            .and_then(|id| users.get(id))
            .map(|u| project(u, projection)))
    }

    async fn create(&self, user: User) -> Result<User, DomainError> {
        ensure_password_hashed(&user)?;

        if user.password().is_none() {
            return Err(DomainError::internal(format!(
                "User '{}' has no password",
                user.id()
            )));
        }

        let mut users = self.users.write().await;
        let mut email_index = self.email_index.write().await;

        if users.contains_key(user.id()) {
            return Err(DomainError::duplicate_key("id", user.id().to_string()));
        }

        if email_index.contains_key(user.email()) {
            return Err(DomainError::duplicate_key("email", user.email()));
        }

        email_index.insert(user.email().to_string(), *user.id());
        users.insert(*user.id(), user.clone());
        debug!(user_id = %user.id(), "Stored new user");

        Ok(user)
    }

    async fn update(&self, user: &User) -> Result<User, DomainError> {
        ensure_password_hashed(user)?;

        let mut users = self.users.write().await;
        let mut email_index = self.email_index.write().await;

        let existing = users
            .get(user.id())
            .ok_or_else(|| DomainError::not_found(format!("User '{}' not found", user.id())))?;

        let old_email = existing.email().to_string();
        let new_email = user.email().to_string();

        if old_email != new_email && email_index.contains_key(&new_email) {
            return Err(DomainError::duplicate_key("email", new_email));
        }

        let stored = match (user.password(), existing.password()) {
            (None, Some(hash)) => user.clone().with_stored_password(hash.to_string()),
            _ => user.clone(),
        };

        if old_email != new_email {
            email_index.remove(&old_email);
            email_index.insert(new_email, *user.id());
        }

        users.insert(*user.id(), stored);
        debug!(user_id = %user.id(), "Updated user");

        Ok(user.clone())
    }
}
