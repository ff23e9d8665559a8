//! Card Game Users
//!
//! Persistent user records for a collectible card game:
//! - Player profile with characters, owned cards, decks, stats and settings
//! - Passwords hashed with bcrypt (cost 10) before every write that changes them
//! - Password hashes excluded from reads unless explicitly requested
//! - In-memory or PostgreSQL storage with a unique email index

pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;
pub use domain::{DomainError, Projection, User, UserId, UserRepository};
pub use infrastructure::user::{
    CreateUserRequest, DynUserService, PasswordHasher, UserService, UserStoreFactory,
};

use tracing::info;

/// Create the user service with the default configuration
pub async fn create_user_service() -> Result<DynUserService, DomainError> {
    create_user_service_with_config(&AppConfig::default()).await
}

/// Create the user service with custom configuration
pub async fn create_user_service_with_config(
    config: &AppConfig,
) -> Result<DynUserService, DomainError> {
    info!("Storage backend: {:?}", config.storage.backend);

    UserStoreFactory::create(&config.storage, &config.password).await
}
