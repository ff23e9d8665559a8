//! Builds a user service from configuration

use std::sync::Arc;

use tracing::info;

use crate::config::{PasswordAlgorithm, PasswordConfig, StorageBackend, StorageConfig};
use crate::domain::user::UserRepository;
use crate::domain::DomainError;

use super::password::{
    Argon2Hasher, BcryptHasher, PasswordHasher, MAX_BCRYPT_COST, MIN_BCRYPT_COST,
};
use super::postgres_repository::{PostgresConfig, PostgresUserRepository};
use super::repository::InMemoryUserRepository;
use super::service::UserService;

/// User service with backends chosen at runtime
pub type DynUserService = UserService<dyn UserRepository, dyn PasswordHasher>;

/// Factory for creating user stores
#[derive(Debug)]
pub struct UserStoreFactory;

impl UserStoreFactory {
    /// Creates a repository based on the storage configuration
    pub async fn create_repository(
        config: &StorageConfig,
    ) -> Result<Arc<dyn UserRepository>, DomainError> {
        match config.backend {
            StorageBackend::Memory => Ok(Arc::new(InMemoryUserRepository::new())),
            StorageBackend::Postgres => {
                let pg = &config.postgres;
                let pg_config = PostgresConfig {
                    url: pg.url.clone(),
                    max_connections: pg.max_connections,
                    min_connections: pg.min_connections,
                    connect_timeout_secs: pg.connect_timeout_secs,
                    idle_timeout_secs: pg.idle_timeout_secs,
                };
                Ok(Arc::new(PostgresUserRepository::connect(&pg_config).await?))
            }
        }
    }

    /// Creates a password hasher based on the password configuration
    pub fn create_hasher(config: &PasswordConfig) -> Result<Arc<dyn PasswordHasher>, DomainError> {
        match config.algorithm {
            PasswordAlgorithm::Bcrypt => {
                if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&config.cost) {
                    return Err(DomainError::configuration(format!(
                        "bcrypt cost must be between {} and {}, got {}",
                        MIN_BCRYPT_COST,
                        MAX_BCRYPT_COST,
                        config.cost
                    )));
                }
                Ok(Arc::new(BcryptHasher::with_cost(config.cost)))
            }
            PasswordAlgorithm::Argon2 => Ok(Arc::new(Argon2Hasher::new())),
        }
    }

    /// Creates a fully wired user service
    pub async fn create(
        storage: &StorageConfig,
        password: &PasswordConfig,
    ) -> Result<DynUserService, DomainError> {
        let hasher = Self::create_hasher(password)?;
        let repository = Self::create_repository(storage).await?;

        info!(
            backend = ?storage.backend,
            algorithm = ?password.algorithm,
            "User store initialized"
        );

        Ok(UserService::new(repository, hasher))
    }
}
