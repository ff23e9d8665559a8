//! User infrastructure module
//!
//! This module provides the user record store: password hashing (bcrypt by
//! default, Argon2 optionally), in-memory and PostgreSQL repositories, and the
//! service that hashes passwords before every write.

mod factory;
mod password;
mod postgres_repository;
mod repository;
mod service;

pub use factory::{DynUserService, UserStoreFactory};
pub use password::{
    Argon2Hasher, BcryptHasher, PasswordHasher, DEFAULT_BCRYPT_COST, MAX_BCRYPT_COST,
    MIN_BCRYPT_COST,
};
pub use postgres_repository::{PostgresConfig, PostgresUserRepository, USERS_TABLE};
pub use repository::InMemoryUserRepository;
pub use service::{CreateUserRequest, UserService};
