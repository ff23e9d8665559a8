//! PostgreSQL user repository implementation
//!
//! Each user is one row: the document (every field except the password) as
//! JSONB, with `email` lifted into its own column under a unique index and the
//! password hash kept in a column that only the password projection selects.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::{debug, info};

use crate::domain::user::{ensure_password_hashed, Projection, User, UserId, UserRepository};
use crate::domain::DomainError;

/// Name of the users collection
pub const USERS_TABLE: &str = "users";

/// PostgreSQL connection configuration
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of connections to maintain
    pub min_connections: u32,
    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,
    /// Idle timeout in seconds
    pub idle_timeout_secs: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/card_game".to_string(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout_secs: 30,
            idle_timeout_secs: 600,
        }
    }
}

impl PostgresConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn with_min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }
}

/// PostgreSQL implementation of UserRepository
#[derive(Debug, Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a connection pool and make sure the users table exists
    pub async fn connect(config: &PostgresConfig) -> Result<Self, DomainError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(std::time::Duration::from_secs(config.connect_timeout_secs))
            .idle_timeout(std::time::Duration::from_secs(config.idle_timeout_secs))
            .connect(&config.url)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to connect to PostgreSQL: {}", e)))?;

        let repository = Self::new(pool);
        repository.ensure_schema().await?;

        info!(table = USERS_TABLE, "PostgreSQL user store ready");
        Ok(repository)
    }

    /// Returns a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates the users table and its unique email index if missing
    pub async fn ensure_schema(&self) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id UUID PRIMARY KEY,
                email TEXT NOT NULL,
                password TEXT NOT NULL,
                document JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to create users table: {}", e)))?;

        sqlx::query("CREATE UNIQUE INDEX IF NOT EXISTS users_email_key ON users (email)")
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to create email index: {}", e)))?;

        Ok(())
    }

    async fn fetch_one_by(
        &self,
        column: &str,
        bind: FetchKey<'_>,
        projection: Projection,
    ) -> Result<Option<User>, DomainError> {
        let query = format!(
            "SELECT {} FROM users WHERE {} = $1",
            select_columns(projection),
            column
        );

        let query = sqlx::query(&query);
        let query = match bind {
            FetchKey::Id(id) => query.bind(*id.as_uuid()),
            FetchKey::Email(email) => query.bind(email),
        };

        let row = query
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get user: {}", e)))?;

        row.map(|row| row_to_user(&row, projection)).transpose()
    }
}

enum FetchKey<'a> {
    Id(&'a UserId),
    Email(&'a str),
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn get(&self, id: &UserId, projection: Projection) -> Result<Option<User>, DomainError> {
        self.fetch_one_by("id", FetchKey::Id(id), projection).await
    }

    async fn get_by_email(
        &self,
        email: &str,
        projection: Projection,
    ) -> Result<Option<User>, DomainError> {
        self.fetch_one_by("email", FetchKey::Email(email), projection)
            .await
    }

    async fn create(&self, user: User) -> Result<User, DomainError> {
        ensure_password_hashed(&user)?;

        let password = user.password().ok_or_else(|| {
            DomainError::internal(format!("User '{}' has no password", user.id()))
        })?;
        let document = user_to_document(&user)?;

        sqlx::query(
            r#"
            INSERT INTO users (id, email, password, document, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(*user.id().as_uuid())
        .bind(user.email())
        .bind(password)
        .bind(&document)
        .bind(user.created_at())
        .bind(user.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, &user, "create"))?;

        debug!(user_id = %user.id(), "Stored new user");
        Ok(user)
    }

    async fn update(&self, user: &User) -> Result<User, DomainError> {
        ensure_password_hashed(user)?;

        let document = user_to_document(user)?;

        // An unset password leaves the stored hash in place
        let result = sqlx::query(
            r#"
            UPDATE users
            SET email = $2, password = COALESCE($3, password), document = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(*user.id().as_uuid())
        .bind(user.email())
        .bind(user.password())
        .bind(&document)
        .bind(user.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, user, "update"))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(format!(
                "User '{}' not found",
                user.id()
            )));
        }

        debug!(user_id = %user.id(), "Updated user");
        Ok(user.clone())
    }

    async fn email_exists(&self, email: &str) -> Result<bool, DomainError> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to check email: {}", e)))
    }
}

fn select_columns(projection: Projection) -> &'static str {
    if projection.includes_password() {
        "document, password"
    } else {
        "document"
    }
}

fn user_to_document(user: &User) -> Result<serde_json::Value, DomainError> {
    serde_json::to_value(user)
        .map_err(|e| DomainError::storage(format!("Failed to serialize user: {}", e)))
}

fn document_to_user(
    document: serde_json::Value,
    password: Option<String>,
) -> Result<User, DomainError> {
    let user: User = serde_json::from_value(document)
        .map_err(|e| DomainError::storage(format!("Failed to deserialize user: {}", e)))?;

    Ok(match password {
        Some(hash) => user.with_stored_password(hash),
        None => user,
    })
}

fn row_to_user(row: &PgRow, projection: Projection) -> Result<User, DomainError> {
    let document: serde_json::Value = row
        .try_get("document")
        .map_err(|e| DomainError::storage(format!("Failed to read user document: {}", e)))?;

    let password = if projection.includes_password() {
        let hash: String = row
            .try_get("password")
            .map_err(|e| DomainError::storage(format!("Failed to read password: {}", e)))?;
        Some(hash)
    } else {
        None
    };

    document_to_user(document, password)
}

fn map_write_error(error: sqlx::Error, user: &User, action: &str) -> DomainError {
    let unique_violation = error
        .as_database_error()
        .is_some_and(|db| db.is_unique_violation());

    if !unique_violation {
        return DomainError::storage(format!("Failed to {} user: {}", action, error));
    }

    let on_email = error
        .as_database_error()
        .and_then(|db| db.constraint())
        .is_some_and(|c| c.contains("email"));

    if on_email {
        DomainError::duplicate_key("email", user.email())
    } else {
        DomainError::duplicate_key("id", user.id().to_string())
    }
}
