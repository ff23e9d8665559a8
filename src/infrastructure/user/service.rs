//! User service: validation, password hashing before write, persistence

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::domain::user::{Projection, User, UserId, UserRepository};
use crate::domain::DomainError;

use super::password::PasswordHasher;

/// Registration input; the password is plaintext at this boundary
#[derive(Clone)]
pub struct CreateUserRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for CreateUserRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateUserRequest")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// User record store
///
/// Every write goes through the same sequence: field validation, the
/// password hook, then the repository. Any failure leaves the store untouched.
#[derive(Debug)]
pub struct UserService<R: UserRepository + ?Sized, H: PasswordHasher + ?Sized> {
    repository: Arc<R>,
    hasher: Arc<H>,
}

impl<R, H> UserService<R, H>
where
    R: UserRepository + ?Sized,
    H: PasswordHasher + ?Sized + 'static,
{
    /// Create a new user service
    pub fn new(repository: Arc<R>, hasher: Arc<H>) -> Self {
        Self { repository, hasher }
    }

    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    /// Register a new user
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn create(&self, request: CreateUserRequest) -> Result<User, DomainError> {
        let mut user = User::new(
            request.first_name,
            request.last_name,
            request.email,
            request.password,
        );

        user.validate(true)?;

        // Cheap pre-check; the store's unique index still decides races
        if self.repository.email_exists(user.email()).await? {
            return Err(DomainError::duplicate_key("email", user.email()));
        }

        self.hash_password_if_modified(&mut user).await?;

        let created = self.repository.create(user).await?;
        info!(user_id = %created.id(), "Created user");

        Ok(created.without_password())
    }

    /// Persist changes to an existing user
    ///
    /// The password is re-hashed only if [`User::set_password`] was called
    /// since the record was loaded.
    #[instrument(skip(self, user), fields(user_id = %user.id()))]
    pub async fn update(&self, mut user: User) -> Result<User, DomainError> {
        user.validate(false)?;

        self.hash_password_if_modified(&mut user).await?;

        let updated = self.repository.update(&user).await?;
        debug!("Updated user");

        Ok(updated.without_password())
    }

    /// Replace a user's password with new plaintext
    #[instrument(skip(self, new_password))]
    pub async fn change_password(
        &self,
        id: &UserId,
        new_password: &str,
    ) -> Result<User, DomainError> {
        let mut user = self
            .repository
            .get(id, Projection::Default)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("User '{}' not found", id)))?;

        user.set_password(new_password);
        self.update(user).await
    }

    /// Get a user by ID, without the password
    pub async fn get(&self, id: &UserId) -> Result<Option<User>, DomainError> {
        self.repository.get(id, Projection::Default).await
    }

    /// Get a user by ID including the stored password hash
    pub async fn get_with_password(&self, id: &UserId) -> Result<Option<User>, DomainError> {
        self.repository.get(id, Projection::WithPassword).await
    }

    /// Get a user by email, without the password
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        self.repository.get_by_email(email, Projection::Default).await
    }

    /// Get a user by email including the stored password hash (for login flows)
    pub async fn get_by_email_with_password(
        &self,
        email: &str,
    ) -> Result<Option<User>, DomainError> {
        self.repository
            .get_by_email(email, Projection::WithPassword)
            .await
    }

    /// Pre-persist hook: hash the password if it changed since load
    ///
    /// Runs the hasher on the blocking pool. On failure the user keeps its
    /// plaintext and stays marked modified, which every repository refuses to
    /// store.
    pub async fn hash_password_if_modified(&self, user: &mut User) -> Result<(), DomainError> {
        if !user.is_password_modified() {
            return Ok(());
        }

        let plaintext = user
            .password()
            .map(str::to_string)
            .ok_or_else(|| DomainError::internal("Modified password is missing"))?;

        let hasher = Arc::clone(&self.hasher);
        let hash = tokio::task::spawn_blocking(move || hasher.hash(&plaintext))
            .await
            .map_err(|e| DomainError::hashing(format!("Hashing task failed: {}", e)))?
            .inspect_err(|e| warn!(user_id = %user.id(), error = %e, "Password hashing failed"))?;

        user.apply_password_hash(hash);
        debug!(user_id = %user.id(), "Password hashed");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user::{Character, MockUserRepository, UserValidationError};
    use crate::infrastructure::user::password::{BcryptHasher, MockPasswordHasher};
    use crate::infrastructure::user::repository::InMemoryUserRepository;

    fn create_service() -> UserService<InMemoryUserRepository, BcryptHasher> {
        let repository = Arc::new(InMemoryUserRepository::new());
        let hasher = Arc::new(BcryptHasher::new());
        UserService::new(repository, hasher)
    }

    fn make_request(first: &str, last: &str, email: &str, password: &str) -> CreateUserRequest {
        CreateUserRequest {
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    fn ann() -> CreateUserRequest {
        make_request("Ann", "Lee", "ann@example.com", "hunter2")
    }

    async fn stored_hash(
        service: &UserService<InMemoryUserRepository, BcryptHasher>,
        id: &UserId,
    ) -> String {
        service
            .get_with_password(id)
            .await
            .unwrap()
            .unwrap()
            .password()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn test_create_user_scenario() {
        let service = create_service();

        let user = service.create(ann()).await.unwrap();

        assert_eq!(user.first_name(), "Ann");
        assert_eq!(user.last_name(), "Lee");
        assert_eq!(user.email(), "ann@example.com");
        assert!(user.password().is_none());
        assert!(user.characters().is_empty());
        assert!(user.owned_cards().is_empty());
        assert!(user.decks().is_empty());
        assert_eq!(user.stats().games_played, 0);
        assert_eq!(user.stats().games_won, 0);
        assert_eq!(user.stats().total_xp, 0);
        assert!(user.achievements().is_empty());
        assert!(!user.settings().dark_mode);
        assert!(user.settings().notifications);

        let hash = stored_hash(&service, user.id()).await;
        assert_ne!(hash, "hunter2");
        assert!(service.hasher().verify("hunter2", &hash));
    }

    #[tokio::test]
    async fn test_default_read_omits_password() {
        let service = create_service();
        let user = service.create(ann()).await.unwrap();

        let by_id = service.get(user.id()).await.unwrap().unwrap();
        assert!(by_id.password().is_none());

        let by_email = service.get_by_email("ann@example.com").await.unwrap().unwrap();
        assert!(by_email.password().is_none());
        assert!(!serde_json::to_string(&by_email).unwrap().contains("password"));

        let for_login = service
            .get_by_email_with_password("ann@example.com")
            .await
            .unwrap()
            .unwrap();
        assert!(for_login.password().unwrap().starts_with("$2b$10$"));
    }

    #[tokio::test]
    async fn test_update_other_fields_keeps_hash() {
        let service = create_service();
        let user = service.create(ann()).await.unwrap();
        let original = stored_hash(&service, user.id()).await;

        // loaded without password
        let mut loaded = service.get(user.id()).await.unwrap().unwrap();
        loaded.add_character(Character::new("Zed", "Rogue", "Elf"));
        loaded.record_game(true, 50);
        service.update(loaded).await.unwrap();

        // loaded with password
        let mut loaded = service.get_with_password(user.id()).await.unwrap().unwrap();
        loaded.unlock_achievement("first-win");
        service.update(loaded).await.unwrap();

        assert_eq!(stored_hash(&service, user.id()).await, original);

        let reloaded = service.get(user.id()).await.unwrap().unwrap();
        assert_eq!(reloaded.characters().len(), 1);
        assert_eq!(reloaded.stats().total_xp, 50);
        assert_eq!(reloaded.achievements(), ["first-win"]);
    }

    #[tokio::test]
    async fn test_change_password_rehashes() {
        let service = create_service();
        let user = service.create(ann()).await.unwrap();
        let h1 = stored_hash(&service, user.id()).await;

        service
            .change_password(user.id(), "correct-horse")
            .await
            .unwrap();
        let h2 = stored_hash(&service, user.id()).await;

        assert_ne!(h1, h2);
        assert!(service.hasher().verify("correct-horse", &h2));
        assert!(!service.hasher().verify("hunter2", &h2));
    }

    #[tokio::test]
    async fn test_set_password_through_update() {
        let service = create_service();
        let user = service.create(ann()).await.unwrap();

        let mut loaded = service.get(user.id()).await.unwrap().unwrap();
        loaded.set_password("s3cret");
        service.update(loaded).await.unwrap();

        let hash = stored_hash(&service, user.id()).await;
        assert!(service.hasher().verify("s3cret", &hash));
    }

    #[tokio::test]
    async fn test_writing_back_stored_hash_keeps_it() {
        let service = create_service();
        let user = service.create(ann()).await.unwrap();
        let h1 = stored_hash(&service, user.id()).await;

        let mut loaded = service.get_with_password(user.id()).await.unwrap().unwrap();
        loaded.set_password(h1.clone());
        service.update(loaded).await.unwrap();

        let h2 = stored_hash(&service, user.id()).await;
        assert_eq!(h2, h1);
        assert!(service.hasher().verify("hunter2", &h2));
    }

    #[tokio::test]
    async fn test_change_password_unknown_user() {
        let service = create_service();

        let result = service.change_password(&UserId::generate(), "x").await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_create_duplicate_email() {
        let service = create_service();

        service.create(ann()).await.unwrap();

        let result = service
            .create(make_request("Annie", "Lane", "ann@example.com", "other"))
            .await;
        assert!(result.unwrap_err().is_duplicate_key());
    }

    #[tokio::test]
    async fn test_update_to_taken_email() {
        let service = create_service();

        service.create(ann()).await.unwrap();
        let bob = service
            .create(make_request("Bob", "Ray", "bob@example.com", "pw"))
            .await
            .unwrap();

        let mut loaded = service.get(bob.id()).await.unwrap().unwrap();
        loaded.set_email("ann@example.com");

        let result = service.update(loaded).await;
        assert!(result.unwrap_err().is_duplicate_key());
        assert!(service.get_by_email("bob@example.com").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_create_validation_errors() {
        let service = create_service();

        let cases = [
            make_request("A", "Lee", "ann@example.com", "hunter2"),
            make_request("Ann", "L", "ann@example.com", "hunter2"),
            make_request("", "Lee", "ann@example.com", "hunter2"),
            make_request("Ann", "Lee", "not-an-email", "hunter2"),
            make_request("Ann", "Lee", "", "hunter2"),
            make_request("Ann", "Lee", "ann@example.com", ""),
        ];

        for request in cases {
            let result = service.create(request).await;
            assert!(matches!(result, Err(DomainError::Validation(_))));
        }

        assert!(service.get_by_email("ann@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_validation_error() {
        let service = create_service();
        let user = service.create(ann()).await.unwrap();

        let mut loaded = service.get(user.id()).await.unwrap().unwrap();
        loaded.set_last_name("L");

        let result = service.update(loaded).await;
        assert!(matches!(
            result,
            Err(DomainError::Validation(UserValidationError::NameTooShort {
                field: "lastName",
                ..
            }))
        ));

        let stored = service.get(user.id()).await.unwrap().unwrap();
        assert_eq!(stored.last_name(), "Lee");
    }

    #[tokio::test]
    async fn test_hashing_failure_aborts_create() {
        let repository = Arc::new(MockUserRepository::new());
        let mut hasher = MockPasswordHasher::new();
        hasher
            .expect_hash()
            .returning(|_| Err(DomainError::hashing("rng unavailable")));

        let service = UserService::new(repository.clone(), Arc::new(hasher));

        let result = service.create(ann()).await;
        assert!(matches!(result, Err(DomainError::Hashing { .. })));
        assert_eq!(repository.write_count().await, 0);
    }

    #[tokio::test]
    async fn test_invalid_cost_aborts_password_change() {
        let repository = Arc::new(InMemoryUserRepository::new());
        let good = UserService::new(repository.clone(), Arc::new(BcryptHasher::new()));
        let bad = UserService::new(repository.clone(), Arc::new(BcryptHasher::with_cost(99)));

        let user = good.create(ann()).await.unwrap();
        let before = good.get_with_password(user.id()).await.unwrap().unwrap();

        let result = bad.change_password(user.id(), "new-secret").await;
        assert!(matches!(result, Err(DomainError::Hashing { .. })));

        let after = good.get_with_password(user.id()).await.unwrap().unwrap();
        assert_eq!(after.password(), before.password());
        assert!(good.hasher().verify("hunter2", after.password().unwrap()));
    }

    #[tokio::test]
    async fn test_hook_skips_unmodified_password() {
        let repository = Arc::new(MockUserRepository::new());
        let mut hasher = MockPasswordHasher::new();
        hasher
            .expect_hash()
            .times(1)
            .returning(|_| Ok("$2b$10$fixed".to_string()));

        let service = UserService::new(repository, Arc::new(hasher));

        let user = service.create(ann()).await.unwrap();

        let mut loaded = service.get_with_password(user.id()).await.unwrap().unwrap();
        loaded.record_game(false, 5);
        service.hash_password_if_modified(&mut loaded).await.unwrap();
        assert_eq!(loaded.password(), Some("$2b$10$fixed"));

        service.update(loaded).await.unwrap();
    }

    #[tokio::test]
    async fn test_hook_replaces_plaintext() {
        let service = create_service();
        let mut user = User::new("Ann", "Lee", "ann@example.com", "hunter2");

        service.hash_password_if_modified(&mut user).await.unwrap();

        assert!(!user.is_password_modified());
        let hash = user.password().unwrap();
        assert_ne!(hash, "hunter2");
        assert!(service.hasher().verify("hunter2", hash));
    }

    #[tokio::test]
    async fn test_storage_failure_surfaces() {
        let repository = Arc::new(MockUserRepository::new());
        repository.set_should_fail(true).await;
        let service = UserService::new(repository, Arc::new(BcryptHasher::new()));

        let result = service.create(ann()).await;
        assert!(matches!(result, Err(DomainError::Storage { .. })));
    }

    #[test]
    fn test_request_debug_redacts_password() {
        let debug = format!("{:?}", ann());
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("ann@example.com"));
    }
}
