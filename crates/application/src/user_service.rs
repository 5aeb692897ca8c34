//! User management ports and application service.
//!
//! Owns sign-up, password login and bearer-token authentication. Login
//! failures are deliberately indistinguishable: unknown users and wrong
//! passwords both yield `AuthOutcome::Failed`.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use storefront_core::{AppError, AppResult, Role, UserIdentity};
use storefront_domain::{UserId, Username, validate_password};

use crate::require_role;

// ---------------------------------------------------------------------------
// Ports
// ---------------------------------------------------------------------------

/// User record returned by repository queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    /// Unique user identifier.
    pub id: UserId,
    /// Login name.
    pub username: String,
    /// Argon2id password hash.
    pub password_hash: String,
    /// Granted roles.
    pub roles: Vec<Role>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    /// Builds the identity carried by this user's access tokens.
    #[must_use]
    pub fn identity(&self) -> UserIdentity {
        UserIdentity::new(
            self.id.to_string(),
            self.username.clone(),
            self.roles.clone(),
        )
    }
}

/// User ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    /// Validated login name.
    pub username: Username,
    /// Password hash.
    pub password_hash: String,
    /// Granted roles.
    pub roles: Vec<Role>,
}

/// Repository port for user persistence.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Finds a user by exact username.
    async fn find_by_username(&self, username: &str) -> AppResult<Option<UserRecord>>;

    /// Finds a user by their unique identifier.
    async fn find_by_id(&self, user_id: UserId) -> AppResult<Option<UserRecord>>;

    /// Creates a user. Fails with `AppError::Conflict` when the username is
    /// taken.
    async fn create(&self, user: NewUser) -> AppResult<UserRecord>;

    /// Lists every user, oldest first.
    async fn list(&self) -> AppResult<Vec<UserRecord>>;
}

/// Port for password hashing operations. Keeps domain/application free of
/// direct cryptographic library coupling.
pub trait PasswordHasher: Send + Sync {
    /// Hashes a plaintext password.
    fn hash_password(&self, password: &str) -> AppResult<String>;

    /// Verifies a plaintext password against a stored hash.
    fn verify_password(&self, password: &str, hash: &str) -> AppResult<bool>;
}

/// Port for issuing and verifying signed access tokens.
pub trait AccessTokenService: Send + Sync {
    /// Signs a token carrying `identity`.
    fn issue(&self, identity: &UserIdentity) -> AppResult<String>;

    /// Verifies signature and expiry and returns the carried identity.
    /// Fails with `AppError::Unauthorized`.
    fn verify(&self, token: &str) -> AppResult<UserIdentity>;
}

// ---------------------------------------------------------------------------
// Authentication outcome
// ---------------------------------------------------------------------------

/// Result of a login attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// Credentials matched.
    Authenticated {
        /// Signed access token.
        token: String,
        /// Identity carried by the token.
        identity: UserIdentity,
    },
    /// Unknown user or wrong password.
    Failed,
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Parameters for sign-up.
#[derive(Debug, Clone)]
pub struct SignupParams {
    /// Requested username.
    pub username: String,
    /// Plaintext password.
    pub password: String,
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Application service for user authentication and registration.
#[derive(Clone)]
pub struct UserService {
    user_repository: Arc<dyn UserRepository>,
    password_hasher: Arc<dyn PasswordHasher>,
    token_service: Arc<dyn AccessTokenService>,
}

impl UserService {
    /// Creates a new user service.
    #[must_use]
    pub fn new(
        user_repository: Arc<dyn UserRepository>,
        password_hasher: Arc<dyn PasswordHasher>,
        token_service: Arc<dyn AccessTokenService>,
    ) -> Self {
        Self {
            user_repository,
            password_hasher,
            token_service,
        }
    }

    /// Registers a user with the `user` role.
    pub async fn signup(&self, params: SignupParams) -> AppResult<UserRecord> {
        self.register(params, vec![Role::User]).await
    }

    /// Checks credentials and issues an access token.
    pub async fn login(&self, username: &str, password: &str) -> AppResult<AuthOutcome> {
        let Some(user) = self
            .user_repository
            .find_by_username(username.trim())
            .await?
        else {
            // Keep response timing close to the known-user path.
            let _ = self.password_hasher.hash_password(password);
            return Ok(AuthOutcome::Failed);
        };

        if !self
            .password_hasher
            .verify_password(password, &user.password_hash)?
        {
            return Ok(AuthOutcome::Failed);
        }

        let identity = user.identity();
        let token = self.token_service.issue(&identity)?;
        Ok(AuthOutcome::Authenticated { token, identity })
    }

    /// Resolves a bearer token into the identity it carries.
    pub fn authenticate(&self, token: &str) -> AppResult<UserIdentity> {
        self.token_service.verify(token)
    }

    /// Lists users. Admin only.
    pub async fn list_users(&self, actor: &UserIdentity) -> AppResult<Vec<UserRecord>> {
        require_role(actor, Role::Admin)?;
        self.user_repository.list().await
    }

    /// Creates the bootstrap admin account unless the username already
    /// exists. Returns the account when one was created.
    pub async fn ensure_admin(
        &self,
        username: &str,
        password: &str,
    ) -> AppResult<Option<UserRecord>> {
        if self
            .user_repository
            .find_by_username(username.trim())
            .await?
            .is_some()
        {
            return Ok(None);
        }

        let params = SignupParams {
            username: username.to_owned(),
            password: password.to_owned(),
        };
        match self.register(params, vec![Role::User, Role::Admin]).await {
            Ok(user) => Ok(Some(user)),
            Err(AppError::Conflict(_)) => Ok(None),
            Err(error) => Err(error),
        }
    }

    async fn register(&self, params: SignupParams, roles: Vec<Role>) -> AppResult<UserRecord> {
        let username = Username::new(params.username)?;
        validate_password(&params.password)?;

        if self
            .user_repository
            .find_by_username(username.as_str())
            .await?
            .is_some()
        {
            let _ = self.password_hasher.hash_password(&params.password);
            return Err(user_exists());
        }

        let password_hash = self.password_hasher.hash_password(&params.password)?;
        self.user_repository
            .create(NewUser {
                username,
                password_hash,
                roles,
            })
            .await
    }
}

fn user_exists() -> AppError {
    AppError::Conflict("User already exists".to_owned())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use storefront_core::{AppError, AppResult, Role};

    use crate::test_support::{
        FakePasswordHasher, FakeTokenService, FakeUserRepository, admin, shopper,
    };

    use super::{AuthOutcome, SignupParams, UserService};

    fn service() -> (UserService, Arc<FakePasswordHasher>) {
        let hasher = Arc::new(FakePasswordHasher::default());
        let service = UserService::new(
            Arc::new(FakeUserRepository::default()),
            hasher.clone(),
            Arc::new(FakeTokenService),
        );
        (service, hasher)
    }

    fn params(username: &str, password: &str) -> SignupParams {
        SignupParams {
            username: username.to_owned(),
            password: password.to_owned(),
        }
    }

    #[tokio::test]
    async fn signup_creates_regular_user() -> AppResult<()> {
        let (service, _) = service();
        let user = service.signup(params("  carol ", "secret1")).await?;

        assert_eq!(user.username, "carol");
        assert_eq!(user.roles, vec![Role::User]);
        assert_ne!(user.password_hash, "secret1");
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_signup_conflicts_and_still_hashes() -> AppResult<()> {
        let (service, hasher) = service();
        service.signup(params("carol", "secret1")).await?;

        let result = service.signup(params("carol", "another1")).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
        assert_eq!(hasher.hash_calls(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn signup_validates_username_and_password() {
        let (service, _) = service();
        assert!(matches!(
            service.signup(params("ab", "secret1")).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            service.signup(params("carol", "123")).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn login_issues_verifiable_token() -> AppResult<()> {
        let (service, _) = service();
        let user = service.signup(params("carol", "secret1")).await?;

        let outcome = service.login("carol", "secret1").await?;
        let AuthOutcome::Authenticated { token, identity } = outcome else {
            panic!("expected successful login");
        };

        assert_eq!(identity.subject(), user.id.to_string());
        assert_eq!(service.authenticate(&token)?, identity);
        Ok(())
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_fail_alike() -> AppResult<()> {
        let (service, hasher) = service();
        service.signup(params("carol", "secret1")).await?;

        assert_eq!(service.login("carol", "wrong-1").await?, AuthOutcome::Failed);
        assert_eq!(service.login("nobody", "secret1").await?, AuthOutcome::Failed);
        assert_eq!(hasher.hash_calls(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn ensure_admin_is_idempotent() -> AppResult<()> {
        let (service, _) = service();
        assert!(service.ensure_admin("root", "rootpass").await?.is_some());
        assert!(service.ensure_admin("root", "rootpass").await?.is_none());

        let users = service.list_users(&admin()).await?;
        assert_eq!(users.len(), 1);
        assert!(users[0].roles.contains(&Role::Admin));
        Ok(())
    }

    #[tokio::test]
    async fn listing_users_requires_admin() {
        let (service, _) = service();
        assert!(matches!(
            service.list_users(&shopper()).await,
            Err(AppError::Forbidden(_))
        ));
    }
}
