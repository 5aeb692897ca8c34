//! Process-local user repository.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use storefront_application::{NewUser, UserRecord, UserRepository};
use storefront_core::{AppError, AppResult};
use storefront_domain::UserId;

/// In-memory implementation of the user repository port.
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    users: RwLock<Vec<UserRecord>>,
}

impl InMemoryUserRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_username(&self, username: &str) -> AppResult<Option<UserRecord>> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|user| user.username == username)
            .cloned())
    }

    async fn find_by_id(&self, user_id: UserId) -> AppResult<Option<UserRecord>> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|user| user.id == user_id)
            .cloned())
    }

    async fn create(&self, user: NewUser) -> AppResult<UserRecord> {
        let mut users = self.users.write().await;
        if users
            .iter()
            .any(|existing| existing.username == user.username.as_str())
        {
            return Err(AppError::Conflict("User already exists".to_owned()));
        }

        let record = UserRecord {
            id: UserId::new(),
            username: user.username.into(),
            password_hash: user.password_hash,
            roles: user.roles,
            created_at: Utc::now(),
        };
        users.push(record.clone());
        Ok(record)
    }

    async fn list(&self) -> AppResult<Vec<UserRecord>> {
        Ok(self.users.read().await.clone())
    }
}
