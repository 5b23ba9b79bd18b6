use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::users::model::User;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Unique-index violation, naming the offending field and value.
    #[error("duplicate value '{value}' for unique field '{field}'")]
    Duplicate { field: String, value: String },

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl StoreError {
    pub fn duplicate_email(value: &str) -> Self {
        StoreError::Duplicate {
            field: "email".to_string(),
            value: value.to_string(),
        }
    }
}

/// Persistence collaborator for user records. The store owns the uniqueness
/// guarantee on email; handlers pre-check it only to produce friendlier
/// errors.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert(&self, user: User) -> Result<User, StoreError>;
    async fn find_all(&self) -> Result<Vec<User>, StoreError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn update(&self, user: User) -> Result<User, StoreError>;
    async fn delete_by_id(&self, id: Uuid) -> Result<bool, StoreError>;
}

/// In-memory store used by tests and local experiments. Enforces the same
/// email uniqueness the database index does.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn insert(&self, user: User) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        if users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(StoreError::duplicate_email(&user.email));
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_all(&self) -> Result<Vec<User>, StoreError> {
        let users = self.users.read().await;
        let mut all: Vec<User> = users.values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(all)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn update(&self, user: User) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        if !users.contains_key(&user.id) {
            return Err(StoreError::Backend(anyhow::anyhow!(
                "user {} does not exist",
                user.id
            )));
        }
        if users
            .values()
            .any(|u| u.id != user.id && u.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(StoreError::duplicate_email(&user.email));
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut users = self.users.write().await;
        Ok(users.remove(&id).is_some())
    }
}
