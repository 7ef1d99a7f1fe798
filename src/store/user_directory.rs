use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::StoreError;
use crate::models::{Role, User};

/// Read side of the external identity store, plus the sync hook that mirrors
/// a freshly authenticated identity into it.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Ensure a record exists for `external_id`. An existing record is returned
    /// unchanged. New records default to BUYER.
    async fn sync_user(
        &self,
        external_id: &str,
        name: &str,
        email: &str,
        role: Option<Role>,
    ) -> Result<User, StoreError>;

    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<User>, StoreError>;

    async fn get(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    async fn list_by_role(&self, role: Role) -> Result<Vec<User>, StoreError>;
}

#[derive(Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn sync_user(
        &self,
        external_id: &str,
        name: &str,
        email: &str,
        role: Option<Role>,
    ) -> Result<User, StoreError> {
        let mut users = self.users.write().await;

        if let Some(existing) = users.values().find(|user| user.external_id == external_id) {
            return Ok(existing.clone());
        }

        if users.values().any(|user| user.email.eq_ignore_ascii_case(email)) {
            return Err(StoreError::EmailTaken(email.to_string()));
        }

        let user = User {
            id: Uuid::new_v4(),
            external_id: external_id.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            role: role.unwrap_or(Role::Buyer),
        };
        users.insert(user.id, user.clone());

        tracing::info!(user_id = %user.id, role = %user.role, "New user synced");
        Ok(user)
    }

    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|user| user.external_id == external_id)
            .cloned())
    }

    async fn get(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn list_by_role(&self, role: Role) -> Result<Vec<User>, StoreError> {
        let mut users: Vec<User> = self
            .users
            .read()
            .await
            .values()
            .filter(|user| user.role == role)
            .cloned()
            .collect();

        users.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(users)
    }
}
