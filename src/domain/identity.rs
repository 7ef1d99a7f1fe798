use std::sync::Arc;

use crate::domain::order::WorkflowError;
use crate::models::{Principal, Role, User};
use crate::store::UserDirectory;

// ============================================================================
// Identity Service
// ============================================================================
//
// Bridges the external authentication collaborator and the workflow: a
// verified external id becomes a `Principal` carrying the stored role.
//
// ============================================================================

pub struct IdentityService {
    users: Arc<dyn UserDirectory>,
}

impl IdentityService {
    pub fn new(users: Arc<dyn UserDirectory>) -> Self {
        Self { users }
    }

    /// Mirror a freshly authenticated identity into the directory.
    /// Calling it again for the same external id returns the stored record.
    pub async fn sync_user(
        &self,
        external_id: &str,
        name: &str,
        email: &str,
        role: Option<Role>,
    ) -> Result<User, WorkflowError> {
        if external_id.trim().is_empty() {
            return Err(WorkflowError::Unauthenticated);
        }

        let user = self.users.sync_user(external_id, name, email, role).await?;
        tracing::debug!(user_id = %user.id, role = %user.role, "User synced");
        Ok(user)
    }

    /// Resolve the acting principal. Unknown identities are unauthenticated.
    pub async fn resolve(&self, external_id: &str) -> Result<Principal, WorkflowError> {
        match self.users.find_by_external_id(external_id).await? {
            Some(user) => Ok(user.principal()),
            None => {
                tracing::warn!(external_id = external_id, "Unknown identity");
                Err(WorkflowError::Unauthenticated)
            }
        }
    }
}
