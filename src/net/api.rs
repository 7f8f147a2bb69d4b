//! Admin API helpers: operation logs and the CRUD resources behind the
//! user, role, permission and menu management pages.
//!
//! These endpoints answer with plain JSON rather than the `{code, data}`
//! envelope, except for the role permission tree.

use std::marker::PhantomData;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use super::http::{ApiClient, HttpError};
use super::types::{Ack, Envelope, LogQuery, Menu, OperationLog, Page, Permission, Role, RolePermissionTree, UserInfo};

#[derive(Clone)]
pub struct AdminApi {
    client: ApiClient,
}

impl AdminApi {
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    // -------------------------------------------------------------------------
    // Operation logs
    // -------------------------------------------------------------------------

    /// `GET /operation-logs`, newest first.
    ///
    /// # Errors
    ///
    /// Propagates the client's [`HttpError`].
    pub async fn operation_logs(&self, query: &LogQuery) -> Result<Page<OperationLog>, HttpError> {
        self.client
            .get_with_query("/operation-logs", query)
            .await
    }

    /// `DELETE /operation-logs`: remove every log entry.
    ///
    /// # Errors
    ///
    /// Propagates the client's [`HttpError`].
    pub async fn clear_operation_logs(&self) -> Result<Ack, HttpError> {
        let ack: Ack = self.client.delete("/operation-logs").await?;
        tracing::info!("operation logs cleared");
        Ok(ack)
    }

    // -------------------------------------------------------------------------
    // Resources
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn users(&self) -> Resource<UserInfo> {
        Resource::new(self.client.clone(), "/users")
    }

    #[must_use]
    pub fn roles(&self) -> Resource<Role> {
        Resource::new(self.client.clone(), "/roles")
    }

    #[must_use]
    pub fn permissions(&self) -> Resource<Permission> {
        Resource::new(self.client.clone(), "/permissions")
    }

    #[must_use]
    pub fn menus(&self) -> Resource<Menu> {
        Resource::new(self.client.clone(), "/menus")
    }

    // -------------------------------------------------------------------------
    // Assignments
    // -------------------------------------------------------------------------

    /// Roles currently granted to a user.
    ///
    /// # Errors
    ///
    /// Propagates the client's [`HttpError`].
    pub async fn user_roles(&self, user_id: i64) -> Result<Vec<Role>, HttpError> {
        #[derive(serde::Deserialize)]
        struct UserRoles {
            #[serde(default)]
            roles: Vec<Role>,
        }
        let body: UserRoles = self
            .client
            .get(&format!("/users/{user_id}/roles"))
            .await?;
        Ok(body.roles)
    }

    /// Replace a user's roles.
    ///
    /// # Errors
    ///
    /// Propagates the client's [`HttpError`].
    pub async fn set_user_roles(&self, user_id: i64, role_ids: &[i64]) -> Result<Value, HttpError> {
        self.client
            .put(&format!("/users/{user_id}/roles"), &json!({ "role_ids": role_ids }))
            .await
    }

    /// Permission tree with the role's granted IDs checked.
    ///
    /// # Errors
    ///
    /// Propagates the client's [`HttpError`], or an application error for a
    /// non-zero envelope code.
    pub async fn role_permissions(&self, role_id: i64) -> Result<RolePermissionTree, HttpError> {
        self.client
            .get::<Envelope<RolePermissionTree>>(&format!("/roles/{role_id}/permissions"))
            .await
            .and_then(Envelope::into_data)
    }

    /// Replace a role's permissions.
    ///
    /// # Errors
    ///
    /// Propagates the client's [`HttpError`].
    pub async fn set_role_permissions(&self, role_id: i64, permission_ids: &[i64]) -> Result<Value, HttpError> {
        self.client
            .put(
                &format!("/roles/{role_id}/permissions"),
                &json!({ "permission_ids": permission_ids }),
            )
            .await
    }
}

// =============================================================================
// RESOURCE
// =============================================================================

/// CRUD handle for one collection (`/users`, `/roles`, ...).
pub struct Resource<T> {
    client: ApiClient,
    base: &'static str,
    _record: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> Resource<T> {
    fn new(client: ApiClient, base: &'static str) -> Self {
        Self { client, base, _record: PhantomData }
    }

    #[must_use]
    pub fn path(&self) -> &'static str {
        self.base
    }

    /// Paged listing (`users`, `roles`, `permissions`).
    ///
    /// # Errors
    ///
    /// Propagates the client's [`HttpError`].
    pub async fn list_page<Q: Serialize>(&self, query: &Q) -> Result<Page<T>, HttpError> {
        self.client.get_with_query(self.base, query).await
    }

    /// Unpaged listing (`menus`).
    ///
    /// # Errors
    ///
    /// Propagates the client's [`HttpError`].
    pub async fn list_all(&self) -> Result<Vec<T>, HttpError> {
        self.client.get(self.base).await
    }

    /// # Errors
    ///
    /// Propagates the client's [`HttpError`].
    pub async fn create<B: Serialize>(&self, body: &B) -> Result<T, HttpError> {
        let created = self.client.post(self.base, body).await?;
        tracing::info!(resource = self.base, "created");
        Ok(created)
    }

    /// Some resources echo the record, others answer `{message}`, so the
    /// raw JSON is returned.
    ///
    /// # Errors
    ///
    /// Propagates the client's [`HttpError`].
    pub async fn update<B: Serialize>(&self, id: i64, body: &B) -> Result<Value, HttpError> {
        let updated = self
            .client
            .put(&format!("{}/{id}", self.base), body)
            .await?;
        tracing::info!(resource = self.base, id, "updated");
        Ok(updated)
    }

    /// # Errors
    ///
    /// Propagates the client's [`HttpError`].
    pub async fn delete(&self, id: i64) -> Result<Value, HttpError> {
        let deleted = self.client.delete(&format!("{}/{id}", self.base)).await?;
        tracing::info!(resource = self.base, id, "deleted");
        Ok(deleted)
    }
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
