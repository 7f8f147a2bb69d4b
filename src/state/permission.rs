//! Permission store: the signed-in user's permission codes and menus.

use std::sync::Arc;

use super::auth::AuthState;
use crate::net::http::ApiClient;
use crate::net::types::{Envelope, Permission, PermissionSet};

pub const PERMISSION_FETCH_FAILED: &str = "Failed to fetch permissions";

#[derive(Debug, thiserror::Error)]
pub enum PermissionError {
    #[error("{0}")]
    Fetch(String),
}

#[derive(Clone)]
pub struct PermissionStore {
    client: ApiClient,
    auth: Arc<AuthState>,
}

impl PermissionStore {
    #[must_use]
    pub fn new(client: ApiClient, auth: Arc<AuthState>) -> Self {
        Self { client, auth }
    }

    /// Fetch `/user/permissions` and replace both lists at once. On failure
    /// the previous lists stay in place.
    ///
    /// # Errors
    ///
    /// [`PermissionError::Fetch`] with the server's or a generic message.
    pub async fn fetch_permissions(&self) -> Result<PermissionSet, PermissionError> {
        let issued_for = self.auth.token();
        let set = self
            .client
            .get::<Envelope<PermissionSet>>("/user/permissions")
            .await
            .and_then(Envelope::into_data)
            .map_err(|err| {
                tracing::error!(error = %err, "fetching permissions failed");
                PermissionError::Fetch(err.message_or(PERMISSION_FETCH_FAILED))
            })?;

        tracing::debug!(permissions = set.permissions.len(), menus = set.menus.len(), "permissions loaded");
        self.auth.set_permissions(issued_for.as_deref(), set.clone());
        Ok(set)
    }

    /// `None` or an empty code always passes.
    #[must_use]
    pub fn has_permission(&self, code: Option<&str>) -> bool {
        self.auth.has_permission(code)
    }

    pub fn reset_permissions(&self) {
        self.auth.reset_permissions();
    }

    #[must_use]
    pub fn permissions(&self) -> Vec<Permission> {
        self.auth.permissions().permissions
    }

    #[must_use]
    pub fn menus(&self) -> Vec<Permission> {
        self.auth.permissions().menus
    }
}

#[cfg(test)]
#[path = "permission_test.rs"]
mod tests;
