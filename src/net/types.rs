//! Wire types for the admin console REST API.
//!
//! Most records use `#[serde(default)]` so partial payloads (profile patches,
//! list rows without timestamps) still decode. Unknown fields are kept in
//! `extra` where the record is merged or echoed back to the server.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::http::HttpError;

// =============================================================================
// ENVELOPE
// =============================================================================

/// Application envelope: `code == 0` is success, anything else is a failure
/// whose `message` is user-displayable.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Envelope<T> {
    pub code: Option<i64>,
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }

    /// Payload of a successful envelope. A success code without data is
    /// treated as a failure, matching the server's login/profile contract.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Application`] for a non-zero code or missing data.
    pub fn into_data(self) -> Result<T, HttpError> {
        match (self.is_success(), self.data) {
            (true, Some(data)) => Ok(data),
            _ => Err(HttpError::Application { code: self.code.unwrap_or(-1), message: self.message }),
        }
    }

    /// Accept a successful envelope whether or not it carries data.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Application`] for a non-zero code.
    pub fn into_ack(self) -> Result<(), HttpError> {
        if self.is_success() {
            Ok(())
        } else {
            Err(HttpError::Application { code: self.code.unwrap_or(-1), message: self.message })
        }
    }
}

/// Paginated list response: `{items, total, page, page_size}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}

/// Plain `{message}` acknowledgement returned by delete/clear endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub message: Option<String>,
}

// =============================================================================
// IDENTITY
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Role {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub description: Option<String>,
    pub status: i32,
    pub color_start: Option<String>,
    pub color_end: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// The authenticated user as returned by `/auth/current-user`, and the row
/// shape of `/users` listings (where `roles` is absent).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserInfo {
    pub id: i64,
    pub username: String,
    pub nickname: String,
    pub email: String,
    pub avatar: Option<String>,
    pub status: i32,
    pub roles: Vec<Role>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserInfo {
    /// Overlay the fields of `patch` onto this user, keeping everything the
    /// patch does not mention.
    #[must_use]
    pub fn merged(&self, patch: &Map<String, Value>) -> Self {
        let mut base = match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        for (key, value) in patch {
            base.insert(key.clone(), value.clone());
        }
        serde_json::from_value(Value::Object(base)).unwrap_or_else(|err| {
            tracing::warn!(error = %err, "profile patch did not decode; keeping previous user");
            self.clone()
        })
    }
}

/// Profile snapshot persisted next to the token. Roles are deliberately not
/// part of it; they are re-fetched on every bootstrap.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSnapshot {
    pub id: i64,
    pub username: String,
    pub nickname: String,
    pub email: String,
    pub avatar: Option<String>,
    pub status: i32,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl From<&UserInfo> for UserSnapshot {
    fn from(user: &UserInfo) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            nickname: user.nickname.clone(),
            email: user.email.clone(),
            avatar: user.avatar.clone(),
            status: user.status,
            created_at: user.created_at.clone(),
            updated_at: user.updated_at.clone(),
        }
    }
}

// =============================================================================
// PERMISSIONS & MENUS
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Permission {
    pub id: i64,
    pub name: String,
    pub code: String,
    /// `PAGE` for menu entries, other values for action permissions.
    pub type_name: Option<String>,
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Payload of `/user/permissions`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PermissionSet {
    pub permissions: Vec<Permission>,
    pub menus: Vec<Permission>,
}

impl PermissionSet {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty() && self.menus.is_empty()
    }

    #[must_use]
    pub fn contains_code(&self, code: &str) -> bool {
        self.permissions.iter().any(|p| p.code == code)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Menu {
    pub id: i64,
    pub parent_id: Option<i64>,
    pub name: String,
    pub path: String,
    pub component: String,
    pub title: String,
    pub icon: Option<String>,
    pub sort: i32,
    pub is_hidden: bool,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Payload of `GET /roles/{id}/permissions`: the permission tree plus the
/// IDs currently granted to the role.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RolePermissionTree {
    pub data: Vec<Value>,
    #[serde(rename = "checkedKeys")]
    pub checked_keys: Vec<i64>,
}

// =============================================================================
// OPERATION LOGS
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperationLog {
    pub id: i64,
    pub user_id: i64,
    pub username: String,
    pub module: String,
    pub operation: String,
    pub method: String,
    pub params: Option<String>,
    pub ip: Option<String>,
    pub status: i32,
    pub error: Option<String>,
    pub created_at: String,
}

/// Filters accepted by `GET /operation-logs`. Unset fields are omitted from
/// the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LogQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<i32>,
}

/// Generic `page`/`page_size` query for resource listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PageQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

// =============================================================================
// REQUEST BODIES
// =============================================================================

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoginPayload {
    pub token: String,
    #[serde(default)]
    pub user: Option<UserInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PasswordChange<'a> {
    pub old_password: &'a str,
    pub new_password: &'a str,
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
