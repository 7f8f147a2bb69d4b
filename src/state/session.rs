//! Session store: login, logout and profile actions.
//!
//! Actions proxy to the API and write results into the shared
//! [`AuthState`]. Failures are logged and re-raised as [`SessionError`]
//! carrying the message the user should see.

use std::sync::Arc;

use serde_json::{Map, Value};

use super::auth::{AuthState, Session};
use crate::net::http::ApiClient;
use crate::net::types::{Envelope, LoginPayload, LoginRequest, PasswordChange, ProfileUpdate, Role, UserInfo};
use crate::notify::{Notice, Notifier};

pub const LOGIN_FAILED: &str = "Login failed";
pub const PROFILE_FETCH_FAILED: &str = "Failed to fetch user info";
pub const PROFILE_UPDATE_FAILED: &str = "Failed to update profile";
pub const PASSWORD_UPDATE_FAILED: &str = "Failed to change password";
pub const PROFILE_UPDATED: &str = "Profile updated";
pub const PASSWORD_UPDATED: &str = "Password changed";

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("{0}")]
    Authentication(String),
    #[error("{0}")]
    ProfileFetch(String),
    #[error("{0}")]
    Update(String),
}

#[derive(Clone)]
pub struct SessionStore {
    client: ApiClient,
    auth: Arc<AuthState>,
    notifier: Arc<dyn Notifier>,
}

impl SessionStore {
    #[must_use]
    pub fn new(client: ApiClient, auth: Arc<AuthState>, notifier: Arc<dyn Notifier>) -> Self {
        Self { client, auth, notifier }
    }

    // -------------------------------------------------------------------------
    // Actions
    // -------------------------------------------------------------------------

    /// Exchange credentials for a token and start a fresh session.
    ///
    /// # Errors
    ///
    /// [`SessionError::Authentication`] with the server's message, or a
    /// generic one, on any failure.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginPayload, SessionError> {
        let body = LoginRequest { username, password };
        let payload = self
            .client
            .post::<Envelope<LoginPayload>, _>("/auth/login", &body)
            .await
            .and_then(Envelope::into_data)
            .map_err(|err| {
                tracing::error!(username, error = %err, "login failed");
                SessionError::Authentication(err.message_or(LOGIN_FAILED))
            })?;

        if !self.auth.set_token(payload.token.clone()) {
            tracing::error!(username, "login response carried an empty token");
            return Err(SessionError::Authentication(LOGIN_FAILED.to_owned()));
        }
        tracing::info!(username, "logged in");
        Ok(payload)
    }

    /// Load the authenticated identity and its roles.
    ///
    /// # Errors
    ///
    /// [`SessionError::ProfileFetch`] on any failure.
    pub async fn fetch_current_user(&self) -> Result<UserInfo, SessionError> {
        let issued_for = self.auth.token();
        let user = self
            .client
            .get::<Envelope<UserInfo>>("/auth/current-user")
            .await
            .and_then(Envelope::into_data)
            .map_err(|err| {
                tracing::error!(error = %err, "fetching current user failed");
                SessionError::ProfileFetch(err.message_or(PROFILE_FETCH_FAILED))
            })?;

        if self.auth.set_user(issued_for.as_deref(), user.clone()) {
            tracing::debug!(user_id = user.id, roles = user.roles.len(), "current user loaded");
        }
        Ok(user)
    }

    /// Patch the profile and merge the returned fields into the session.
    ///
    /// # Errors
    ///
    /// [`SessionError::Update`] on any failure, including a session that
    /// ended before the response arrived.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserInfo, SessionError> {
        let issued_for = self.auth.token();
        let patch = self
            .client
            .patch::<Envelope<Map<String, Value>>, _>("/profile", update)
            .await
            .and_then(Envelope::into_data)
            .map_err(|err| {
                tracing::error!(error = %err, "profile update failed");
                SessionError::Update(err.message_or(PROFILE_UPDATE_FAILED))
            })?;

        let Some(merged) = self.auth.merge_user(issued_for.as_deref(), &patch) else {
            tracing::warn!("session ended while the profile update was in flight");
            return Err(SessionError::Update(PROFILE_UPDATE_FAILED.to_owned()));
        };
        self.notifier.notify(Notice::success(PROFILE_UPDATED));
        Ok(merged)
    }

    /// Change the password. The session identity is left as is.
    ///
    /// # Errors
    ///
    /// [`SessionError::Update`] on any failure.
    pub async fn update_password(&self, old_password: &str, new_password: &str) -> Result<(), SessionError> {
        let body = PasswordChange { old_password, new_password };
        self.client
            .patch::<Envelope<Value>, _>("/profile/password", &body)
            .await
            .and_then(Envelope::into_ack)
            .map_err(|err| {
                tracing::error!(error = %err, "password update failed");
                SessionError::Update(err.message_or(PASSWORD_UPDATE_FAILED))
            })?;

        self.notifier.notify(Notice::success(PASSWORD_UPDATED));
        Ok(())
    }

    /// Forget the session locally. No request is made.
    pub fn logout(&self) {
        self.auth.clear();
        tracing::info!("logged out");
    }

    /// Same as [`SessionStore::logout`]; used when a session turns out to be
    /// unusable rather than on user request.
    pub fn reset_session(&self) {
        self.auth.clear();
        tracing::debug!("session reset");
    }

    // -------------------------------------------------------------------------
    // Getters
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.auth.token().is_some()
    }

    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.auth.token()
    }

    #[must_use]
    pub fn session(&self) -> Session {
        self.auth.session()
    }

    #[must_use]
    pub fn user_info(&self) -> Option<UserInfo> {
        self.auth.session().user_info
    }

    #[must_use]
    pub fn roles(&self) -> Vec<Role> {
        self.auth.session().roles
    }

    #[must_use]
    pub fn username(&self) -> String {
        self.user_field(|u| u.username.clone())
    }

    #[must_use]
    pub fn nickname(&self) -> String {
        self.user_field(|u| u.nickname.clone())
    }

    #[must_use]
    pub fn email(&self) -> String {
        self.user_field(|u| u.email.clone())
    }

    #[must_use]
    pub fn avatar(&self) -> String {
        self.user_field(|u| u.avatar.clone().unwrap_or_default())
    }

    fn user_field(&self, pick: impl Fn(&UserInfo) -> String) -> String {
        self.auth
            .session()
            .user_info
            .as_ref()
            .map(pick)
            .unwrap_or_default()
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
