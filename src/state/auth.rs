#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use std::sync::{Arc, RwLock};

use crate::net::types::{PermissionSet, Role, UserInfo, UserSnapshot};
use crate::storage::{PersistedSession, SessionRepository};

/// In-memory session: token, identity and whether the permission bootstrap
/// has completed for this token.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Session {
    pub token: Option<String>,
    pub user_info: Option<UserInfo>,
    pub roles: Vec<Role>,
    pub roles_loaded: bool,
}

/// Where the current session stands as far as the navigation guard cares.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthPhase {
    Unauthenticated,
    AuthenticatedNoRolesLoaded,
    AuthenticatedRolesLoaded,
}

/// Authentication state shared by the HTTP client, both stores and the guard.
///
/// Session and permission set live together so that clearing one always
/// clears the other. The repository is written only from here.
#[derive(Debug)]
pub struct AuthState {
    repo: Arc<dyn SessionRepository>,
    session: RwLock<Session>,
    permissions: RwLock<PermissionSet>,
}

impl AuthState {
    /// Restore the persisted token, if any. A store that fails to load is
    /// treated as logged out.
    #[must_use]
    pub fn new(repo: Arc<dyn SessionRepository>) -> Self {
        let token = match repo.load() {
            Ok(persisted) => persisted.token.filter(|t| !t.is_empty()),
            Err(err) => {
                tracing::warn!(error = %err, "could not load persisted session; starting logged out");
                None
            }
        };
        Self {
            repo,
            session: RwLock::new(Session { token, ..Session::default() }),
            permissions: RwLock::new(PermissionSet::default()),
        }
    }

    #[must_use]
    pub fn session(&self) -> Session {
        self.read_session().clone()
    }

    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.read_session().token.clone()
    }

    #[must_use]
    pub fn phase(&self) -> AuthPhase {
        let session = self.read_session();
        match (&session.token, session.roles_loaded) {
            (None, _) => AuthPhase::Unauthenticated,
            (Some(_), false) => AuthPhase::AuthenticatedNoRolesLoaded,
            (Some(_), true) => AuthPhase::AuthenticatedRolesLoaded,
        }
    }

    #[must_use]
    pub fn permissions(&self) -> PermissionSet {
        self.permissions
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// An absent or empty code needs no permission.
    #[must_use]
    pub fn has_permission(&self, code: Option<&str>) -> bool {
        match code {
            None | Some("") => true,
            Some(code) => self
                .permissions
                .read()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .contains_code(code),
        }
    }

    // -------------------------------------------------------------------------
    // Mutations (store actions and the 401 handler only)
    // -------------------------------------------------------------------------

    /// Start a new session with `token`. Any previous identity is dropped.
    /// An empty token is refused and leaves the state untouched.
    pub(crate) fn set_token(&self, token: String) -> bool {
        if token.is_empty() {
            tracing::warn!("refusing to start a session with an empty token");
            return false;
        }
        self.persist(&PersistedSession { token: Some(token.clone()), user: None });
        *self.permissions_mut() = PermissionSet::default();
        *self.write_session() = Session { token: Some(token), ..Session::default() };
        true
    }

    /// Store the identity fetched with `issued_for`. Ignored unless that
    /// token is still the current one, so a late response cannot resurrect a
    /// logged-out user or leak into a newer session.
    pub(crate) fn set_user(&self, issued_for: Option<&str>, user: UserInfo) -> bool {
        let token = {
            let mut session = self.write_session();
            let Some(token) = session.token.clone().filter(|t| Some(t.as_str()) == issued_for) else {
                tracing::debug!("dropping user info for a stale session");
                return false;
            };
            session.roles = user.roles.clone();
            session.user_info = Some(user.clone());
            token
        };
        self.persist(&PersistedSession { token: Some(token), user: Some(UserSnapshot::from(&user)) });
        true
    }

    /// Merge `patch` into the current user and return the result. `None`
    /// when the session that issued the request is gone.
    pub(crate) fn merge_user(
        &self,
        issued_for: Option<&str>,
        patch: &serde_json::Map<String, serde_json::Value>,
    ) -> Option<UserInfo> {
        let (token, merged) = {
            let mut session = self.write_session();
            let token = session.token.clone().filter(|t| Some(t.as_str()) == issued_for)?;
            let merged = session.user_info.clone().unwrap_or_default().merged(patch);
            session.user_info = Some(merged.clone());
            (token, merged)
        };
        self.persist(&PersistedSession { token: Some(token), user: Some(UserSnapshot::from(&merged)) });
        Some(merged)
    }

    /// Replace both lists in a single write. Same staleness rule as
    /// [`AuthState::set_user`].
    pub(crate) fn set_permissions(&self, issued_for: Option<&str>, set: PermissionSet) -> bool {
        let session = self.read_session();
        if session.token.is_none() || session.token.as_deref() != issued_for {
            tracing::debug!("dropping permissions for a stale session");
            return false;
        }
        *self.permissions_mut() = set;
        true
    }

    pub(crate) fn reset_permissions(&self) {
        *self.permissions_mut() = PermissionSet::default();
    }

    /// Mark the bootstrap done. Only meaningful while a token is present.
    pub(crate) fn mark_roles_loaded(&self) {
        let mut session = self.write_session();
        if session.token.is_some() {
            session.roles_loaded = true;
        }
    }

    /// Drop token, identity, roles and permissions, in memory and on disk.
    pub fn clear(&self) {
        *self.write_session() = Session::default();
        *self.permissions_mut() = PermissionSet::default();
        if let Err(err) = self.repo.clear() {
            tracing::warn!(error = %err, "failed to clear persisted session");
        }
    }

    fn persist(&self, persisted: &PersistedSession) {
        if let Err(err) = self.repo.save(persisted) {
            tracing::warn!(error = %err, "failed to persist session");
        }
    }

    fn read_session(&self) -> std::sync::RwLockReadGuard<'_, Session> {
        self.session
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn write_session(&self) -> std::sync::RwLockWriteGuard<'_, Session> {
        self.session
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn permissions_mut(&self) -> std::sync::RwLockWriteGuard<'_, PermissionSet> {
        self.permissions
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
