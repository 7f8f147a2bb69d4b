//! Navigation guard.
//!
//! Evaluated before every route change. The decision depends on the auth
//! phase of the shared [`AuthState`]:
//!
//! - `Unauthenticated`: public pages pass, everything else goes to login
//!   with the requested path as `redirect`.
//! - authenticated, target is login: go home.
//! - `AuthenticatedRolesLoaded`: check the route's permission code.
//! - `AuthenticatedNoRolesLoaded`: fetch user then permissions, mark the
//!   session loaded, and check permissions for the same target. Any failure
//!   ends the session and sends the user to login.
//!
//! CONCURRENCY
//! ===========
//! The bootstrap step is single-flight. Navigations that arrive while one is
//! running wait on the mutex and then see `roles_loaded` already set.

use std::sync::Arc;

use tokio::sync::Mutex;

use super::route::{DASHBOARD_PATH, FORBIDDEN_PATH, HOME_PATH, LOGIN_PATH, Location, RouteRecord};
use crate::notify::{Notice, Notifier};
use crate::state::auth::{AuthPhase, AuthState};
use crate::state::permission::{PermissionError, PermissionStore};
use crate::state::session::{SessionError, SessionStore};

pub const NO_PERMISSION_MESSAGE: &str = "You do not have permission to access this page";
pub const BOOTSTRAP_FAILED_MESSAGE: &str = "Has Error";

/// Pages reachable without a session.
pub const PUBLIC_PATHS: [&str; 2] = [LOGIN_PATH, FORBIDDEN_PATH];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    Proceed,
    Redirect(Location),
}

#[derive(Debug, thiserror::Error)]
enum BootstrapError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Permission(#[from] PermissionError),
}

pub struct NavigationGuard {
    auth: Arc<AuthState>,
    session: SessionStore,
    permissions: PermissionStore,
    notifier: Arc<dyn Notifier>,
    bootstrap: Mutex<()>,
}

impl NavigationGuard {
    #[must_use]
    pub fn new(
        auth: Arc<AuthState>,
        session: SessionStore,
        permissions: PermissionStore,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self { auth, session, permissions, notifier, bootstrap: Mutex::new(()) }
    }

    /// Decide whether navigation to `to` (matched to `route`, if any) may
    /// proceed.
    pub async fn evaluate(&self, to: &Location, route: Option<&RouteRecord>) -> GuardOutcome {
        match self.auth.phase() {
            AuthPhase::Unauthenticated => {
                if PUBLIC_PATHS.contains(&to.path.as_str()) {
                    GuardOutcome::Proceed
                } else {
                    GuardOutcome::Redirect(Location::login_redirect(&to.path))
                }
            }
            _ if to.path == LOGIN_PATH => GuardOutcome::Redirect(Location::new(HOME_PATH)),
            AuthPhase::AuthenticatedRolesLoaded => self.check_access(to, route),
            AuthPhase::AuthenticatedNoRolesLoaded => match self.bootstrap().await {
                Ok(()) => self.check_access(to, route),
                Err(message) => {
                    // A 401 during the fetch has already cleared the session.
                    if self.auth.phase() != AuthPhase::Unauthenticated {
                        self.session.reset_session();
                    }
                    self.notifier.notify(Notice::error(message));
                    GuardOutcome::Redirect(Location::login_redirect(&to.path))
                }
            },
        }
    }

    fn check_access(&self, to: &Location, route: Option<&RouteRecord>) -> GuardOutcome {
        let required = route.and_then(|r| r.permission.as_deref());
        let open = to.path == HOME_PATH || to.path == DASHBOARD_PATH;
        if open || self.permissions.has_permission(required) {
            return GuardOutcome::Proceed;
        }
        tracing::info!(path = %to.path, permission = required.unwrap_or(""), "navigation denied");
        self.notifier.notify(Notice::error(NO_PERMISSION_MESSAGE));
        GuardOutcome::Redirect(Location::new(FORBIDDEN_PATH))
    }

    /// Load identity and permissions once per session. Returns the message
    /// to show when it fails.
    async fn bootstrap(&self) -> Result<(), String> {
        let _flight = self.bootstrap.lock().await;
        match self.auth.phase() {
            AuthPhase::AuthenticatedRolesLoaded => return Ok(()),
            AuthPhase::Unauthenticated => return Err(BOOTSTRAP_FAILED_MESSAGE.to_owned()),
            AuthPhase::AuthenticatedNoRolesLoaded => {}
        }

        match self.load_identity().await {
            Ok(()) => {
                self.auth.mark_roles_loaded();
                if self.auth.phase() == AuthPhase::AuthenticatedRolesLoaded {
                    Ok(())
                } else {
                    Err(BOOTSTRAP_FAILED_MESSAGE.to_owned())
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "session bootstrap failed");
                let message = err.to_string();
                Err(if message.is_empty() { BOOTSTRAP_FAILED_MESSAGE.to_owned() } else { message })
            }
        }
    }

    async fn load_identity(&self) -> Result<(), BootstrapError> {
        self.session.fetch_current_user().await?;
        self.permissions.fetch_permissions().await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "guard_test.rs"]
mod tests;
