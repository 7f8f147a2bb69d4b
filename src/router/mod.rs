//! Client-side routing: route table, history, and the guarded navigator.
//!
//! DESIGN
//! ======
//! `Router::navigate` resolves static redirects from the table, asks the
//! guard, follows guard redirects, and commits the final location to
//! history. A redirect chain longer than `MAX_REDIRECTS` is treated as a loop.

pub mod guard;
pub mod history;
pub mod route;

use std::sync::Arc;

use guard::{GuardOutcome, NavigationGuard};
use history::History;
use route::{Location, RouteRecord, RouteTable};

const MAX_REDIRECTS: usize = 8;

#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("too many redirects while navigating to {0}")]
    RedirectLoop(String),
}

/// Where a navigation ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub location: Location,
    pub route: Option<RouteRecord>,
    /// `true` when the final location differs from the requested one.
    pub redirected: bool,
}

pub struct Router {
    table: RouteTable,
    guard: NavigationGuard,
    history: Arc<History>,
}

impl Router {
    #[must_use]
    pub fn new(table: RouteTable, guard: NavigationGuard, history: Arc<History>) -> Self {
        Self { table, guard, history }
    }

    #[must_use]
    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    #[must_use]
    pub fn current(&self) -> Location {
        self.history.current()
    }

    /// Navigate to `target` (a path, optionally with a query string).
    ///
    /// # Errors
    ///
    /// [`RouteError::RedirectLoop`] if redirects never settle.
    pub async fn navigate(&self, target: &str) -> Result<Navigation, RouteError> {
        let _pending = self.history.begin_navigation();
        let mut location = Location::parse(target);
        let mut redirected = false;

        for _ in 0..MAX_REDIRECTS {
            let route = self.table.resolve(&location.path);
            if let Some(redirect) = route.and_then(|r| r.redirect.as_deref()) {
                location = Location { path: redirect.to_owned(), query: location.query };
                redirected = true;
                continue;
            }

            match self.guard.evaluate(&location, route).await {
                GuardOutcome::Proceed => {
                    tracing::info!(to = %location, redirected, "navigated");
                    self.history.push(location.clone());
                    return Ok(Navigation { location, route: route.cloned(), redirected });
                }
                GuardOutcome::Redirect(next) => {
                    tracing::debug!(from = %location, to = %next, "guard redirect");
                    location = next;
                    redirected = true;
                }
            }
        }

        tracing::error!(requested = target, "redirect loop");
        Err(RouteError::RedirectLoop(target.to_owned()))
    }
}

#[cfg(test)]
#[path = "router_test.rs"]
mod tests;
