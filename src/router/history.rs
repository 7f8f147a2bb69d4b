//! Navigation history.
//!
//! Shared between the router, which commits guarded navigations, and the
//! HTTP client, which pushes the login page when a request comes back 401.
//! While a navigation is in flight the router owns the next entry, so the
//! client leaves history alone and the guard's own redirect is committed.

use std::sync::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::route::{HOME_PATH, Location};

#[derive(Debug)]
pub struct History {
    entries: RwLock<Vec<Location>>,
    in_flight: AtomicUsize,
}

impl History {
    /// Start at `/`.
    #[must_use]
    pub fn new() -> Self {
        Self::starting_at(Location::new(HOME_PATH))
    }

    #[must_use]
    pub fn starting_at(location: Location) -> Self {
        Self { entries: RwLock::new(vec![location]), in_flight: AtomicUsize::new(0) }
    }

    #[must_use]
    pub fn current(&self) -> Location {
        self.entries
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .last()
            .cloned()
            .unwrap_or_else(|| Location::new(HOME_PATH))
    }

    pub fn push(&self, location: Location) {
        tracing::debug!(to = %location, "history push");
        self.entries
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(location);
    }

    /// Mark a navigation as running until the returned guard drops.
    #[must_use]
    pub fn begin_navigation(&self) -> PendingNavigation<'_> {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        PendingNavigation { history: self }
    }

    #[must_use]
    pub fn is_navigating(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    #[must_use]
    pub fn entries(&self) -> Vec<Location> {
        self.entries
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

/// Returned by [`History::begin_navigation`].
#[derive(Debug)]
pub struct PendingNavigation<'a> {
    history: &'a History,
}

impl Drop for PendingNavigation<'_> {
    fn drop(&mut self) {
        self.history.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}
