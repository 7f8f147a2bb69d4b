//! Client-side state and the stores that act on it.
//!
//! DESIGN
//! ======
//! `auth` holds the shared session/permission cell. `session` and
//! `permission` are thin action facades over it that talk to the API, so
//! callers can depend on just the store they need.

pub mod auth;
pub mod permission;
pub mod session;
