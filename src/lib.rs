//! # admin-console
//!
//! Client library for the admin management console: login, profile
//! management, role/permission/menu administration and operation-log
//! viewing against the console's REST API.
//!
//! The interesting part is the authentication/authorization gate that spans
//! three layers: the HTTP client (`net`), the session and permission stores
//! (`state`), and the navigation guard (`router`). [`app::Console`] wires them
//! together once at startup and hands out the pieces by reference.

pub mod app;
pub mod config;
pub mod net;
pub mod notify;
pub mod router;
pub mod state;
pub mod storage;
pub mod util;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use app::Console;
pub use config::ClientConfig;
