//! Network layer: the intercepting HTTP client, wire types, and the admin
//! resource helpers built on top of it.

pub mod api;
pub mod http;
pub mod types;
