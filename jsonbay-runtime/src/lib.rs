//! Jsonbay Runtime - Per-process bootstrap for served instances
//!
//! This crate wires a served Jsonbay instance at cold start: it selects a
//! storage adapter and an auth strategy from the canonical configuration and
//! exposes one memoized initialization future shared by every request. The
//! CRUD/GraphQL surface of the served API lives outside this crate; here is
//! only the request gate and the capabilities it hands out.

mod auth;
mod bootstrap;
mod server;
mod storage;

pub use auth::*;
pub use bootstrap::*;
pub use server::*;
pub use storage::*;
