//! Jsonbay Core - Shared configuration types
//!
//! This crate contains the canonical `AppConfig` shape shared between the
//! Jsonbay CLI (`jsonbay`) and the runtime (`jsonbay-runtime`), along with
//! the persisted configuration artifact read/write and overlay merging.

mod config;
mod error;

pub use config::*;
pub use error::*;
