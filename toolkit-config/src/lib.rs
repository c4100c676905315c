//! Configuration management for the toolkit.
//!
//! A [`Configuration`] carries the caller's capability allow-list (`actions`)
//! and the connection [`Context`](toolkit_primitives::Context). It is supplied
//! once when a toolkit is constructed and never mutated afterwards.

#![warn(missing_docs, clippy::pedantic)]

pub mod loader;
pub mod schema;

pub use loader::{ConfigError, ConfigResult};
pub use schema::{Actions, Configuration, Permission, Permissions};
