//! Permission filtering for remotely discovered tools.
//!
//! The remote server's scoped credential is the authoritative access gate.
//! This crate narrows the exposed tool set further using a compiled table of
//! the permissions each known tool requires. Unknown tools are never hidden.

#![warn(missing_docs, clippy::pedantic)]

pub mod decision;
pub mod filter;
pub mod table;

pub use decision::{DecisionKind, PolicyDecision};
pub use filter::{evaluate, filter_tools, is_tool_allowed};
pub use table::{TOOL_PERMISSIONS, ToolPermission, required_permissions};
