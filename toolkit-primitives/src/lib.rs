//! Core shared types for the Stripe agent toolkit.

#![warn(missing_docs, clippy::pedantic)]

mod context;
mod error;
mod tool;

/// Connection-time context applied to every remote request.
pub use context::{Context, Mode};
/// Error taxonomy and result alias shared across the toolkit.
pub use error::{ToolkitError, ToolkitResult};
/// Remote tool descriptors discovered from the MCP server.
pub use tool::{InputSchema, McpTool};
