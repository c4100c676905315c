//! Framework-agnostic base for Stripe agent toolkits.
//!
//! A [`ToolkitCore`] owns the protocol client, applies the capability
//! configuration to the discovered catalog, and delegates the final shape of
//! the tools to a [`ToolConverter`]. Framework integrations only supply the
//! converter.

#![warn(missing_docs, clippy::pedantic)]

pub mod bridge;
pub mod converter;
pub mod function;
pub mod schema;
pub mod toolkit;

#[cfg(test)]
mod testing;

pub use converter::{PassthroughConverter, ToolConverter, ToolRunner};
pub use function::{
    FunctionDefinition, FunctionTool, FunctionToolConverter, ToolCall, ToolCallFunction,
    ToolMessage,
};
pub use schema::{Field, FieldKind, ObjectShape, SchemaViolation};
pub use toolkit::{ToolkitCore, create_toolkit};
