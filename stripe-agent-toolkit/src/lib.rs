//! Stripe agent toolkit facade.
//!
//! Depend on this crate via `cargo add stripe-agent-toolkit`. It bundles the
//! toolkit crates behind feature flags; the default set enables everything.
//!
//! ```no_run
//! # async fn demo() -> Result<(), stripe_agent_toolkit::ToolkitError> {
//! use stripe_agent_toolkit::config::Configuration;
//! use stripe_agent_toolkit::toolkit::{FunctionToolConverter, create_toolkit};
//!
//! let toolkit = create_toolkit("rk_test_...", Configuration::default(), FunctionToolConverter).await?;
//! for tool in toolkit.get_tools()?.iter() {
//!     println!("{}", tool.to_json());
//! }
//! toolkit.close();
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs, clippy::pedantic)]

/// Re-export shared primitives for convenience.
pub use toolkit_primitives as primitives;
pub use toolkit_primitives::{Context, McpTool, Mode, ToolkitError, ToolkitResult};

/// Capability configuration (enabled by `config` feature).
#[cfg(feature = "config")]
pub use toolkit_config as config;

/// Initialization guard (enabled by `kernel` feature).
#[cfg(feature = "kernel")]
pub use toolkit_kernel as kernel;

/// Permission filter (enabled by `policy` feature).
#[cfg(feature = "policy")]
pub use toolkit_policy as policy;

/// MCP protocol client (enabled by `mcp` feature).
#[cfg(feature = "mcp")]
pub use toolkit_mcp as mcp;

/// Toolkit base and tool converters (enabled by `core` feature).
#[cfg(feature = "core")]
pub use toolkit_core as toolkit;

/// Tracing setup (enabled by `telemetry` feature).
#[cfg(feature = "telemetry")]
pub use toolkit_telemetry as telemetry;

/// Toolkit exposing function-calling tools.
#[cfg(feature = "core")]
pub type StripeAgentToolkit = toolkit_core::ToolkitCore<toolkit_core::FunctionToolConverter>;
