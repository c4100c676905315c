//! Shared error definitions for the toolkit.

use thiserror::Error;

/// Result alias used throughout the toolkit.
pub type ToolkitResult<T> = Result<T, ToolkitError>;

/// Errors surfaced by the protocol client and the toolkit base.
///
/// The type is `Clone` because a single failed initialization attempt is
/// reported to every caller that was waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolkitError {
    /// The credential is missing or malformed. Never retried automatically.
    #[error("{reason}")]
    Configuration {
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// Discovery or handshake with the remote server failed. Retriable.
    #[error("{reason}")]
    Connection {
        /// Description of the failure, including the remote endpoint.
        reason: String,
    },

    /// The toolkit was used before `initialize()` completed.
    #[error("toolkit not initialized. Call initialize() first.")]
    NotInitialized,

    /// The protocol client was used before `connect()` completed.
    #[error("MCP client not connected. Call connect() before {action}.")]
    NotConnected {
        /// The operation that was attempted, e.g. "calling tools".
        action: &'static str,
    },

    /// A single tool invocation failed, remotely or in transport.
    #[error("Failed to execute tool '{tool}': {reason}")]
    ToolExecution {
        /// Name of the tool that failed.
        tool: String,
        /// Remote error text or transport failure description.
        reason: String,
    },
}

impl ToolkitError {
    /// Convenience constructor for configuration failures.
    #[must_use]
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    /// Convenience constructor for connection failures.
    #[must_use]
    pub fn connection(reason: impl Into<String>) -> Self {
        Self::Connection {
            reason: reason.into(),
        }
    }

    /// Convenience constructor for tool execution failures.
    #[must_use]
    pub fn tool_execution(tool: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ToolExecution {
            tool: tool.into(),
            reason: reason.into(),
        }
    }

    /// Returns `true` when retrying the same call may succeed.
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::ToolExecution { .. })
    }
}
