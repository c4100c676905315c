//! Seam between the client and the wire.
//!
//! [`McpClient`](crate::McpClient) opens one [`McpSession`] per operation
//! through an [`McpTransport`]. The default implementation speaks streamable
//! HTTP; tests substitute in-memory transports.

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;
use toolkit_primitives::McpTool;

use crate::protocol::{CallToolResult, ClientInfo, JsonRpcError};

/// Result alias for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Failures raised below the client.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The request could not be sent or the body could not be read.
    #[error("HTTP transport error: {reason}")]
    Http {
        /// Underlying failure.
        reason: String,
    },

    /// The server answered with a non-success status.
    #[error("server returned HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly empty.
        body: String,
    },

    /// The server answered with something that is not valid MCP.
    #[error("protocol error: {reason}")]
    Protocol {
        /// What was wrong with the response.
        reason: String,
    },

    /// The server answered with a JSON-RPC error.
    #[error("server error: {0}")]
    Rpc(#[from] JsonRpcError),

    /// The request exceeded the configured timeout.
    #[error("request timed out")]
    Timeout,
}

impl TransportError {
    /// Convenience constructor for HTTP failures.
    #[must_use]
    pub fn http(reason: impl Into<String>) -> Self {
        Self::Http {
            reason: reason.into(),
        }
    }

    /// Convenience constructor for malformed responses.
    #[must_use]
    pub fn protocol(reason: impl Into<String>) -> Self {
        Self::Protocol {
            reason: reason.into(),
        }
    }
}

/// Everything a transport needs to open a session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionRequest {
    endpoint: String,
    headers: Vec<(&'static str, String)>,
    client_info: ClientInfo,
}

impl SessionRequest {
    /// Creates a request for `endpoint` with no extra headers.
    #[must_use]
    pub fn new(endpoint: impl Into<String>, client_info: ClientInfo) -> Self {
        Self {
            endpoint: endpoint.into(),
            headers: Vec::new(),
            client_info,
        }
    }

    /// Adds a header sent with every request of the session.
    #[must_use]
    pub fn with_header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    /// Target endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Headers in insertion order.
    #[must_use]
    pub fn headers(&self) -> &[(&'static str, String)] {
        &self.headers
    }

    /// Case-insensitive header lookup.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Identity announced in the handshake.
    #[must_use]
    pub fn client_info(&self) -> &ClientInfo {
        &self.client_info
    }
}

/// Opens handshaken sessions against an MCP server.
#[async_trait]
pub trait McpTransport: Send + Sync {
    /// Opens a session and completes the `initialize` handshake.
    async fn open(&self, request: &SessionRequest) -> TransportResult<Box<dyn McpSession>>;
}

/// A live, initialized session.
#[async_trait]
pub trait McpSession: Send {
    /// Lists every tool the server exposes, following pagination.
    async fn list_tools(&mut self) -> TransportResult<Vec<McpTool>>;

    /// Invokes a tool.
    async fn call_tool(
        &mut self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> TransportResult<CallToolResult>;

    /// Ends the session.
    async fn close(self: Box<Self>) -> TransportResult<()>;
}
