//! MCP protocol client for the Stripe agent toolkit.
//!
//! [`McpClient`] validates credentials, discovers the remote tool catalog,
//! and invokes tools over short-lived sessions opened through an
//! [`McpTransport`]. [`HttpTransport`] is the streamable-HTTP default.

#![warn(missing_docs, clippy::pedantic)]

pub mod client;
pub mod constants;
pub mod http_transport;
pub mod key;
pub mod protocol;
pub mod sse;
pub mod transport;

mod http_client;

pub use client::{McpClient, McpClientConfig};
pub use constants::{
    ACCOUNT_HEADER, MCP_HEADER, MCP_SERVER_URL, SECRET_KEY_ENV, TOOLKIT_HEADER, VERSION,
};
pub use http_transport::HttpTransport;
pub use key::{Advisory, KeyKind, validate_secret_key};
pub use protocol::{CallToolResult, ClientInfo, ContentBlock};
pub use transport::{McpSession, McpTransport, SessionRequest, TransportError, TransportResult};
