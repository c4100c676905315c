//! Endpoint, header, and environment constants shared by the client.

/// Crate version reported in the `User-Agent` header.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default remote MCP endpoint.
pub const MCP_SERVER_URL: &str = "https://mcp.stripe.com";

/// Client identifier used when embedded in an agent framework.
pub const TOOLKIT_HEADER: &str = "stripe-agent-toolkit-rust";

/// Client identifier used when running behind a local MCP server facade.
pub const MCP_HEADER: &str = "stripe-mcp-rust";

/// Header carrying the connected account id.
pub const ACCOUNT_HEADER: &str = "Stripe-Account";

/// Environment variable read by [`McpClientConfig::from_env`](crate::McpClientConfig::from_env).
pub const SECRET_KEY_ENV: &str = "STRIPE_SECRET_KEY";

/// Header carrying the server-assigned session id.
pub const SESSION_ID_HEADER: &str = "mcp-session-id";

/// Header carrying the negotiated protocol version.
pub const PROTOCOL_VERSION_HEADER: &str = "mcp-protocol-version";
