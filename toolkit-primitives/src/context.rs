//! Settings applied to every request made on behalf of the integration.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies which surface is driving the client; selects the `User-Agent`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Running behind a local MCP server facade.
    #[serde(rename = "modelcontextprotocol")]
    ModelContextProtocol,
    /// Embedded in an agent framework.
    #[default]
    Toolkit,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ModelContextProtocol => "modelcontextprotocol",
            Self::Toolkit => "toolkit",
        })
    }
}

/// Connection context shared by every call.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    /// Connected account the requests are made for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    /// Customer the requests are scoped to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<String>,
    /// Calling surface.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<Mode>,
}

impl Context {
    /// Sets the connected account.
    #[must_use]
    pub fn with_account(mut self, account: impl Into<String>) -> Self {
        self.account = Some(account.into());
        self
    }

    /// Sets the default customer.
    #[must_use]
    pub fn with_customer(mut self, customer: impl Into<String>) -> Self {
        self.customer = Some(customer.into());
        self
    }

    /// Sets the calling surface.
    #[must_use]
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = Some(mode);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_uses_wire_names() {
        let ctx: Context = serde_json::from_str(
            r#"{ "account": "acct_123", "mode": "modelcontextprotocol" }"#,
        )
        .unwrap();
        assert_eq!(ctx.account.as_deref(), Some("acct_123"));
        assert_eq!(ctx.mode, Some(Mode::ModelContextProtocol));
        assert_eq!(ctx.customer, None);
    }
}
