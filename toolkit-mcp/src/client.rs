//! Connection lifecycle and tool invocation against the remote MCP server.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use std::{env, fmt};

use hyper::Uri;
use serde_json::{Map, Value};
use toolkit_kernel::AsyncInitializer;
use toolkit_primitives::{Context, McpTool, Mode, ToolkitError, ToolkitResult};
use tracing::{debug, info, warn};

use crate::constants::{
    ACCOUNT_HEADER, MCP_HEADER, MCP_SERVER_URL, SECRET_KEY_ENV, TOOLKIT_HEADER, VERSION,
};
use crate::http_transport::HttpTransport;
use crate::key::{Advisory, KeyKind, validate_secret_key};
use crate::protocol::{CallToolResult, ClientInfo};
use crate::transport::{McpSession, McpTransport, SessionRequest, TransportResult};

/// Settings for [`McpClient`].
#[derive(Clone)]
pub struct McpClientConfig {
    secret_key: String,
    account: Option<String>,
    customer: Option<String>,
    mode: Mode,
    base_url: String,
    timeout: Option<Duration>,
}

impl fmt::Debug for McpClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("McpClientConfig")
            .field("account", &self.account)
            .field("customer", &self.customer)
            .field("mode", &self.mode)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl McpClientConfig {
    /// Creates a configuration for the default endpoint.
    #[must_use]
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            account: None,
            customer: None,
            mode: Mode::default(),
            base_url: MCP_SERVER_URL.to_owned(),
            timeout: None,
        }
    }

    /// Reads the key from `STRIPE_SECRET_KEY`.
    ///
    /// A missing variable yields an empty key, which [`McpClient::new`] rejects.
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(env::var(SECRET_KEY_ENV).unwrap_or_default())
    }

    /// Applies the account, customer, and mode of `context`.
    #[must_use]
    pub fn with_context(mut self, context: &Context) -> Self {
        self.account.clone_from(&context.account);
        self.customer.clone_from(&context.customer);
        self.mode = context.mode.unwrap_or_default();
        self
    }

    /// Sends `Stripe-Account` on every request.
    #[must_use]
    pub fn with_account(mut self, account: impl Into<String>) -> Self {
        self.account = Some(account.into());
        self
    }

    /// Sets the default customer injected into tool calls.
    #[must_use]
    pub fn with_customer(mut self, customer: impl Into<String>) -> Self {
        self.customer = Some(customer.into());
        self
    }

    /// Selects the client identifier sent in `User-Agent`.
    #[must_use]
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Overrides the MCP endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ToolkitError::Configuration`] if the URL lacks an HTTP(S)
    /// scheme or does not parse.
    pub fn with_base_url(mut self, base_url: impl AsRef<str>) -> ToolkitResult<Self> {
        self.base_url = sanitize_base_url(base_url.as_ref())?;
        Ok(self)
    }

    /// Bounds each HTTP exchange. Unbounded by default.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Connected account, if any.
    #[must_use]
    pub fn account(&self) -> Option<&str> {
        self.account.as_deref()
    }

    /// Default customer, if any.
    #[must_use]
    pub fn customer(&self) -> Option<&str> {
        self.customer.as_deref()
    }

    /// Client mode.
    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// MCP endpoint.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Per-exchange timeout.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn client_id(&self) -> &'static str {
        match self.mode {
            Mode::ModelContextProtocol => MCP_HEADER,
            Mode::Toolkit => TOOLKIT_HEADER,
        }
    }
}

fn sanitize_base_url(input: &str) -> ToolkitResult<String> {
    let base = input.trim().trim_end_matches('/');
    if !(base.starts_with("http://") || base.starts_with("https://")) {
        return Err(ToolkitError::configuration(
            "MCP base URL must start with http:// or https://",
        ));
    }
    base.parse::<Uri>()
        .map_err(|err| ToolkitError::configuration(format!("invalid MCP base URL: {err}")))?;
    Ok(base.to_owned())
}

/// Client for the remote Stripe MCP server.
///
/// [`connect`](Self::connect) discovers the tool catalog once; every
/// operation afterwards opens its own short-lived session.
pub struct McpClient {
    config: McpClientConfig,
    key_kind: KeyKind,
    transport: Arc<dyn McpTransport>,
    tools: RwLock<Vec<McpTool>>,
    initializer: AsyncInitializer<ToolkitError>,
}

impl fmt::Debug for McpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("McpClient")
            .field("config", &self.config)
            .field("key_kind", &self.key_kind)
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

impl McpClient {
    /// Creates a client using the HTTP transport.
    ///
    /// # Errors
    ///
    /// Returns [`ToolkitError::Configuration`] if the key is empty or malformed.
    pub fn new(config: McpClientConfig) -> ToolkitResult<Self> {
        let transport = HttpTransport::new().with_timeout(config.timeout);
        Self::with_transport(config, Arc::new(transport))
    }

    /// Creates a client over a caller-supplied transport.
    ///
    /// # Errors
    ///
    /// Returns [`ToolkitError::Configuration`] if the key is empty or malformed.
    pub fn with_transport(
        config: McpClientConfig,
        transport: Arc<dyn McpTransport>,
    ) -> ToolkitResult<Self> {
        let key_kind = validate_secret_key(&config.secret_key)?;
        if let Some(advisory) = key_kind.advisory() {
            warn!(%advisory, "deprecated key type");
        }

        Ok(Self {
            config,
            key_kind,
            transport,
            tools: RwLock::new(Vec::new()),
            initializer: AsyncInitializer::new(),
        })
    }

    /// Configuration the client was built with.
    #[must_use]
    pub fn config(&self) -> &McpClientConfig {
        &self.config
    }

    /// Kind of key in use.
    #[must_use]
    pub fn key_kind(&self) -> KeyKind {
        self.key_kind
    }

    /// Returns `true` after a successful [`connect`](Self::connect).
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.initializer.is_initialized()
    }

    /// Discovers the remote tool catalog.
    ///
    /// Concurrent callers share one discovery; a failed discovery is retried
    /// by the next call.
    ///
    /// # Errors
    ///
    /// Returns [`ToolkitError::Connection`] if the server cannot be reached or
    /// the handshake or listing fails.
    pub async fn connect(&self) -> ToolkitResult<()> {
        self.initializer.initialize(|| self.discover()).await
    }

    async fn discover(&self) -> ToolkitResult<()> {
        let tools = self.list_remote_tools().await.map_err(|err| {
            ToolkitError::connection(format!(
                "Failed to connect to Stripe MCP server at {}. \
                 No fallback to direct SDK is available. Error: {err}",
                self.config.base_url
            ))
        })?;

        let tools = collapse_duplicates(tools);
        info!(
            count = tools.len(),
            endpoint = %self.config.base_url,
            "discovered MCP tools"
        );
        *self.tools.write().unwrap_or_else(PoisonError::into_inner) = tools;
        Ok(())
    }

    async fn list_remote_tools(&self) -> TransportResult<Vec<McpTool>> {
        let mut session = self.transport.open(&self.session_request()).await?;
        let result = session.list_tools().await;
        close_session(session).await;
        result
    }

    /// Returns the discovered catalog.
    ///
    /// # Errors
    ///
    /// Returns [`ToolkitError::NotConnected`] before a successful connect.
    pub fn get_tools(&self) -> ToolkitResult<Vec<McpTool>> {
        if !self.is_connected() {
            return Err(ToolkitError::NotConnected {
                action: "getting tools",
            });
        }
        Ok(self
            .tools
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    /// Invokes `name` with `args` and returns its textual result.
    ///
    /// The per-call `customer` takes precedence over the configured one; the
    /// chosen customer replaces any `customer` already present in `args`.
    ///
    /// # Errors
    ///
    /// Returns [`ToolkitError::NotConnected`] before a successful connect and
    /// [`ToolkitError::ToolExecution`] when the call fails remotely or in
    /// transit.
    pub async fn call_tool(
        &self,
        name: &str,
        args: Map<String, Value>,
        customer: Option<&str>,
    ) -> ToolkitResult<String> {
        if !self.is_connected() {
            return Err(ToolkitError::NotConnected {
                action: "calling tools",
            });
        }

        let arguments = self.apply_customer(args, customer);
        let result = self
            .invoke(name, arguments)
            .await
            .map_err(|err| ToolkitError::tool_execution(name, err.to_string()))?;

        if result.is_error {
            let reason = result.first_text().unwrap_or("Tool execution failed");
            return Err(ToolkitError::tool_execution(name, reason));
        }

        match result.first_text() {
            Some(text) if !text.is_empty() => Ok(text.to_owned()),
            _ => serde_json::to_string(&result)
                .map_err(|err| ToolkitError::tool_execution(name, err.to_string())),
        }
    }

    fn apply_customer(
        &self,
        mut args: Map<String, Value>,
        customer: Option<&str>,
    ) -> Map<String, Value> {
        let effective = customer
            .filter(|c| !c.is_empty())
            .or_else(|| self.config.customer().filter(|c| !c.is_empty()));
        let Some(effective) = effective else {
            return args;
        };

        if let Some(existing) = args
            .get("customer")
            .filter(|value| is_truthy(value) && value.as_str() != Some(effective))
        {
            let advisory = Advisory::CustomerConflict {
                from_args: existing
                    .as_str()
                    .map_or_else(|| existing.to_string(), str::to_owned),
                effective: effective.to_owned(),
            };
            warn!(%advisory, "customer overridden");
        }

        args.insert("customer".to_owned(), Value::String(effective.to_owned()));
        args
    }

    async fn invoke(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> TransportResult<CallToolResult> {
        let mut session = self.transport.open(&self.session_request()).await?;
        let result = session.call_tool(name, arguments).await;
        close_session(session).await;
        debug!(tool = name, ok = result.is_ok(), "tool call finished");
        result
    }

    /// Forgets the catalog and returns to the disconnected state.
    ///
    /// Calling this on a disconnected client does nothing.
    pub fn disconnect(&self) {
        if !self.is_connected() {
            return;
        }
        self.tools
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.initializer.reset();
        debug!("MCP client disconnected");
    }

    fn session_request(&self) -> SessionRequest {
        let client_id = self.config.client_id();
        let request = SessionRequest::new(
            self.config.base_url.as_str(),
            ClientInfo {
                name: client_id.to_owned(),
                version: VERSION.to_owned(),
            },
        )
        .with_header("Authorization", format!("Bearer {}", self.config.secret_key))
        .with_header("User-Agent", format!("{client_id}/{VERSION}"));

        match self.config.account() {
            Some(account) => request.with_header(ACCOUNT_HEADER, account),
            None => request,
        }
    }
}

async fn close_session(session: Box<dyn McpSession>) {
    if let Err(err) = session.close().await {
        debug!(%err, "failed to close MCP session");
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => false,
        Value::String(text) => !text.is_empty(),
        _ => true,
    }
}

/// Keeps one descriptor per name: the last one listed, at the first position.
fn collapse_duplicates(tools: Vec<McpTool>) -> Vec<McpTool> {
    let mut positions: HashMap<String, usize> = HashMap::with_capacity(tools.len());
    let mut unique: Vec<McpTool> = Vec::with_capacity(tools.len());

    for tool in tools {
        if let Some(&index) = positions.get(tool.name()) {
            warn!(tool = tool.name(), "server listed a tool more than once; keeping the last");
            unique[index] = tool;
        } else {
            positions.insert(tool.name().to_owned(), unique.len());
            unique.push(tool);
        }
    }

    unique
}
