use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use serde_json::{Map, Value, json};
use stripe_agent_toolkit::config::{Actions, Configuration, Permission};
use stripe_agent_toolkit::kernel::AsyncInitializer;
use stripe_agent_toolkit::mcp::{
    Advisory, CallToolResult, KeyKind, McpClient, McpClientConfig, McpSession, McpTransport,
    SessionRequest, TransportError, TransportResult, validate_secret_key,
};
use stripe_agent_toolkit::policy::is_tool_allowed;
use stripe_agent_toolkit::toolkit::{FunctionToolConverter, PassthroughConverter, ToolkitCore};
use stripe_agent_toolkit::{Context, McpTool, StripeAgentToolkit, ToolkitError};

#[derive(Default)]
struct MockServer {
    tools: Vec<McpTool>,
    list_delay: Option<Duration>,
    failing_opens: AtomicUsize,
    opened: AtomicUsize,
    calls: Mutex<Vec<(String, Value)>>,
}

impl MockServer {
    fn new(names: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            tools: names.iter().map(|name| McpTool::new(*name)).collect(),
            ..Self::default()
        })
    }

    fn transport(self: &Arc<Self>) -> Arc<dyn McpTransport> {
        Arc::new(MockTransport(Arc::clone(self)))
    }
}

struct MockTransport(Arc<MockServer>);
struct MockSession(Arc<MockServer>);

#[async_trait]
impl McpTransport for MockTransport {
    async fn open(&self, _request: &SessionRequest) -> TransportResult<Box<dyn McpSession>> {
        self.0.opened.fetch_add(1, Ordering::SeqCst);
        let fail = self
            .0
            .failing_opens
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if fail {
            return Err(TransportError::Status {
                status: 503,
                body: "unavailable".into(),
            });
        }
        Ok(Box::new(MockSession(Arc::clone(&self.0))))
    }
}

#[async_trait]
impl McpSession for MockSession {
    async fn list_tools(&mut self) -> TransportResult<Vec<McpTool>> {
        if let Some(delay) = self.0.list_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.0.tools.clone())
    }

    async fn call_tool(
        &mut self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> TransportResult<CallToolResult> {
        let echoed = Value::Object(arguments);
        self.0
            .calls
            .lock()
            .unwrap()
            .push((name.to_owned(), echoed.clone()));
        Ok(CallToolResult::text(echoed.to_string()))
    }

    async fn close(self: Box<Self>) -> TransportResult<()> {
        Ok(())
    }
}

fn passthrough(server: &Arc<MockServer>, configuration: Configuration) -> ToolkitCore<PassthroughConverter> {
    ToolkitCore::with_transport(
        "rk_test_123",
        configuration,
        PassthroughConverter,
        server.transport(),
    )
    .unwrap()
}

#[tokio::test]
async fn concurrent_initialize_runs_discovery_once() {
    let server = Arc::new(MockServer {
        tools: vec![McpTool::new("create_customer")],
        list_delay: Some(Duration::from_millis(20)),
        ..MockServer::default()
    });
    let toolkit = passthrough(&server, Configuration::default());

    let results = join_all((0..10).map(|_| toolkit.initialize())).await;

    assert!(results.iter().all(Result::is_ok));
    assert_eq!(server.opened.load(Ordering::SeqCst), 1);
    assert!(toolkit.is_initialized());
}

#[tokio::test]
async fn failed_initialize_is_retried() {
    let server = MockServer::new(&["create_customer"]);
    server.failing_opens.store(1, Ordering::SeqCst);
    let toolkit = passthrough(&server, Configuration::default());

    let err = toolkit.initialize().await.unwrap_err();
    assert!(matches!(err, ToolkitError::Connection { .. }));
    assert!(err.to_string().contains("HTTP 503"));
    assert!(!toolkit.is_initialized());

    toolkit.initialize().await.unwrap();
    assert!(toolkit.is_initialized());
    assert_eq!(server.opened.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn guard_reset_uninitializes() {
    let guard = AsyncInitializer::<ToolkitError>::new();
    guard.initialize(|| async { Ok(()) }).await.unwrap();
    assert!(guard.is_initialized());
    guard.reset();
    assert!(!guard.is_initialized());
}

#[test]
fn permission_filter_cases() {
    let empty = Configuration::default();
    assert!(is_tool_allowed("create_customer", &empty));

    let granted = Configuration::new()
        .with_actions(Actions::new().grant("customers", Permission::Create, true));
    assert!(is_tool_allowed("create_customer", &granted));
    assert!(is_tool_allowed("totally_unknown_operation", &granted));

    let denied = Configuration::new()
        .with_actions(Actions::new().grant("customers", Permission::Create, false));
    assert!(!is_tool_allowed("create_customer", &denied));

    let other = Configuration::new()
        .with_actions(Actions::new().grant("products", Permission::Create, true));
    assert!(!is_tool_allowed("create_customer", &other));
}

#[tokio::test]
async fn get_tools_before_initialize_fails() {
    let server = MockServer::new(&["create_customer"]);
    let toolkit = passthrough(&server, Configuration::default());
    assert_eq!(toolkit.get_tools().unwrap_err(), ToolkitError::NotInitialized);
}

#[tokio::test]
async fn call_tool_before_connect_fails() {
    let server = MockServer::new(&["create_customer"]);
    let client = McpClient::with_transport(McpClientConfig::new("rk_test_123"), server.transport())
        .unwrap();

    let err = client
        .call_tool("create_customer", Map::new(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ToolkitError::NotConnected { .. }));
    assert_eq!(server.opened.load(Ordering::SeqCst), 0);
}

#[test]
fn key_validation() {
    let err = validate_secret_key("invalid_key_123").unwrap_err();
    assert!(matches!(err, ToolkitError::Configuration { .. }));
    assert!(err.to_string().contains("Invalid API key format"));

    let secret = validate_secret_key("sk_test_123").unwrap();
    assert_eq!(secret.advisory(), Some(Advisory::DeprecatedSecretKey));

    let restricted = validate_secret_key("rk_test_123").unwrap();
    assert_eq!(restricted, KeyKind::Restricted);
    assert_eq!(restricted.advisory(), None);
}

#[tokio::test]
async fn double_close_keeps_toolkit_uninitialized() {
    let server = MockServer::new(&["create_customer"]);
    let toolkit = passthrough(&server, Configuration::default());
    toolkit.initialize().await.unwrap();

    toolkit.close();
    toolkit.close();

    assert_eq!(toolkit.get_tools().unwrap_err(), ToolkitError::NotInitialized);
    assert!(!toolkit.client().is_connected());
}

#[tokio::test]
async fn function_tools_end_to_end() {
    let server = MockServer::new(&["create_customer", "list_customers", "create_invoice"]);
    let configuration = Configuration::new()
        .with_actions(
            Actions::new()
                .grant("customers", Permission::Create, true)
                .grant("invoices", Permission::Create, true),
        )
        .with_context(Context::default().with_customer("cus_ctx"));
    let toolkit: StripeAgentToolkit = ToolkitCore::with_transport(
        "rk_test_123",
        configuration,
        FunctionToolConverter,
        server.transport(),
    )
    .unwrap();
    toolkit.initialize().await.unwrap();

    let tools = toolkit.get_tools().unwrap();
    let names: Vec<_> = tools.iter().map(|tool| tool.name()).collect();
    assert_eq!(names, ["create_customer", "create_invoice"]);

    let invoice = tools.iter().find(|tool| tool.name() == "create_invoice").unwrap();
    let output = invoice.call(r#"{"customer": "cus_other"}"#).await.unwrap();
    let echoed: Value = serde_json::from_str(&output).unwrap();
    assert_eq!(echoed, json!({"customer": "cus_ctx"}));

    let direct = toolkit
        .run_tool("create_invoice", Map::new(), Some("cus_override"))
        .await
        .unwrap();
    assert_eq!(
        serde_json::from_str::<Value>(&direct).unwrap(),
        json!({"customer": "cus_override"})
    );
    assert_eq!(server.calls.lock().unwrap().len(), 2);
}
