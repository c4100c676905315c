use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Map, Value};
use toolkit_mcp::{
    CallToolResult, McpSession, McpTransport, SessionRequest, TransportError, TransportResult,
};
use toolkit_primitives::McpTool;

/// In-memory MCP server answering every call with `ok:<tool>`.
#[derive(Default)]
pub(crate) struct FakeServer {
    pub(crate) tools: Vec<McpTool>,
    pub(crate) failing_opens: AtomicUsize,
    pub(crate) opened: AtomicUsize,
    pub(crate) calls: Mutex<Vec<(String, Value)>>,
}

impl FakeServer {
    pub(crate) fn with_tools(names: &[&str]) -> Arc<Self> {
        Self::with_descriptors(names.iter().map(|name| McpTool::new(*name)).collect())
    }

    pub(crate) fn with_descriptors(tools: Vec<McpTool>) -> Arc<Self> {
        Arc::new(Self {
            tools,
            ..Self::default()
        })
    }

    pub(crate) fn transport(self: &Arc<Self>) -> Arc<dyn McpTransport> {
        Arc::new(FakeTransport(Arc::clone(self)))
    }

    pub(crate) fn last_call(&self) -> (String, Value) {
        self.calls.lock().unwrap().last().cloned().unwrap()
    }
}

struct FakeTransport(Arc<FakeServer>);

struct FakeSession(Arc<FakeServer>);

#[async_trait]
impl McpTransport for FakeTransport {
    async fn open(&self, _request: &SessionRequest) -> TransportResult<Box<dyn McpSession>> {
        self.0.opened.fetch_add(1, Ordering::SeqCst);
        if self
            .0
            .failing_opens
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(TransportError::http("connection refused"));
        }
        Ok(Box::new(FakeSession(Arc::clone(&self.0))))
    }
}

#[async_trait]
impl McpSession for FakeSession {
    async fn list_tools(&mut self) -> TransportResult<Vec<McpTool>> {
        Ok(self.0.tools.clone())
    }

    async fn call_tool(
        &mut self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> TransportResult<CallToolResult> {
        self.0
            .calls
            .lock()
            .unwrap()
            .push((name.to_owned(), Value::Object(arguments)));
        Ok(CallToolResult::text(format!("ok:{name}")))
    }

    async fn close(self: Box<Self>) -> TransportResult<()> {
        Ok(())
    }
}
