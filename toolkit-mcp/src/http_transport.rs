//! Streamable-HTTP transport over hyper and rustls.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use hyper::body::{HttpBody as _, to_bytes};
use hyper::header::{ACCEPT, CONTENT_TYPE};
use hyper::{Body, Request, Response, Uri};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use tokio::time::timeout;
use toolkit_primitives::McpTool;
use tracing::{debug, trace};

use crate::constants::{PROTOCOL_VERSION_HEADER, SESSION_ID_HEADER};
use crate::http_client::{HyperClient, build_https_client};
use crate::protocol::{
    CallToolResult, ClientInfo, InitializeParams, InitializeResult, JsonRpcNotification,
    JsonRpcRequest, JsonRpcResponse, ListToolsResult, PROTOCOL_VERSION,
};
use crate::sse::{SseDecoder, SseEvent};
use crate::transport::{McpSession, McpTransport, SessionRequest, TransportError, TransportResult};

/// Default transport: one HTTPS conversation per session.
#[derive(Clone)]
pub struct HttpTransport {
    client: HyperClient,
    timeout: Option<Duration>,
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpTransport {
    /// Creates a transport with no request timeout.
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: build_https_client(),
            timeout: None,
        }
    }

    /// Bounds every HTTP exchange by `limit`.
    #[must_use]
    pub fn with_timeout(mut self, limit: Option<Duration>) -> Self {
        self.timeout = limit;
        self
    }
}

#[async_trait]
impl McpTransport for HttpTransport {
    async fn open(&self, request: &SessionRequest) -> TransportResult<Box<dyn McpSession>> {
        let endpoint = request.endpoint().parse::<Uri>().map_err(|err| {
            TransportError::http(format!("invalid endpoint {}: {err}", request.endpoint()))
        })?;

        let mut session = HttpSession {
            client: self.client.clone(),
            endpoint,
            headers: request.headers().to_vec(),
            session_id: None,
            protocol_version: None,
            next_id: 1,
            timeout: self.timeout,
        };
        session.handshake(request.client_info()).await?;
        Ok(Box::new(session))
    }
}

struct HttpSession {
    client: HyperClient,
    endpoint: Uri,
    headers: Vec<(&'static str, String)>,
    session_id: Option<String>,
    protocol_version: Option<String>,
    next_id: u64,
    timeout: Option<Duration>,
}

impl HttpSession {
    async fn handshake(&mut self, client_info: &ClientInfo) -> TransportResult<()> {
        let params = encode(
            "initialize",
            &InitializeParams {
                protocol_version: PROTOCOL_VERSION,
                capabilities: Map::new(),
                client_info,
            },
        )?;
        let result: InitializeResult = self.request("initialize", Some(params)).await?;
        debug!(
            protocol_version = %result.protocol_version,
            session_id = ?self.session_id,
            "MCP session initialized"
        );
        self.protocol_version = Some(result.protocol_version);
        self.notify("notifications/initialized").await
    }

    async fn request<T: DeserializeOwned>(
        &mut self,
        method: &str,
        params: Option<Value>,
    ) -> TransportResult<T> {
        let id = self.next_id;
        self.next_id += 1;

        let body = encode(method, &JsonRpcRequest::new(id, method, params))?;
        trace!(method, id, "sending MCP request");
        let response = self.post(body).await?;
        let event_stream = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("text/event-stream"));

        let response = if event_stream {
            bounded(self.timeout, read_event_stream(response.into_body(), id)).await??
        } else {
            let body = bounded(self.timeout, to_bytes(response.into_body()))
                .await?
                .map_err(|err| {
                    TransportError::http(format!("failed to read response body: {err}"))
                })?;
            decode_json(&body, id)?
        };

        serde_json::from_value(response.into_result()?)
            .map_err(|err| TransportError::protocol(format!("invalid {method} result: {err}")))
    }

    async fn notify(&mut self, method: &str) -> TransportResult<()> {
        let body = encode(method, &JsonRpcNotification::new(method, None))?;
        self.post(body).await.map(drop)
    }

    /// Sends one JSON-RPC message and returns the response with its body
    /// unread. Non-success statuses are read in full and mapped to
    /// [`TransportError::Status`].
    async fn post(&mut self, body: Value) -> TransportResult<Response<Body>> {
        let payload = serde_json::to_vec(&body)
            .map_err(|err| TransportError::protocol(format!("failed to encode request: {err}")))?;

        let mut builder = Request::post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json, text/event-stream");
        for (name, value) in &self.headers {
            builder = builder.header(*name, value.as_str());
        }
        if let Some(session_id) = &self.session_id {
            builder = builder.header(SESSION_ID_HEADER, session_id.as_str());
        }
        if let Some(version) = &self.protocol_version {
            builder = builder.header(PROTOCOL_VERSION_HEADER, version.as_str());
        }
        let request = builder
            .body(Body::from(payload))
            .map_err(|err| TransportError::http(format!("failed to build request: {err}")))?;

        let response = bounded(self.timeout, self.client.request(request))
            .await?
            .map_err(|err| TransportError::http(err.to_string()))?;

        if let Some(session_id) = response
            .headers()
            .get(SESSION_ID_HEADER)
            .and_then(|value| value.to_str().ok())
        {
            self.session_id = Some(session_id.to_owned());
        }

        let status = response.status();
        if !status.is_success() {
            let body = bounded(self.timeout, to_bytes(response.into_body()))
                .await?
                .map_err(|err| {
                    TransportError::http(format!("failed to read response body: {err}"))
                })?;
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl McpSession for HttpSession {
    async fn list_tools(&mut self) -> TransportResult<Vec<McpTool>> {
        let mut tools = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let params = cursor.take().map(|cursor| json!({ "cursor": cursor }));
            let page: ListToolsResult = self.request("tools/list", params).await?;
            tools.extend(page.tools);
            match page.next_cursor {
                Some(next) if !next.is_empty() => cursor = Some(next),
                _ => break,
            }
        }
        Ok(tools)
    }

    async fn call_tool(
        &mut self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> TransportResult<CallToolResult> {
        self.request(
            "tools/call",
            Some(json!({ "name": name, "arguments": arguments })),
        )
        .await
    }

    async fn close(self: Box<Self>) -> TransportResult<()> {
        debug!(session_id = ?self.session_id, "MCP session closed");
        Ok(())
    }
}

fn encode<T: serde::Serialize>(method: &str, value: &T) -> TransportResult<Value> {
    serde_json::to_value(value)
        .map_err(|err| TransportError::protocol(format!("failed to encode {method}: {err}")))
}

async fn bounded<F: Future>(limit: Option<Duration>, future: F) -> TransportResult<F::Output> {
    match limit {
        Some(limit) => timeout(limit, future)
            .await
            .map_err(|_| TransportError::Timeout),
        None => Ok(future.await),
    }
}

/// Reads an event stream until an event answers `id`, then drops the body
/// without waiting for the server to close it.
async fn read_event_stream(mut body: Body, id: u64) -> TransportResult<JsonRpcResponse> {
    let mut decoder = SseDecoder::new();
    while let Some(chunk) = body.data().await {
        let chunk = chunk
            .map_err(|err| TransportError::http(format!("failed to read event stream: {err}")))?;
        if let Some(response) = answer(decoder.push(&chunk), id) {
            trace!(id, "response received on event stream");
            return Ok(response);
        }
    }
    answer(decoder.finish(), id).ok_or_else(|| {
        TransportError::protocol(format!(
            "event stream ended without a response to request {id}"
        ))
    })
}

fn answer(events: impl IntoIterator<Item = SseEvent>, id: u64) -> Option<JsonRpcResponse> {
    events
        .into_iter()
        .filter_map(|event| serde_json::from_str::<JsonRpcResponse>(&event.data).ok())
        .find(|response| response.answers(id))
}

fn decode_json(body: &[u8], id: u64) -> TransportResult<JsonRpcResponse> {
    let response: JsonRpcResponse = serde_json::from_slice(body)
        .map_err(|err| TransportError::protocol(format!("invalid JSON-RPC response: {err}")))?;
    if response.answers(id) {
        Ok(response)
    } else {
        Err(TransportError::protocol(format!(
            "response does not answer request {id}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn decodes_plain_json_response() {
        let body = br#"{"jsonrpc":"2.0","id":2,"result":{"tools":[]}}"#;
        let value = decode_json(body, 2).unwrap().into_result().unwrap();
        assert_eq!(value, json!({"tools": []}));
    }

    #[test]
    fn rejects_mismatched_id() {
        let body = br#"{"jsonrpc":"2.0","id":5,"result":{}}"#;
        assert!(matches!(
            decode_json(body, 2),
            Err(TransportError::Protocol { .. })
        ));
    }

    #[tokio::test]
    async fn picks_matching_event_from_stream() {
        let body = concat!(
            "event: message\n",
            "data: {\"jsonrpc\":\"2.0\",\"method\":\"notifications/progress\",\"params\":{}}\n\n",
            "event: message\n",
            "data: {\"jsonrpc\":\"2.0\",\"id\":3,\"result\":{\"content\":[],\"isError\":false}}\n\n",
        );
        let response = read_event_stream(Body::from(body), 3).await.unwrap();
        let result: CallToolResult =
            serde_json::from_value(response.into_result().unwrap()).unwrap();
        assert!(!result.is_error);
    }

    #[tokio::test]
    async fn stream_without_answer_is_protocol_error() {
        assert!(matches!(
            read_event_stream(Body::from(": ping\n\n"), 1).await,
            Err(TransportError::Protocol { .. })
        ));
    }

    #[tokio::test]
    async fn returns_once_answered_while_stream_stays_open() {
        let (mut sender, body) = Body::channel();
        let server = tokio::spawn(async move {
            for chunk in [
                &b": ping\n\nevent: message\ndata: {\"jsonrpc\":\"2.0\","[..],
                &b"\"id\":1,\"result\":{\"tools\":[]}}\n\n"[..],
            ] {
                sender
                    .send_data(Bytes::from_static(chunk))
                    .await
                    .unwrap();
            }
            // Hold the stream open like a server that never ends it.
            std::future::pending::<()>().await;
            drop(sender);
        });

        let response = tokio::time::timeout(Duration::from_secs(5), read_event_stream(body, 1))
            .await
            .expect("reader should not wait for the stream to close")
            .unwrap();
        assert_eq!(response.into_result().unwrap(), json!({"tools": []}));
        server.abort();
    }

    #[test]
    fn rpc_errors_convert() {
        let body = br#"{"jsonrpc":"2.0","id":1,"error":{"code":-32602,"message":"bad params"}}"#;
        let err: TransportError = decode_json(body, 1)
            .unwrap()
            .into_result()
            .unwrap_err()
            .into();
        assert_eq!(err.to_string(), "server error: bad params (code -32602)");
    }

    #[tokio::test]
    async fn bounded_times_out() {
        let outcome = bounded(Some(Duration::from_millis(5)), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
        })
        .await;
        assert!(matches!(outcome, Err(TransportError::Timeout)));
    }
}
