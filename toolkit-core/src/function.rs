//! Function-calling tools in the shape chat-completion APIs expect.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use toolkit_primitives::{McpTool, ToolkitError, ToolkitResult};

use crate::bridge::block_on;
use crate::converter::{ToolConverter, ToolRunner};
use crate::schema::ObjectShape;
use crate::toolkit::ToolkitCore;

/// Name, description, and parameter schema of a function tool.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    /// Tool name.
    pub name: String,
    /// Description shown to the model.
    pub description: String,
    /// JSON schema of the arguments object.
    pub parameters: Value,
}

/// A remote tool exposed as a callable function.
#[derive(Clone)]
pub struct FunctionTool {
    definition: FunctionDefinition,
    shape: ObjectShape,
    runner: ToolRunner,
}

impl fmt::Debug for FunctionTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionTool")
            .field("definition", &self.definition)
            .finish_non_exhaustive()
    }
}

impl FunctionTool {
    fn new(tool: &McpTool, runner: ToolRunner) -> Self {
        let shape = tool
            .input_schema()
            .map(ObjectShape::from_schema)
            .unwrap_or_default();
        Self {
            definition: FunctionDefinition {
                name: tool.name().to_owned(),
                description: tool.description().to_owned(),
                parameters: function_parameters(tool),
            },
            shape,
            runner,
        }
    }

    /// Tool name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.definition.name
    }

    /// Description shown to the model.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.definition.description
    }

    /// Parameter schema.
    #[must_use]
    pub fn parameters(&self) -> &Value {
        &self.definition.parameters
    }

    /// Name, description, and parameters.
    #[must_use]
    pub fn definition(&self) -> &FunctionDefinition {
        &self.definition
    }

    /// Native view of the parameter schema.
    #[must_use]
    pub fn shape(&self) -> &ObjectShape {
        &self.shape
    }

    /// `{"type": "function", "function": {...}}` for a chat-completion request.
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({ "type": "function", "function": self.definition })
    }

    /// Invokes the tool with model-produced JSON arguments.
    ///
    /// An empty string is treated as `{}`.
    ///
    /// # Errors
    ///
    /// Returns [`ToolkitError::ToolExecution`] when the arguments are not a
    /// JSON object or violate the schema, and propagates call failures.
    pub async fn call(&self, arguments: &str) -> ToolkitResult<String> {
        let args = self.parse_arguments(arguments)?;
        self.runner.run(self.name(), args, None).await
    }

    /// Blocking variant of [`call`](Self::call) for synchronous frameworks.
    ///
    /// # Errors
    ///
    /// Same as [`call`](Self::call), plus [`ToolkitError::ToolExecution`] if
    /// no runtime can be started.
    pub fn call_blocking(&self, arguments: &str) -> ToolkitResult<String> {
        block_on(self.call(arguments)).map_err(|err| {
            ToolkitError::tool_execution(self.name(), format!("failed to start runtime: {err}"))
        })?
    }

    fn parse_arguments(&self, arguments: &str) -> ToolkitResult<Map<String, Value>> {
        let arguments = arguments.trim();
        if arguments.is_empty() {
            return Ok(Map::new());
        }

        let args = match serde_json::from_str::<Value>(arguments) {
            Ok(Value::Object(args)) => args,
            Ok(_) => {
                return Err(ToolkitError::tool_execution(
                    self.name(),
                    "arguments must be a JSON object",
                ));
            }
            Err(err) => {
                return Err(ToolkitError::tool_execution(
                    self.name(),
                    format!("invalid arguments JSON: {err}"),
                ));
            }
        };

        self.shape
            .validate(&args)
            .map_err(|violation| ToolkitError::tool_execution(self.name(), violation.to_string()))?;
        Ok(args)
    }
}

/// Parameter schema cleaned for function calling: always an object, closed
/// to extra properties, without titles or defaults.
fn function_parameters(tool: &McpTool) -> Value {
    let mut parameters = match tool.parameters() {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    parameters.insert("type".to_owned(), Value::from("object"));
    parameters.insert("additionalProperties".to_owned(), Value::Bool(false));
    parameters.remove("title");
    parameters.remove("description");

    if let Some(Value::Object(properties)) = parameters.get_mut("properties") {
        for property in properties.values_mut() {
            if let Value::Object(property) = property {
                property.remove("title");
                property.remove("default");
            }
        }
    }
    Value::Object(parameters)
}

/// Converts descriptors into [`FunctionTool`]s.
#[derive(Clone, Copy, Debug, Default)]
pub struct FunctionToolConverter;

impl ToolConverter for FunctionToolConverter {
    type Tools = Vec<FunctionTool>;

    fn empty(&self) -> Self::Tools {
        Vec::new()
    }

    fn convert(&self, tools: &[McpTool], runner: &ToolRunner) -> Self::Tools {
        tools
            .iter()
            .map(|tool| FunctionTool::new(tool, runner.clone()))
            .collect()
    }
}

/// A tool call emitted by a model.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Call id echoed back in the [`ToolMessage`].
    pub id: String,
    /// Call type, `function` in practice.
    #[serde(rename = "type", default = "function_kind")]
    pub kind: String,
    /// Target and arguments.
    pub function: ToolCallFunction,
}

/// Function part of a [`ToolCall`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallFunction {
    /// Tool name.
    pub name: String,
    /// JSON-encoded arguments.
    #[serde(default)]
    pub arguments: String,
}

fn function_kind() -> String {
    "function".to_owned()
}

/// Message carrying a tool's result back to the model.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolMessage {
    /// Always `tool`.
    pub role: String,
    /// Id of the call this answers.
    pub tool_call_id: String,
    /// Tool output.
    pub content: String,
}

impl ToolkitCore<FunctionToolConverter> {
    /// Executes a model's tool call and wraps the result for the conversation.
    ///
    /// # Errors
    ///
    /// Returns [`ToolkitError::NotInitialized`] before initialization and
    /// [`ToolkitError::ToolExecution`] for tools outside the exposed set or
    /// failed calls.
    pub async fn handle_tool_call(&self, call: &ToolCall) -> ToolkitResult<ToolMessage> {
        let tools = self.get_tools()?;
        let tool = tools
            .iter()
            .find(|tool| tool.name() == call.function.name)
            .ok_or_else(|| {
                ToolkitError::tool_execution(
                    call.function.name.as_str(),
                    "tool is not available in this toolkit",
                )
            })?;

        let content = tool.call(&call.function.arguments).await?;
        Ok(ToolMessage {
            role: "tool".to_owned(),
            tool_call_id: call.id.clone(),
            content,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use toolkit_config::{Actions, Configuration, Permission};
    use toolkit_primitives::InputSchema;

    use crate::testing::FakeServer;

    fn customer_tool() -> McpTool {
        let schema: InputSchema = serde_json::from_value(json!({
            "type": "object",
            "title": "CreateCustomer",
            "properties": {
                "name": {"type": "string", "title": "Name", "default": ""},
                "email": {"type": "string"}
            },
            "required": ["name"]
        }))
        .unwrap();
        McpTool::new("create_customer")
            .with_description("Create a customer")
            .with_input_schema(schema)
    }

    async fn toolkit(server: &Arc<FakeServer>) -> ToolkitCore<FunctionToolConverter> {
        let configuration = Configuration::new().with_actions(
            Actions::new()
                .grant("customers", Permission::Create, true)
                .grant("invoices", Permission::Read, false),
        );
        let toolkit = ToolkitCore::with_transport(
            "rk_test_123",
            configuration,
            FunctionToolConverter,
            server.transport(),
        )
        .unwrap();
        toolkit.initialize().await.unwrap();
        toolkit
    }

    fn call(id: &str, name: &str, arguments: &str) -> ToolCall {
        ToolCall {
            id: id.to_owned(),
            kind: function_kind(),
            function: ToolCallFunction {
                name: name.to_owned(),
                arguments: arguments.to_owned(),
            },
        }
    }

    #[tokio::test]
    async fn converts_to_function_schema() {
        let server = FakeServer::with_descriptors(vec![customer_tool(), McpTool::new("list_invoices")]);
        let toolkit = toolkit(&server).await;
        let tools = toolkit.get_tools().unwrap();

        assert_eq!(tools.len(), 1);
        assert_eq!(
            tools[0].to_json(),
            json!({
                "type": "function",
                "function": {
                    "name": "create_customer",
                    "description": "Create a customer",
                    "parameters": {
                        "type": "object",
                        "additionalProperties": false,
                        "properties": {
                            "name": {"type": "string"},
                            "email": {"type": "string"}
                        },
                        "required": ["name"]
                    }
                }
            })
        );
    }

    #[tokio::test]
    async fn description_and_parameters_fall_back() {
        let server = FakeServer::with_tools(&["brand_new_tool"]);
        let toolkit = toolkit(&server).await;
        let tools = toolkit.get_tools().unwrap();

        assert_eq!(tools[0].description(), "brand_new_tool");
        assert_eq!(
            tools[0].parameters(),
            &json!({"type": "object", "properties": {}, "additionalProperties": false})
        );
    }

    #[tokio::test]
    async fn call_validates_then_invokes() {
        let server = FakeServer::with_descriptors(vec![customer_tool()]);
        let toolkit = toolkit(&server).await;
        let tools = toolkit.get_tools().unwrap();

        let out = tools[0].call(r#"{"name": "Jenny"}"#).await.unwrap();
        assert_eq!(out, "ok:create_customer");
        assert_eq!(server.last_call().1, json!({"name": "Jenny"}));

        let err = tools[0].call(r#"{"email": "j@example.com"}"#).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed to execute tool 'create_customer': missing required field 'name'"
        );
        assert!(tools[0].call("[1]").await.is_err());
        assert!(tools[0].call("{oops").await.is_err());
    }

    #[tokio::test]
    async fn handle_tool_call_wraps_result() {
        let server = FakeServer::with_descriptors(vec![customer_tool()]);
        let toolkit = toolkit(&server).await;

        let message = toolkit
            .handle_tool_call(&call("call_1", "create_customer", r#"{"name": "Jenny"}"#))
            .await
            .unwrap();
        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            json!({"role": "tool", "tool_call_id": "call_1", "content": "ok:create_customer"})
        );
    }

    #[tokio::test]
    async fn handle_tool_call_rejects_hidden_tools() {
        let server = FakeServer::with_descriptors(vec![customer_tool(), McpTool::new("list_invoices")]);
        let toolkit = toolkit(&server).await;

        let err = toolkit
            .handle_tool_call(&call("call_2", "list_invoices", "{}"))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolkitError::ToolExecution { .. }));
        assert!(server.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn closed_toolkit_rejects_stale_tools() {
        let server = FakeServer::with_descriptors(vec![customer_tool()]);
        let toolkit = toolkit(&server).await;
        let tools = toolkit.get_tools().unwrap();
        toolkit.close();

        assert_eq!(
            tools[0].call(r#"{"name": "Jenny"}"#).await.unwrap_err(),
            ToolkitError::NotInitialized
        );
        assert_eq!(
            toolkit
                .handle_tool_call(&call("call_3", "create_customer", "{}"))
                .await
                .unwrap_err(),
            ToolkitError::NotInitialized
        );
    }

    #[test]
    fn tool_call_deserializes_wire_shape() {
        let parsed: ToolCall = serde_json::from_value(json!({
            "id": "call_9",
            "type": "function",
            "function": {"name": "retrieve_balance", "arguments": "{}"}
        }))
        .unwrap();
        assert_eq!(parsed, call("call_9", "retrieve_balance", "{}"));
    }

    #[test]
    fn call_blocking_works_from_sync_code() {
        let server = FakeServer::with_descriptors(vec![customer_tool()]);
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let toolkit = runtime.block_on(toolkit(&server));
        let tools = toolkit.get_tools().unwrap();

        let out = tools[0].call_blocking(r#"{"name": "Jenny"}"#).unwrap();
        assert_eq!(out, "ok:create_customer");
    }
}
