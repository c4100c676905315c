//! Remote tool descriptors as advertised by `tools/list`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// JSON-Schema-like description of a tool's arguments.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InputSchema {
    #[serde(rename = "type", default = "default_schema_type")]
    schema_type: String,
    #[serde(default)]
    properties: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    required: Vec<String>,
    /// Keywords we do not interpret (`additionalProperties`, `$schema`, ...).
    #[serde(flatten)]
    extra: Map<String, Value>,
}

fn default_schema_type() -> String {
    "object".to_owned()
}

impl InputSchema {
    /// Creates an object schema with no properties.
    #[must_use]
    pub fn empty_object() -> Self {
        Self {
            schema_type: default_schema_type(),
            ..Self::default()
        }
    }

    /// Adds a property definition.
    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, schema: Value) -> Self {
        self.properties.insert(name.into(), schema);
        self
    }

    /// Marks a property as required.
    #[must_use]
    pub fn with_required(mut self, name: impl Into<String>) -> Self {
        self.required.push(name.into());
        self
    }

    /// Returns the schema type tag (normally `"object"`).
    #[must_use]
    pub fn schema_type(&self) -> &str {
        &self.schema_type
    }

    /// Returns the named property schemas.
    #[must_use]
    pub fn properties(&self) -> &Map<String, Value> {
        &self.properties
    }

    /// Returns the names of required properties.
    #[must_use]
    pub fn required(&self) -> &[String] {
        &self.required
    }

    /// Returns `true` when `name` is listed as required.
    #[must_use]
    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|r| r == name)
    }

    /// Serializes the schema back into a JSON value, preserving unknown keywords.
    #[must_use]
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| Value::Object(Map::new()))
    }
}

/// A single remote operation discovered from the MCP server.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct McpTool {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(
        rename = "inputSchema",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    input_schema: Option<InputSchema>,
}

impl McpTool {
    /// Creates a descriptor with the supplied name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            input_schema: None,
        }
    }

    /// Sets the human-readable description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the input schema.
    #[must_use]
    pub fn with_input_schema(mut self, schema: InputSchema) -> Self {
        self.input_schema = Some(schema);
        self
    }

    /// Returns the unique tool name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the description, falling back to the tool name when the
    /// server omitted one.
    #[must_use]
    pub fn description(&self) -> &str {
        match self.description.as_deref() {
            Some(text) if !text.is_empty() => text,
            _ => &self.name,
        }
    }

    /// Returns the advertised input schema, if any.
    #[must_use]
    pub fn input_schema(&self) -> Option<&InputSchema> {
        self.input_schema.as_ref()
    }

    /// Returns the input schema as JSON, defaulting to an empty object schema.
    #[must_use]
    pub fn parameters(&self) -> Value {
        self.input_schema
            .as_ref()
            .map_or_else(|| InputSchema::empty_object().to_value(), InputSchema::to_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_wire_descriptor() {
        let tool: McpTool = serde_json::from_value(json!({
            "name": "create_customer",
            "description": "Create a new customer",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "email": { "type": "string", "description": "Customer email" }
                },
                "required": ["email"],
                "additionalProperties": false
            }
        }))
        .unwrap();

        assert_eq!(tool.name(), "create_customer");
        assert_eq!(tool.description(), "Create a new customer");
        let schema = tool.input_schema().unwrap();
        assert!(schema.is_required("email"));
        assert_eq!(schema.properties().len(), 1);
        assert_eq!(tool.parameters()["additionalProperties"], json!(false));
    }

    #[test]
    fn description_falls_back_to_name() {
        let tool: McpTool = serde_json::from_value(json!({ "name": "list_customers" })).unwrap();
        assert_eq!(tool.description(), "list_customers");
        assert_eq!(
            tool.parameters(),
            json!({ "type": "object", "properties": {} })
        );
    }
}
