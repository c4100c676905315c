//! Native view of a tool's JSON input schema.
//!
//! [`ObjectShape::from_schema`] maps the schema into [`FieldKind`]s once so
//! converted tools can check arguments locally before a round trip. Unknown
//! schema constructs map to [`FieldKind::Any`], and arguments not named by the
//! schema pass through untouched.

use serde_json::{Map, Value};
use thiserror::Error;
use toolkit_primitives::InputSchema;

/// Type of a single field.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldKind {
    /// JSON string, optionally restricted to an enumeration.
    String {
        /// Allowed values, when the schema declares `enum`.
        variants: Option<Vec<String>>,
    },
    /// Any JSON number.
    Number,
    /// Integral JSON number.
    Integer,
    /// JSON boolean.
    Boolean,
    /// Homogeneous array.
    Array(Box<FieldKind>),
    /// Nested object, with its shape when the schema declares properties.
    Object(Option<ObjectShape>),
    /// `null` or the wrapped kind.
    Nullable(Box<FieldKind>),
    /// Anything.
    Any,
}

/// A named property of an [`ObjectShape`].
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    /// Property name.
    pub name: String,
    /// Property type.
    pub kind: FieldKind,
    /// Whether the property must be present.
    pub required: bool,
    /// Description carried over from the schema.
    pub description: Option<String>,
}

/// Ordered set of fields describing an object.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObjectShape {
    fields: Vec<Field>,
}

/// Why arguments did not match a shape.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SchemaViolation {
    /// A required field is absent.
    #[error("missing required field '{path}'")]
    Missing {
        /// Dotted path of the field.
        path: String,
    },
    /// A field has the wrong JSON type.
    #[error("field '{path}' must be {expected}")]
    Type {
        /// Dotted path of the field.
        path: String,
        /// Expected JSON type.
        expected: &'static str,
    },
    /// A string field is outside its enumeration.
    #[error("field '{path}' must be one of: {allowed}")]
    Variant {
        /// Dotted path of the field.
        path: String,
        /// Comma-separated allowed values.
        allowed: String,
    },
}

impl ObjectShape {
    /// Maps a tool's input schema.
    #[must_use]
    pub fn from_schema(schema: &InputSchema) -> Self {
        Self::from_parts(schema.properties(), schema.required())
    }

    fn from_parts(properties: &Map<String, Value>, required: &[String]) -> Self {
        let fields = properties
            .iter()
            .map(|(name, schema)| Field {
                name: name.clone(),
                kind: FieldKind::from_schema(schema),
                required: required.iter().any(|r| r == name),
                description: schema
                    .get("description")
                    .and_then(Value::as_str)
                    .map(str::to_owned),
            })
            .collect();
        Self { fields }
    }

    /// Fields of the object.
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Looks up a field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Checks `args` against the shape.
    ///
    /// # Errors
    ///
    /// Returns the first [`SchemaViolation`] found.
    pub fn validate(&self, args: &Map<String, Value>) -> Result<(), SchemaViolation> {
        self.validate_at(args, "")
    }

    fn validate_at(&self, args: &Map<String, Value>, prefix: &str) -> Result<(), SchemaViolation> {
        for field in &self.fields {
            let path = join(prefix, &field.name);
            match args.get(&field.name) {
                Some(value) if !value.is_null() || field.kind.is_nullable() => {
                    field.kind.check(value, &path)?;
                }
                _ if field.required => return Err(SchemaViolation::Missing { path }),
                _ => {}
            }
        }
        Ok(())
    }
}

impl FieldKind {
    /// Maps one property schema.
    ///
    /// A `type` list naming more than one non-null type maps to
    /// [`FieldKind::Any`]. A `"null"` entry, or OpenAPI's `nullable: true`,
    /// wraps the kind in [`FieldKind::Nullable`].
    #[must_use]
    pub fn from_schema(schema: &Value) -> Self {
        let (declared, null_listed) = match schema.get("type") {
            Some(Value::String(kind)) => (vec![kind.as_str()], kind == "null"),
            Some(Value::Array(kinds)) => {
                let names: Vec<&str> = kinds.iter().filter_map(Value::as_str).collect();
                let null_listed = names.contains(&"null");
                (
                    names.into_iter().filter(|kind| *kind != "null").collect(),
                    null_listed,
                )
            }
            _ => (Vec::new(), false),
        };
        let nullable = null_listed
            || schema
                .get("nullable")
                .and_then(Value::as_bool)
                .unwrap_or(false);

        let kind = match declared.as_slice() {
            [] if null_listed => Self::Any,
            [] => match string_variants(schema) {
                Some(variants) => Self::String {
                    variants: Some(variants),
                },
                None => Self::Any,
            },
            [single] => Self::from_declared(single, schema),
            _ => Self::Any,
        };

        match kind {
            Self::Any => Self::Any,
            kind if nullable => Self::Nullable(Box::new(kind)),
            kind => kind,
        }
    }

    fn from_declared(declared: &str, schema: &Value) -> Self {
        match declared {
            "string" => Self::String {
                variants: string_variants(schema),
            },
            "number" => Self::Number,
            "integer" => Self::Integer,
            "boolean" => Self::Boolean,
            "array" => Self::Array(Box::new(
                schema.get("items").map_or(Self::Any, Self::from_schema),
            )),
            "object" => Self::Object(schema.get("properties").and_then(Value::as_object).map(
                |properties| {
                    let required: Vec<String> = schema
                        .get("required")
                        .and_then(Value::as_array)
                        .map(|names| {
                            names
                                .iter()
                                .filter_map(Value::as_str)
                                .map(str::to_owned)
                                .collect()
                        })
                        .unwrap_or_default();
                    ObjectShape::from_parts(properties, &required)
                },
            )),
            _ => Self::Any,
        }
    }

    /// Whether `null` satisfies this kind.
    #[must_use]
    pub fn is_nullable(&self) -> bool {
        matches!(self, Self::Nullable(_) | Self::Any)
    }

    fn check(&self, value: &Value, path: &str) -> Result<(), SchemaViolation> {
        let mismatch = |expected| SchemaViolation::Type {
            path: path.to_owned(),
            expected,
        };
        match self {
            Self::Any => Ok(()),
            Self::Nullable(_) if value.is_null() => Ok(()),
            Self::Nullable(inner) => inner.check(value, path),
            Self::String { variants } => {
                let text = value.as_str().ok_or_else(|| mismatch("a string"))?;
                match variants {
                    Some(allowed) if !allowed.iter().any(|v| v == text) => {
                        Err(SchemaViolation::Variant {
                            path: path.to_owned(),
                            allowed: allowed.join(", "),
                        })
                    }
                    _ => Ok(()),
                }
            }
            Self::Number if value.is_number() => Ok(()),
            Self::Number => Err(mismatch("a number")),
            Self::Integer if is_integral(value) => Ok(()),
            Self::Integer => Err(mismatch("an integer")),
            Self::Boolean if value.is_boolean() => Ok(()),
            Self::Boolean => Err(mismatch("a boolean")),
            Self::Array(item) => {
                let items = value.as_array().ok_or_else(|| mismatch("an array"))?;
                items
                    .iter()
                    .enumerate()
                    .try_for_each(|(index, element)| item.check(element, &format!("{path}[{index}]")))
            }
            Self::Object(shape) => {
                let object = value.as_object().ok_or_else(|| mismatch("an object"))?;
                match shape {
                    Some(shape) => shape.validate_at(object, path),
                    None => Ok(()),
                }
            }
        }
    }
}

#[allow(clippy::float_cmp)]
fn is_integral(value: &Value) -> bool {
    value.is_i64()
        || value.is_u64()
        || value
            .as_f64()
            .is_some_and(|number| number.is_finite() && number.fract() == 0.0)
}

fn string_variants(schema: &Value) -> Option<Vec<String>> {
    let variants = schema.get("enum")?.as_array()?;
    variants
        .iter()
        .map(|v| v.as_str().map(str::to_owned))
        .collect()
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_owned()
    } else {
        format!("{prefix}.{name}")
    }
}
