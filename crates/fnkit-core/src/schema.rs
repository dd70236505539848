//! JSON-Schema data model for function parameters
//!
//! The shapes here are the protocol-facing side of a function: what the model
//! sees in the tool manifest. Only the six JSON-Schema types listed in
//! [`SchemaType`] are ever emitted.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON-Schema `type` keyword values understood by the protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
}

impl SchemaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaType::String => "string",
            SchemaType::Number => "number",
            SchemaType::Integer => "integer",
            SchemaType::Boolean => "boolean",
            SchemaType::Array => "array",
            SchemaType::Object => "object",
        }
    }

    /// Parses a JSON-Schema type keyword. Returns `None` for `null` and
    /// anything outside the protocol's type set.
    pub fn parse(keyword: &str) -> Option<Self> {
        match keyword {
            "string" => Some(SchemaType::String),
            "number" => Some(SchemaType::Number),
            "integer" => Some(SchemaType::Integer),
            "boolean" => Some(SchemaType::Boolean),
            "array" => Some(SchemaType::Array),
            "object" => Some(SchemaType::Object),
            _ => None,
        }
    }
}

impl std::fmt::Display for SchemaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Schema of a single parameter or nested field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySchema {
    #[serde(rename = "type")]
    pub schema_type: SchemaType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Allowed values for string-backed enums
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<PropertySchema>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<IndexMap<String, PropertySchema>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
}

impl PropertySchema {
    pub fn new(schema_type: SchemaType) -> Self {
        Self {
            schema_type,
            description: None,
            enum_values: None,
            items: None,
            properties: None,
            required: None,
        }
    }

    pub fn array(items: PropertySchema) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::new(SchemaType::Array)
        }
    }

    pub fn object(properties: IndexMap<String, PropertySchema>, required: Vec<String>) -> Self {
        Self {
            properties: Some(properties),
            required: Some(required),
            ..Self::new(SchemaType::Object)
        }
    }

    pub fn string_enum<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            enum_values: Some(values.into_iter().map(Into::into).collect()),
            ..Self::new(SchemaType::String)
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Whether `field` is listed as required on this object schema
    pub fn requires(&self, field: &str) -> bool {
        self.required
            .as_ref()
            .is_some_and(|required| required.iter().any(|r| r == field))
    }
}

/// Top-level parameter schema of a function
///
/// Serializes as `{"type": "object", "properties": {...}, "required": [...]}`
/// with properties in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSchema {
    #[serde(rename = "type")]
    schema_type: SchemaType,
    properties: IndexMap<String, PropertySchema>,
    required: Vec<String>,
}

impl ParameterSchema {
    pub fn new() -> Self {
        Self {
            schema_type: SchemaType::Object,
            properties: IndexMap::new(),
            required: Vec::new(),
        }
    }

    /// Adds a scalar property with a description
    pub fn property(
        self,
        name: impl Into<String>,
        schema_type: SchemaType,
        description: impl Into<String>,
    ) -> Self {
        self.schema(
            name,
            PropertySchema::new(schema_type).with_description(description),
        )
    }

    /// Adds a property with a fully built schema
    pub fn schema(mut self, name: impl Into<String>, schema: PropertySchema) -> Self {
        self.properties.insert(name.into(), schema);
        self
    }

    pub fn required(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.required.contains(&name) {
            self.required.push(name);
        }
        self
    }

    pub fn properties(&self) -> &IndexMap<String, PropertySchema> {
        &self.properties
    }

    pub fn get(&self, name: &str) -> Option<&PropertySchema> {
        self.properties.get(name)
    }

    pub fn required_names(&self) -> &[String] {
        &self.required
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|r| r == name)
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl Default for ParameterSchema {
    fn default() -> Self {
        Self::new()
    }
}
