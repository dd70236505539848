use crate::error::{Error, Result};
use crate::schema::{ParameterSchema, PropertySchema, SchemaType};
use crate::traits::FunctionHandler;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{self, Write as _};
use std::sync::Arc;

/// Protocol-facing description of a function: what the model is shown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSpec {
    pub name: String,
    pub description: String,
    pub parameters: ParameterSchema,
}

impl FunctionSpec {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: ParameterSchema,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }

    /// Renders the OpenAI-style tool entry:
    /// `{"type": "function", "function": {name, description, parameters}}`
    pub fn to_tool_json(&self) -> Value {
        serde_json::json!({
            "type": "function",
            "function": self,
        })
    }

    /// Renders a plain-text description, for prompts that list functions
    /// instead of using native tool calling.
    pub fn to_text_plain(&self) -> String {
        let mut text = format!("{}: {}\n", self.name, self.description);
        for (name, property) in self.parameters.properties() {
            let requirement = if self.parameters.is_required(name) {
                "required"
            } else {
                "optional"
            };
            write_property(&mut text, 1, name, property, requirement);
        }
        text
    }
}

fn write_property(
    out: &mut String,
    depth: usize,
    name: &str,
    property: &PropertySchema,
    requirement: &str,
) {
    let indent = "  ".repeat(depth);
    let _ = write!(out, "{indent}- {name} ({}", type_label(property));
    let _ = write!(out, ", {requirement})");
    if let Some(description) = &property.description {
        let _ = write!(out, ": {description}");
    }
    out.push('\n');

    let nested = match property.schema_type {
        SchemaType::Array => property
            .items
            .as_deref()
            .and_then(|items| items.properties.as_ref().map(|p| (p, items))),
        SchemaType::Object => property.properties.as_ref().map(|p| (p, property)),
        _ => None,
    };
    if let Some((fields, owner)) = nested {
        for (field, schema) in fields {
            let requirement = if owner.requires(field) {
                "required"
            } else {
                "optional"
            };
            write_property(out, depth + 1, field, schema, requirement);
        }
    }
}

fn type_label(property: &PropertySchema) -> String {
    match (&property.schema_type, &property.items, &property.enum_values) {
        (SchemaType::Array, Some(items), _) => format!("array of {}", type_label(items)),
        (SchemaType::String, _, Some(values)) => format!("one of {}", values.join("|")),
        (schema_type, _, _) => schema_type.to_string(),
    }
}

/// Immutable bundle of a function's protocol schema and its implementation
#[derive(Clone)]
pub struct FunctionDescriptor {
    spec: FunctionSpec,
    handler: Arc<dyn FunctionHandler>,
}

impl FunctionDescriptor {
    pub fn new(spec: FunctionSpec, handler: Arc<dyn FunctionHandler>) -> Result<Self> {
        if spec.name.trim().is_empty() {
            return Err(Error::InvalidDeclaration(
                "function name must not be empty".to_string(),
            ));
        }
        Ok(Self { spec, handler })
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn description(&self) -> &str {
        &self.spec.description
    }

    pub fn spec(&self) -> &FunctionSpec {
        &self.spec
    }

    pub fn parameters(&self) -> &ParameterSchema {
        &self.spec.parameters
    }

    pub fn handler(&self) -> Arc<dyn FunctionHandler> {
        Arc::clone(&self.handler)
    }

    /// Same implementation published under another name
    pub fn renamed(&self, name: impl Into<String>) -> Result<Self> {
        let mut spec = self.spec.clone();
        spec.name = name.into();
        Self::new(spec, Arc::clone(&self.handler))
    }
}

impl fmt::Debug for FunctionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionDescriptor")
            .field("spec", &self.spec)
            .finish_non_exhaustive()
    }
}
