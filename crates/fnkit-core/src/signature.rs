//! Member signatures produced by candidate sources
//!
//! A signature carries everything the schema generator needs (parameter
//! names, native types, descriptions) plus the handler bound to the source
//! instance. Schemas are not derived here: a parameter only records how to
//! ask `schemars` for its type, so a bad type fails at extraction time rather
//! than when the source is declared.

use crate::traits::FunctionHandler;
use schemars::JsonSchema;
use schemars::r#gen::SchemaGenerator;
use schemars::schema::Schema;
use std::fmt;
use std::sync::Arc;

/// Produces the `schemars` schema of a parameter's native type
pub type SchemaFn = fn(&mut SchemaGenerator) -> Schema;

fn subschema_of<T: JsonSchema>(generator: &mut SchemaGenerator) -> Schema {
    generator.subschema_for::<T>()
}

/// One declared parameter of an exposed member
#[derive(Clone)]
pub struct ParamSignature {
    pub name: String,
    pub description: Option<String>,
    /// Rust type name, used in error reports
    pub type_name: &'static str,
    pub schema_fn: SchemaFn,
}

impl ParamSignature {
    /// Declares a parameter of native type `T`
    ///
    /// `Option<T>` marks the parameter as optional.
    pub fn of<T: JsonSchema>(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            type_name: std::any::type_name::<T>(),
            schema_fn: subschema_of::<T>,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        let description = description.into();
        self.description = (!description.is_empty()).then_some(description);
        self
    }
}

impl fmt::Debug for ParamSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParamSignature")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("type_name", &self.type_name)
            .finish()
    }
}

/// A host-exposable member as declared by its candidate source
#[derive(Clone)]
pub struct MemberSignature {
    /// The member's own identifier
    pub ident: String,
    /// Explicit protocol name, if the declaration provided one
    pub name: Option<String>,
    pub description: String,
    pub params: Vec<ParamSignature>,
    pub handler: Arc<dyn FunctionHandler>,
}

impl MemberSignature {
    pub fn new(
        ident: impl Into<String>,
        description: impl Into<String>,
        params: Vec<ParamSignature>,
        handler: Arc<dyn FunctionHandler>,
    ) -> Self {
        Self {
            ident: ident.into(),
            name: None,
            description: description.into(),
            params,
            handler,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Protocol name: explicit metadata first, then the member identifier
    pub fn function_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.ident)
    }
}

impl fmt::Debug for MemberSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberSignature")
            .field("ident", &self.ident)
            .field("name", &self.name)
            .field("description", &self.description)
            .field("params", &self.params)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call::InvokeError;
    use crate::traits::handler_fn;
    use serde_json::Value;

    fn noop() -> Arc<dyn FunctionHandler> {
        handler_fn(|_args| async { Ok::<Value, InvokeError>(Value::Null) })
    }

    #[test]
    fn test_function_name_fallback() {
        let member = MemberSignature::new("get_weather", "Weather lookup", vec![], noop());
        assert_eq!(member.function_name(), "get_weather");

        let named = member.clone().with_name("weather");
        assert_eq!(named.function_name(), "weather");

        let blank = member.with_name("");
        assert_eq!(blank.function_name(), "get_weather");
    }

    #[test]
    fn test_param_signature() {
        let param = ParamSignature::of::<Option<u32>>("days").with_description("Forecast days");
        assert_eq!(param.name, "days");
        assert_eq!(param.description.as_deref(), Some("Forecast days"));
        assert!(param.type_name.contains("Option"));

        let blank = ParamSignature::of::<String>("city").with_description("");
        assert!(blank.description.is_none());
    }
}
