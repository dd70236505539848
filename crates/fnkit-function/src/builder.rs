use fnkit_core::{
    Arguments, Error, FunctionHandler, InvokeError, MemberSignature, ParamSignature, Result,
    to_json_value,
};
use schemars::JsonSchema;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;

/// Declares a single function by hand
///
/// Parameters are declared in call order; the handler reads them back
/// positionally through [`Arguments::next`].
///
/// # Example
///
/// ```rust
/// use fnkit_core::InvokeError;
/// use fnkit_function::FunctionBuilder;
///
/// let member = FunctionBuilder::new()
///     .name("add")
///     .description("Adds two numbers")
///     .param::<f64>("x", "First number")
///     .param::<f64>("y", "Second number")
///     .handler(|mut args| async move {
///         let x: f64 = args.next()?;
///         let y: f64 = args.next()?;
///         Ok::<_, InvokeError>(x + y)
///     })
///     .build()
///     .unwrap();
///
/// assert_eq!(member.function_name(), "add");
/// ```
pub struct FunctionBuilder {
    name: Option<String>,
    description: Option<String>,
    params: Vec<ParamSignature>,
    handler: Option<Arc<dyn FunctionHandler>>,
}

impl FunctionBuilder {
    pub fn new() -> Self {
        Self {
            name: None,
            description: None,
            params: Vec::new(),
            handler: None,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Declares the next parameter; `Option<T>` makes it optional
    pub fn param<T: JsonSchema>(
        mut self,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        self.params
            .push(ParamSignature::of::<T>(name).with_description(description));
        self
    }

    /// Sets the implementation. Its return value is serialized to JSON.
    pub fn handler<F, Fut, R>(mut self, f: F) -> Self
    where
        F: Fn(Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<R, InvokeError>> + Send + 'static,
        R: Serialize + Send + 'static,
    {
        self.handler = Some(fnkit_core::handler_fn(move |args| {
            let fut = f(args);
            async move {
                let value = fut.await?;
                to_json_value(&value)
            }
        }));
        self
    }

    /// Sets an already type-erased implementation
    pub fn raw_handler(mut self, handler: Arc<dyn FunctionHandler>) -> Self {
        self.handler = Some(handler);
        self
    }

    pub fn build(self) -> Result<MemberSignature> {
        let name = self
            .name
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| Error::InvalidDeclaration("function name is required".into()))?;
        let description = self.description.ok_or_else(|| {
            Error::InvalidDeclaration(format!("function '{}' needs a description", name))
        })?;
        let handler = self.handler.ok_or_else(|| {
            Error::InvalidDeclaration(format!("function '{}' needs a handler", name))
        })?;

        Ok(MemberSignature::new(name, description, self.params, handler))
    }
}

impl Default for FunctionBuilder {
    fn default() -> Self {
        Self::new()
    }
}
