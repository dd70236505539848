//! Invocation dispatcher
//!
//! Executes one model-issued call request against the registry:
//! lookup, argument decoding, invocation and result serialization. Every
//! failure along the way becomes a [`CallResult::Failed`]; nothing is
//! propagated or panics past [`Dispatcher::dispatch`].

use crate::decode::decode_arguments;
use crate::registry::FunctionRegistry;
use fnkit_core::{
    CallErrorKind, CallRequest, CallResult, DispatchConfig, FnkitConfig, FunctionDescriptor,
    InvokeError,
};
use fnkit_telemetry::{function_call_span, record_outcome, safe_serialize};
use futures::FutureExt;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::Instrument;

const REDACTED: &str = "<redacted>";

/// Dispatches call requests to registered functions
///
/// Runs each call on the caller's task; nothing is spawned and no timeout is
/// applied. Dropping the future returned by [`dispatch`](Self::dispatch)
/// cancels the call at the implementation's next await point.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<FunctionRegistry>,
    config: DispatchConfig,
}

impl Dispatcher {
    pub fn new(registry: Arc<FunctionRegistry>) -> Self {
        Self::with_config(registry, DispatchConfig::default())
    }

    pub fn with_config(registry: Arc<FunctionRegistry>, config: DispatchConfig) -> Self {
        Self { registry, config }
    }

    pub fn from_config(registry: Arc<FunctionRegistry>, config: &FnkitConfig) -> Self {
        Self::with_config(registry, config.dispatch.clone())
    }

    pub fn registry(&self) -> &Arc<FunctionRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Executes `request` and reports how it ended
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// # async fn run(dispatcher: fnkit_function::Dispatcher) {
    /// use fnkit_core::CallRequest;
    ///
    /// let result = dispatcher
    ///     .dispatch(&CallRequest::new("echo", r#"{"message": "hi"}"#))
    ///     .await;
    /// println!("{}", result.to_message_content());
    /// # }
    /// ```
    pub async fn dispatch(&self, request: &CallRequest) -> CallResult {
        let name = request.function_name.as_str();
        let descriptor = self.registry.lookup(name);

        let arguments = if self.config.log_arguments {
            request.arguments_json.as_str()
        } else {
            REDACTED
        };
        let description = descriptor
            .as_ref()
            .map(|descriptor| descriptor.description())
            .unwrap_or_default();
        let span = function_call_span(name, description, arguments);

        let result = match descriptor {
            Some(descriptor) => {
                self.execute(&descriptor, &request.arguments_json)
                    .instrument(span.clone())
                    .await
            }
            None => {
                span.in_scope(|| tracing::warn!(function = %name, "Call to unknown function"));
                CallResult::failed(
                    CallErrorKind::UnknownFunction,
                    format!("unknown function '{}'", name),
                )
            }
        };

        record_outcome(&span, &result);
        result
    }

    async fn execute(&self, descriptor: &FunctionDescriptor, arguments_json: &str) -> CallResult {
        let args = match decode_arguments(
            descriptor.parameters(),
            arguments_json,
            self.config.lenient_scalars,
        ) {
            Ok(args) => args,
            Err(e) => return self.failure(e),
        };

        let handler = descriptor.handler();
        let outcome = match panic::catch_unwind(AssertUnwindSafe(move || handler.invoke(args))) {
            Ok(future) => AssertUnwindSafe(future).catch_unwind().await,
            Err(payload) => Err(payload),
        };

        match outcome {
            Ok(Ok(value)) => {
                if self.config.log_arguments {
                    tracing::debug!(result = %safe_serialize(&value), "Function completed");
                } else {
                    tracing::debug!("Function completed");
                }
                CallResult::success(value)
            }
            Ok(Err(e)) => self.failure(e),
            Err(payload) => self.failure(InvokeError::execution(format!(
                "function panicked: {}",
                panic_message(payload.as_ref())
            ))),
        }
    }

    fn failure(&self, error: InvokeError) -> CallResult {
        let kind = error.kind();
        let message = sanitize_message(&error.to_string(), self.config.max_error_message_len);
        tracing::warn!(error_kind = %kind, error = %message, "Function call failed");
        CallResult::failed(kind, message)
    }
}

/// First non-blank line only, at most `max_len` characters (0 means unbounded)
fn sanitize_message(message: &str, max_len: usize) -> String {
    let first_line = message
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or_default();
    if max_len == 0 || first_line.chars().count() <= max_len {
        return first_line.to_string();
    }

    let mut truncated: String = first_line.chars().take(max_len).collect();
    truncated.push_str("...");
    truncated
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
