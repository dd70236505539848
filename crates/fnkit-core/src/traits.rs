use crate::args::Arguments;
use crate::call::InvokeError;
use crate::signature::MemberSignature;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Future returned by a function handler
pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<Value, InvokeError>> + Send>>;

/// Invokable implementation of an exposed function
///
/// Receives the decoded positional arguments and yields the JSON form of the
/// return value. Implementations own their internal synchronization; the
/// registry and dispatcher hold no lock while a handler runs.
pub trait FunctionHandler: Send + Sync {
    fn invoke(&self, args: Arguments) -> HandlerFuture;
}

impl<F, Fut> FunctionHandler for F
where
    F: Fn(Arguments) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, InvokeError>> + Send + 'static,
{
    fn invoke(&self, args: Arguments) -> HandlerFuture {
        Box::pin(self(args))
    }
}

/// Wraps a closure as a shared handler
pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn FunctionHandler>
where
    F: Fn(Arguments) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, InvokeError>> + Send + 'static,
{
    Arc::new(f)
}

/// Anything that may declare host-exposable functions
///
/// Implemented by `#[function_source]` impl blocks, by `FunctionSet`, or by
/// hand. Each returned member's handler must invoke the member against this
/// particular instance, which is why the receiver is an `Arc`.
pub trait CandidateSource: Send + Sync + 'static {
    /// Name used in logs when this source is scanned
    fn source_name(&self) -> String {
        std::any::type_name::<Self>().to_string()
    }

    fn exposed_members(self: Arc<Self>) -> Vec<MemberSignature>;
}
