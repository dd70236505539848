//! fnkit: expose host functions to function-calling language models
//!
//! Re-exports the workspace crates under one name:
//! - [`fnkit_core`]: descriptors, schemas, call request/result types, configuration
//! - [`fnkit_function`]: schema generation, extraction, registry, dispatcher
//! - [`fnkit_telemetry`]: logging and tracing setup
//! - [`function_source`]: the attribute macro for candidate sources
//!
//! Code generated by `#[function_source]` refers to `::fnkit_core`, so
//! crates using the macro also depend on `fnkit-core` directly.

pub use fnkit_core;
pub use fnkit_function;
pub use fnkit_macros::function_source;
pub use fnkit_telemetry;

/// Commonly used types
pub mod prelude {
    pub use fnkit_core::{
        Arguments, CallErrorKind, CallRequest, CallResult, CandidateSource, DuplicatePolicy,
        Error, FnkitConfig, FunctionDescriptor, FunctionSpec, InvokeError, Result,
    };
    pub use fnkit_function::{
        Dispatcher, FunctionBuilder, FunctionRegistry, FunctionSet, builtin_functions,
    };
    pub use fnkit_macros::function_source;
    pub use fnkit_telemetry::init_telemetry;
}
