//! Core traits and types for fnkit
//!
//! This crate provides the foundational abstractions for exposing host
//! functions to a function-calling language model: parameter schemas,
//! function descriptors, candidate sources, and the call request/result
//! types exchanged with the orchestration layer.

pub mod args;
pub mod call;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod schema;
pub mod signature;
pub mod traits;

// Re-exports
pub use args::Arguments;
pub use call::{CallErrorKind, CallRequest, CallResult, InvokeError, to_json_value};
pub use config::{
    DispatchConfig, DuplicatePolicy, FnkitConfig, LogFormat, ObservabilityConfig,
    RegistryConfig,
};
pub use descriptor::{FunctionDescriptor, FunctionSpec};
pub use error::{Error, Result};
pub use schema::{ParameterSchema, PropertySchema, SchemaType};
pub use signature::{MemberSignature, ParamSignature, SchemaFn};
pub use traits::{CandidateSource, FunctionHandler, HandlerFuture, handler_fn};

pub use serde_json::Value;
