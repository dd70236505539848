//! Function registry and invocation dispatcher for fnkit
//!
//! This crate provides:
//! - Parameter schema generation from `schemars` type reflection
//! - Extraction of functions from candidate sources
//! - A concurrency-safe function registry
//! - The dispatcher that decodes model-issued calls and runs them
//! - Hand-declared functions (`FunctionBuilder`, `FunctionSet`) and built-ins

pub mod builder;
pub mod builtin;
pub mod decode;
pub mod dispatcher;
pub mod extractor;
pub mod registry;
pub mod schema;
pub mod source;

// Re-exports
pub use builder::FunctionBuilder;
pub use builtin::builtin_functions;
pub use decode::decode_arguments;
pub use dispatcher::Dispatcher;
pub use extractor::{Extraction, ExtractionFailure, build_descriptor, extract, extract_with_report};
pub use registry::FunctionRegistry;
pub use schema::{generate, generate_spec};
pub use source::FunctionSet;

// Re-export core types
pub use fnkit_core::{CallRequest, CallResult, Error, Result};
