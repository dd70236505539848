//! Logging and tracing setup for fnkit
//!
//! Installs a `tracing` subscriber (fmt output plus optional OpenTelemetry
//! export) and provides the span helpers the dispatcher instruments calls
//! with.

pub mod attributes;
pub mod spans;
pub mod tracer;

pub use spans::{function_call_span, record_outcome, safe_serialize};
pub use tracer::{init_telemetry, register_span_processor, tracer_provider};
