//! Span helpers for function dispatch

use crate::attributes::*;
use fnkit_core::CallResult;
use tracing::Span;
use tracing::field::Empty;

/// Creates the span a single dispatched call runs under.
///
/// The outcome fields start empty and are filled in by [`record_outcome`]
/// once the call has finished. `args_json` should already be redacted by the
/// caller if arguments are not meant to be logged.
pub fn function_call_span(name: &str, description: &str, args_json: &str) -> Span {
    tracing::info_span!(
        "execute_function",
        { GEN_AI_OPERATION_NAME } = "execute_tool",
        { GEN_AI_TOOL_NAME } = %name,
        { GEN_AI_TOOL_DESCRIPTION } = %description,
        { FNKIT_CALL_ARGS } = %args_json,
        { FNKIT_CALL_OUTCOME } = Empty,
        { FNKIT_CALL_ERROR_KIND } = Empty,
    )
}

/// Records how a call ended on its span
pub fn record_outcome(span: &Span, result: &CallResult) {
    match result.error_kind() {
        None => {
            span.record(FNKIT_CALL_OUTCOME, "success");
        }
        Some(kind) => {
            span.record(FNKIT_CALL_OUTCOME, "failed");
            span.record(FNKIT_CALL_ERROR_KIND, kind.as_str());
        }
    }
}

/// Helper to safely serialize to JSON string
pub fn safe_serialize<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "<not serializable>".to_string())
}
