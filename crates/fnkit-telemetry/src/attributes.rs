//! Span attribute names
//!
//! Follows the OpenTelemetry semantic conventions for generative AI tool
//! execution where one exists.

pub const SYSTEM_NAME: &str = "fnkit";

pub const GEN_AI_OPERATION_NAME: &str = "gen_ai.operation.name";
pub const GEN_AI_TOOL_NAME: &str = "gen_ai.tool.name";
pub const GEN_AI_TOOL_DESCRIPTION: &str = "gen_ai.tool.description";

pub const FNKIT_CALL_ARGS: &str = "fnkit.call.args";
pub const FNKIT_CALL_OUTCOME: &str = "fnkit.call.outcome";
pub const FNKIT_CALL_ERROR_KIND: &str = "fnkit.call.error_kind";
