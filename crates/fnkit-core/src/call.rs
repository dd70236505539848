//! Call request and result types exchanged with the orchestration layer

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// A function call issued by the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRequest {
    pub function_name: String,
    /// Raw JSON text of the arguments object, exactly as the model produced it
    pub arguments_json: String,
}

impl CallRequest {
    pub fn new(function_name: impl Into<String>, arguments_json: impl Into<String>) -> Self {
        Self {
            function_name: function_name.into(),
            arguments_json: arguments_json.into(),
        }
    }

    /// Builds a request from an already parsed arguments value
    pub fn from_value(function_name: impl Into<String>, arguments: &Value) -> Self {
        Self::new(function_name, arguments.to_string())
    }
}

/// Failure categories reported back to the caller of `dispatch`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CallErrorKind {
    UnknownFunction,
    MissingArgument,
    ArgumentTypeMismatch,
    UnsupportedReturnType,
    ExecutionError,
}

impl CallErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallErrorKind::UnknownFunction => "unknownFunction",
            CallErrorKind::MissingArgument => "missingArgument",
            CallErrorKind::ArgumentTypeMismatch => "argumentTypeMismatch",
            CallErrorKind::UnsupportedReturnType => "unsupportedReturnType",
            CallErrorKind::ExecutionError => "executionError",
        }
    }
}

impl fmt::Display for CallErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a single dispatched call
///
/// Serializes as `{"ok": true, "value": ...}` or
/// `{"ok": false, "errorKind": "...", "message": "..."}`.
#[derive(Debug, Clone, PartialEq)]
pub enum CallResult {
    Success { value: Value },
    Failed { kind: CallErrorKind, message: String },
}

impl CallResult {
    pub fn success(value: Value) -> Self {
        CallResult::Success { value }
    }

    pub fn failed(kind: CallErrorKind, message: impl Into<String>) -> Self {
        CallResult::Failed {
            kind,
            message: message.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, CallResult::Success { .. })
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            CallResult::Success { value } => Some(value),
            CallResult::Failed { .. } => None,
        }
    }

    pub fn error_kind(&self) -> Option<CallErrorKind> {
        match self {
            CallResult::Success { .. } => None,
            CallResult::Failed { kind, .. } => Some(*kind),
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            CallResult::Success { .. } => None,
            CallResult::Failed { message, .. } => Some(message),
        }
    }

    /// Renders the text to relay back into the conversation as the function
    /// response message.
    pub fn to_message_content(&self) -> String {
        match self {
            CallResult::Success { value } => value.to_string(),
            CallResult::Failed { kind, message } => serde_json::json!({
                "error": kind,
                "message": message,
            })
            .to_string(),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CallResultWire {
    ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error_kind: Option<CallErrorKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl Serialize for CallResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let wire = match self {
            CallResult::Success { value } => CallResultWire {
                ok: true,
                value: Some(value.clone()),
                error_kind: None,
                message: None,
            },
            CallResult::Failed { kind, message } => CallResultWire {
                ok: false,
                value: None,
                error_kind: Some(*kind),
                message: Some(message.clone()),
            },
        };
        wire.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CallResult {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = CallResultWire::deserialize(deserializer)?;
        if wire.ok {
            return Ok(CallResult::Success {
                value: wire.value.unwrap_or(Value::Null),
            });
        }
        let kind = wire
            .error_kind
            .ok_or_else(|| <D::Error as serde::de::Error>::missing_field("errorKind"))?;
        Ok(CallResult::Failed {
            kind,
            message: wire.message.unwrap_or_default(),
        })
    }
}

/// Error raised from inside a function handler
///
/// Handlers decode their own positional arguments and serialize their own
/// return value, so the decode and serialize failures they can hit are
/// represented here alongside plain execution failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvokeError {
    #[error("missing required argument '{param}'")]
    MissingArgument { param: String },

    #[error("argument '{param}' has the wrong type: {message}")]
    ArgumentTypeMismatch { param: String, message: String },

    #[error("{0}")]
    Execution(String),

    #[error("return value cannot be represented as JSON: {0}")]
    UnsupportedReturnType(String),
}

impl InvokeError {
    /// Wraps any displayable failure raised by a function body
    pub fn execution(err: impl fmt::Display) -> Self {
        InvokeError::Execution(err.to_string())
    }

    pub fn mismatch(param: impl Into<String>, message: impl fmt::Display) -> Self {
        InvokeError::ArgumentTypeMismatch {
            param: param.into(),
            message: message.to_string(),
        }
    }

    pub fn kind(&self) -> CallErrorKind {
        match self {
            InvokeError::MissingArgument { .. } => CallErrorKind::MissingArgument,
            InvokeError::ArgumentTypeMismatch { .. } => CallErrorKind::ArgumentTypeMismatch,
            InvokeError::Execution(_) => CallErrorKind::ExecutionError,
            InvokeError::UnsupportedReturnType(_) => CallErrorKind::UnsupportedReturnType,
        }
    }
}

/// Serializes a function's return value into the protocol's JSON form
///
/// JSON has no representation for NaN or infinite floats; serde_json maps
/// them to `null`, so a function returning `f64::NAN` succeeds with a `null`
/// value. Values serde cannot represent at all, such as maps keyed by tuples,
/// are an [`InvokeError::UnsupportedReturnType`].
pub fn to_json_value<T: Serialize + ?Sized>(value: &T) -> Result<Value, InvokeError> {
    serde_json::to_value(value).map_err(|e| InvokeError::UnsupportedReturnType(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn test_call_request_wire_names() {
        let request = CallRequest::new("search", r#"{"q":"rust"}"#);
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["functionName"], "search");
        assert_eq!(value["argumentsJson"], r#"{"q":"rust"}"#);
    }

    #[test]
    fn test_success_wire_shape() {
        let result = CallResult::success(json!({"temp": 21}));
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({"ok": true, "value": {"temp": 21}})
        );
    }

    #[test]
    fn test_failure_wire_shape() {
        let result = CallResult::failed(CallErrorKind::MissingArgument, "missing 'city'");
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({"ok": false, "errorKind": "missingArgument", "message": "missing 'city'"})
        );

        let parsed: CallResult =
            serde_json::from_value(serde_json::to_value(&result).unwrap()).unwrap();
        assert_eq!(parsed, result);
    }

    #[test]
    fn test_non_finite_floats_serialize_as_null() {
        assert_eq!(to_json_value(&f64::NAN).unwrap(), Value::Null);
        assert_eq!(to_json_value(&f64::INFINITY).unwrap(), Value::Null);
        assert_eq!(to_json_value(&1.5_f64).unwrap(), json!(1.5));
    }

    #[test]
    fn test_failure_without_kind_is_rejected() {
        let parsed = serde_json::from_value::<CallResult>(json!({"ok": false}));
        assert!(parsed.is_err());
    }

    #[test]
    fn test_message_content() {
        let ok = CallResult::success(json!("done"));
        assert_eq!(ok.to_message_content(), "\"done\"");

        let failed = CallResult::failed(CallErrorKind::UnknownFunction, "no such function");
        let content: Value = serde_json::from_str(&failed.to_message_content()).unwrap();
        assert_eq!(content["error"], "unknownFunction");
        assert_eq!(content["message"], "no such function");
    }

    #[test]
    fn test_invoke_error_kinds() {
        assert_eq!(
            InvokeError::execution("disk full").kind(),
            CallErrorKind::ExecutionError
        );
        assert_eq!(
            InvokeError::mismatch("limit", "expected integer").kind(),
            CallErrorKind::ArgumentTypeMismatch
        );
    }

    #[test]
    fn test_to_json_value_rejects_non_string_keys() {
        let mut grid = HashMap::new();
        grid.insert((1u8, 2u8), "cell");
        let err = to_json_value(&grid).unwrap_err();
        assert_eq!(err.kind(), CallErrorKind::UnsupportedReturnType);
    }
}
