//! Argument decoding
//!
//! Checks a model-supplied JSON payload against a function's parameter
//! schema and produces the positional [`Arguments`] handed to the
//! implementation. Scalars are coerced toward the declared type; nested
//! arrays and objects are walked recursively so errors can name the exact
//! field path (`order.items[2].sku`).

use fnkit_core::{Arguments, InvokeError, ParameterSchema, PropertySchema, SchemaType};
use serde_json::{Map, Number, Value};

/// Pseudo-parameter name used when the payload itself is malformed
const PAYLOAD: &str = "arguments";

/// Decodes `arguments_json` into positional arguments in schema order
///
/// An empty payload (or `null`) is treated as `{}`. Keys not declared by the
/// schema are ignored. With `lenient` set, numeric and boolean strings are
/// accepted for numeric and boolean parameters, and numbers and booleans for
/// string parameters.
pub fn decode_arguments(
    schema: &ParameterSchema,
    arguments_json: &str,
    lenient: bool,
) -> Result<Arguments, InvokeError> {
    let mut payload = parse_payload(arguments_json)?;
    let decoder = Decoder { lenient };

    let mut slots = Vec::with_capacity(schema.len());
    for (name, property) in schema.properties() {
        let slot = match payload.remove(name) {
            None | Some(Value::Null) if schema.is_required(name) => {
                return Err(InvokeError::MissingArgument {
                    param: name.clone(),
                });
            }
            None | Some(Value::Null) => None,
            Some(value) => Some(decoder.coerce(value, property, name)?),
        };
        slots.push((name.clone(), slot));
    }

    Ok(Arguments::new(slots))
}

fn parse_payload(arguments_json: &str) -> Result<Map<String, Value>, InvokeError> {
    let trimmed = arguments_json.trim();
    if trimmed.is_empty() {
        return Ok(Map::new());
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(Value::Null) => Ok(Map::new()),
        Ok(other) => Err(InvokeError::mismatch(
            PAYLOAD,
            format!("expected a JSON object, found {}", json_type(&other)),
        )),
        Err(e) => Err(InvokeError::mismatch(PAYLOAD, format!("invalid JSON: {}", e))),
    }
}

struct Decoder {
    lenient: bool,
}

impl Decoder {
    fn coerce(
        &self,
        value: Value,
        schema: &PropertySchema,
        path: &str,
    ) -> Result<Value, InvokeError> {
        match schema.schema_type {
            SchemaType::Integer => self.coerce_integer(value, path),
            SchemaType::Number => self.coerce_number(value, path),
            SchemaType::Boolean => self.coerce_boolean(value, path),
            SchemaType::String => self.coerce_string(value, schema, path),
            SchemaType::Array => self.coerce_array(value, schema, path),
            SchemaType::Object => self.coerce_object(value, schema, path),
        }
    }

    fn coerce_integer(&self, value: Value, path: &str) -> Result<Value, InvokeError> {
        match value {
            Value::Number(n) if n.is_i64() || n.is_u64() => Ok(Value::Number(n)),
            Value::Number(n) => match n.as_f64() {
                Some(f) => narrow_float(f, path),
                None => Err(mismatch(path, "integer", &Value::Number(n))),
            },
            Value::String(s) if self.lenient => {
                let text = s.trim();
                if let Ok(i) = text.parse::<i64>() {
                    Ok(Value::from(i))
                } else if let Ok(u) = text.parse::<u64>() {
                    Ok(Value::from(u))
                } else if let Ok(f) = text.parse::<f64>() {
                    narrow_float(f, path)
                } else {
                    Err(InvokeError::mismatch(
                        path,
                        format!("expected integer, found string '{}'", s),
                    ))
                }
            }
            other => Err(mismatch(path, "integer", &other)),
        }
    }

    fn coerce_number(&self, value: Value, path: &str) -> Result<Value, InvokeError> {
        match value {
            Value::Number(n) => Ok(Value::Number(n)),
            Value::String(s) if self.lenient => s
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| {
                    InvokeError::mismatch(path, format!("expected number, found string '{}'", s))
                }),
            other => Err(mismatch(path, "number", &other)),
        }
    }

    fn coerce_boolean(&self, value: Value, path: &str) -> Result<Value, InvokeError> {
        match value {
            Value::Bool(b) => Ok(Value::Bool(b)),
            Value::String(s) if self.lenient => {
                let text = s.trim();
                if text.eq_ignore_ascii_case("true") {
                    Ok(Value::Bool(true))
                } else if text.eq_ignore_ascii_case("false") {
                    Ok(Value::Bool(false))
                } else {
                    Err(InvokeError::mismatch(
                        path,
                        format!("expected boolean, found string '{}'", s),
                    ))
                }
            }
            other => Err(mismatch(path, "boolean", &other)),
        }
    }

    fn coerce_string(
        &self,
        value: Value,
        schema: &PropertySchema,
        path: &str,
    ) -> Result<Value, InvokeError> {
        let text = match value {
            Value::String(s) => s,
            Value::Number(n) if self.lenient => n.to_string(),
            Value::Bool(b) if self.lenient => b.to_string(),
            other => return Err(mismatch(path, "string", &other)),
        };

        match &schema.enum_values {
            Some(variants) => match_variant(variants, &text)
                .map(|variant| Value::String(variant.to_string()))
                .ok_or_else(|| {
                    InvokeError::mismatch(
                        path,
                        format!("'{}' is not one of: {}", text, variants.join(", ")),
                    )
                }),
            None => Ok(Value::String(text)),
        }
    }

    fn coerce_array(
        &self,
        value: Value,
        schema: &PropertySchema,
        path: &str,
    ) -> Result<Value, InvokeError> {
        let elements = match value {
            Value::Array(elements) => elements,
            other => return Err(mismatch(path, "array", &other)),
        };
        let Some(items) = schema.items.as_deref() else {
            return Ok(Value::Array(elements));
        };

        elements
            .into_iter()
            .enumerate()
            .map(|(index, element)| match element {
                // Element nullability is left to the native type
                Value::Null => Ok(Value::Null),
                element => self.coerce(element, items, &format!("{}[{}]", path, index)),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array)
    }

    fn coerce_object(
        &self,
        value: Value,
        schema: &PropertySchema,
        path: &str,
    ) -> Result<Value, InvokeError> {
        let mut fields = match value {
            Value::Object(fields) => fields,
            other => return Err(mismatch(path, "object", &other)),
        };
        let Some(properties) = &schema.properties else {
            return Ok(Value::Object(fields));
        };

        let mut decoded = Map::new();
        for (field, property) in properties {
            let field_path = format!("{}.{}", path, field);
            match fields.remove(field) {
                None | Some(Value::Null) if schema.requires(field) => {
                    return Err(InvokeError::MissingArgument { param: field_path });
                }
                None => {}
                Some(Value::Null) => {
                    decoded.insert(field.clone(), Value::Null);
                }
                Some(value) => {
                    decoded.insert(field.clone(), self.coerce(value, property, &field_path)?);
                }
            }
        }

        Ok(Value::Object(decoded))
    }
}

/// Exact match first, then a case-insensitive one; returns the declared spelling
fn match_variant<'a>(variants: &'a [String], text: &str) -> Option<&'a str> {
    variants
        .iter()
        .find(|variant| variant.as_str() == text)
        .or_else(|| {
            variants
                .iter()
                .find(|variant| variant.eq_ignore_ascii_case(text.trim()))
        })
        .map(String::as_str)
}

/// Integer arguments are limited to the 64-bit range: serde_json parses
/// larger literals as floats, so an `i128`/`u128` parameter only receives
/// values that fit in `i64` or `u64`.
fn narrow_float(f: f64, path: &str) -> Result<Value, InvokeError> {
    if !f.is_finite() || f.fract() != 0.0 {
        return Err(InvokeError::mismatch(
            path,
            format!("expected integer, found {}", f),
        ));
    }

    if f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Ok(Value::from(f as i64))
    } else if f >= 0.0 && f < u64::MAX as f64 {
        Ok(Value::from(f as u64))
    } else {
        Err(InvokeError::mismatch(
            path,
            format!("{} is outside the 64-bit integer range", f),
        ))
    }
}

fn mismatch(path: &str, expected: &str, found: &Value) -> InvokeError {
    InvokeError::mismatch(path, format!("expected {}, found {}", expected, json_type(found)))
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use serde_json::json;

    fn search_schema() -> ParameterSchema {
        ParameterSchema::new()
            .property("name", SchemaType::String, "Name")
            .required("name")
            .property("limit", SchemaType::Integer, "Limit")
            .required("limit")
            .property("verbose", SchemaType::Boolean, "Verbose")
    }

    fn order_schema() -> ParameterSchema {
        let mut item_fields = IndexMap::new();
        item_fields.insert("sku".to_string(), PropertySchema::new(SchemaType::String));
        item_fields.insert(
            "quantity".to_string(),
            PropertySchema::new(SchemaType::Integer),
        );
        let item = PropertySchema::object(item_fields, vec!["sku".to_string()]);

        let mut order_fields = IndexMap::new();
        order_fields.insert("items".to_string(), PropertySchema::array(item));
        order_fields.insert(
            "priority".to_string(),
            PropertySchema::string_enum(["Low", "High"]),
        );

        ParameterSchema::new()
            .schema(
                "order",
                PropertySchema::object(order_fields, vec!["items".to_string()]),
            )
            .required("order")
    }

    fn slots(args: &Arguments) -> Vec<Option<Value>> {
        args.names().map(|name| args.raw(name).cloned()).collect()
    }

    #[test]
    fn test_decodes_in_schema_order() {
        let args = decode_arguments(
            &search_schema(),
            r#"{"limit": 5, "name": "a", "extra": 1}"#,
            false,
        )
        .unwrap();

        let names: Vec<&str> = args.names().collect();
        assert_eq!(names, vec!["name", "limit", "verbose"]);
        assert_eq!(slots(&args), vec![Some(json!("a")), Some(json!(5)), None]);
    }

    #[test]
    fn test_empty_payload_is_an_empty_object() {
        let schema = ParameterSchema::new().property("verbose", SchemaType::Boolean, "v");
        for payload in ["", "   ", "{}", "null"] {
            let args = decode_arguments(&schema, payload, false).unwrap();
            assert_eq!(slots(&args), vec![None]);
        }
    }

    #[test]
    fn test_malformed_payloads_are_mismatches() {
        for payload in ["{not json", "[1, 2]", "\"text\""] {
            let err = decode_arguments(&search_schema(), payload, true).unwrap_err();
            assert!(matches!(
                err,
                InvokeError::ArgumentTypeMismatch { ref param, .. } if param == "arguments"
            ));
        }
    }

    #[test]
    fn test_missing_or_null_required_argument() {
        let err = decode_arguments(&search_schema(), r#"{"name": "a"}"#, false).unwrap_err();
        assert_eq!(
            err,
            InvokeError::MissingArgument {
                param: "limit".to_string()
            }
        );

        let err =
            decode_arguments(&search_schema(), r#"{"name": null, "limit": 1}"#, false).unwrap_err();
        assert_eq!(
            err,
            InvokeError::MissingArgument {
                param: "name".to_string()
            }
        );
    }

    #[test]
    fn test_integer_coercion() {
        let args = decode_arguments(&search_schema(), r#"{"name": "a", "limit": 5.0}"#, false)
            .unwrap();
        assert_eq!(args.raw("limit"), Some(&json!(5)));

        let err = decode_arguments(&search_schema(), r#"{"name": "a", "limit": 5.5}"#, false)
            .unwrap_err();
        assert!(matches!(
            err,
            InvokeError::ArgumentTypeMismatch { ref param, .. } if param == "limit"
        ));

        let strict = decode_arguments(&search_schema(), r#"{"name": "a", "limit": "7"}"#, false);
        assert!(strict.is_err());

        let lenient =
            decode_arguments(&search_schema(), r#"{"name": "a", "limit": " 7 "}"#, true).unwrap();
        assert_eq!(lenient.raw("limit"), Some(&json!(7)));
    }

    #[test]
    fn test_integers_beyond_64_bits_are_rejected() {
        let err = decode_arguments(
            &search_schema(),
            r#"{"name": "a", "limit": 100000000000000000000}"#,
            false,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            InvokeError::ArgumentTypeMismatch { ref param, ref message }
                if param == "limit" && message.contains("64-bit")
        ));

        let args = decode_arguments(
            &search_schema(),
            r#"{"name": "a", "limit": 18446744073709551615}"#,
            false,
        )
        .unwrap();
        assert_eq!(args.raw("limit"), Some(&json!(u64::MAX)));
    }

    #[test]
    fn test_lenient_scalars() {
        let schema = ParameterSchema::new()
            .property("ratio", SchemaType::Number, "r")
            .property("enabled", SchemaType::Boolean, "e")
            .property("label", SchemaType::String, "l");

        let args = decode_arguments(
            &schema,
            r#"{"ratio": "0.25", "enabled": "TRUE", "label": 42}"#,
            true,
        )
        .unwrap();
        assert_eq!(args.raw("ratio"), Some(&json!(0.25)));
        assert_eq!(args.raw("enabled"), Some(&json!(true)));
        assert_eq!(args.raw("label"), Some(&json!("42")));

        let err = decode_arguments(&schema, r#"{"enabled": "yes"}"#, true).unwrap_err();
        assert!(matches!(err, InvokeError::ArgumentTypeMismatch { .. }));

        let err = decode_arguments(&schema, r#"{"label": 42}"#, false).unwrap_err();
        assert!(matches!(err, InvokeError::ArgumentTypeMismatch { .. }));
    }

    #[test]
    fn test_enum_values_are_normalized() {
        let schema = ParameterSchema::new()
            .schema("unit", PropertySchema::string_enum(["Celsius", "Fahrenheit"]))
            .required("unit");

        let exact = decode_arguments(&schema, r#"{"unit": "Celsius"}"#, false).unwrap();
        assert_eq!(exact.raw("unit"), Some(&json!("Celsius")));

        let folded = decode_arguments(&schema, r#"{"unit": "fahrenheit"}"#, false).unwrap();
        assert_eq!(folded.raw("unit"), Some(&json!("Fahrenheit")));

        let err = decode_arguments(&schema, r#"{"unit": "kelvin"}"#, false).unwrap_err();
        assert!(err.to_string().contains("Celsius, Fahrenheit"));
    }

    #[test]
    fn test_nested_values_are_coerced() {
        let args = decode_arguments(
            &order_schema(),
            r#"{"order": {"items": [{"sku": "A1", "quantity": 2.0, "note": "x"}], "priority": "high"}}"#,
            false,
        )
        .unwrap();

        assert_eq!(
            args.raw("order"),
            Some(&json!({"items": [{"sku": "A1", "quantity": 2}], "priority": "High"}))
        );
    }

    #[test]
    fn test_nested_errors_name_the_path() {
        let err = decode_arguments(
            &order_schema(),
            r#"{"order": {"items": [{"sku": "A1"}, {"quantity": 1}]}}"#,
            false,
        )
        .unwrap_err();
        assert_eq!(
            err,
            InvokeError::MissingArgument {
                param: "order.items[1].sku".to_string()
            }
        );

        let err = decode_arguments(
            &order_schema(),
            r#"{"order": {"items": [{"sku": "A1", "quantity": "lots"}]}}"#,
            true,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            InvokeError::ArgumentTypeMismatch { ref param, .. }
                if param == "order.items[0].quantity"
        ));

        let err = decode_arguments(&order_schema(), r#"{"order": {"items": {}}}"#, false)
            .unwrap_err();
        assert!(matches!(
            err,
            InvokeError::ArgumentTypeMismatch { ref param, .. } if param == "order.items"
        ));
    }
}
