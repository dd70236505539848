//! Parameter schema generation
//!
//! Native types describe themselves through `schemars::JsonSchema`. The
//! generator asks `schemars` for each parameter's schema and re-emits it in
//! the protocol's fixed type mapping:
//!
//! | native type                         | schema `type`            |
//! |-------------------------------------|--------------------------|
//! | integers (`i8`..`i128`, `u8`..`u128`, `isize`, `usize`) | `integer` |
//! | `f32`, `f64`                        | `number`                 |
//! | `bool`                              | `boolean`                |
//! | `String`, `char`                    | `string`                 |
//! | unit-only enums                     | `string` + `enum`        |
//! | `Vec<T>`, slices, sets              | `array` + `items`        |
//! | `#[derive(JsonSchema)]` structs     | `object` + `properties`  |
//!
//! `Option<T>` marks a parameter optional. `$ref`s are inlined, so a type
//! that refers back to itself is rejected with `Error::SchemaCycle`. Anything
//! else (maps, data-carrying unions, tuples, `serde_json::Value`) is
//! `Error::UnsupportedType`.

use fnkit_core::{
    Error, FunctionSpec, MemberSignature, ParamSignature, ParameterSchema, PropertySchema,
    Result, SchemaType,
};
use indexmap::IndexMap;
use schemars::r#gen::SchemaSettings;
use serde_json::{Map, Value};

const DEFINITIONS_PREFIX: &str = "#/definitions/";

/// Derives the protocol descriptor of a declared member
pub fn generate(member: &MemberSignature) -> Result<FunctionSpec> {
    generate_spec(member.function_name(), &member.description, &member.params)
}

/// Derives a protocol descriptor from a name, description and parameter list
pub fn generate_spec(
    name: &str,
    description: &str,
    params: &[ParamSignature],
) -> Result<FunctionSpec> {
    let mut generator = SchemaSettings::draft07().into_generator();
    let mut parameters = ParameterSchema::new();

    for param in params {
        if parameters.get(&param.name).is_some() {
            return Err(Error::InvalidDeclaration(format!(
                "parameter '{}' of '{}' is declared twice",
                param.name, name
            )));
        }

        let raw = serde_json::to_value((param.schema_fn)(&mut generator))?;
        let definitions = serde_json::to_value(generator.definitions())?;
        let empty = Map::new();
        let mut resolver = Resolver {
            param,
            definitions: definitions.as_object().unwrap_or(&empty),
            stack: Vec::new(),
        };

        let (mut property, nullable) = resolver.convert(&raw)?;
        if let Some(description) = &param.description {
            property.description = Some(description.clone());
        }

        parameters = parameters.schema(param.name.clone(), property);
        if !nullable {
            parameters = parameters.required(param.name.clone());
        }
    }

    Ok(FunctionSpec::new(name, description, parameters))
}

/// Walks one parameter's `schemars` output, inlining definitions
struct Resolver<'a> {
    param: &'a ParamSignature,
    definitions: &'a Map<String, Value>,
    /// Definitions currently being expanded, outermost first
    stack: Vec<String>,
}

impl Resolver<'_> {
    /// Converts a schema, returning it together with whether it admits `null`
    fn convert(&mut self, schema: &Value) -> Result<(PropertySchema, bool)> {
        let object = match schema {
            Value::Object(object) => object,
            Value::Bool(true) => return Err(self.unsupported("accepts any JSON value")),
            _ => return Err(self.unsupported("schema has no type")),
        };

        let (mut property, nullable) = self.convert_object(object)?;
        if let Some(description) = object.get("description").and_then(Value::as_str) {
            property.description = Some(description.to_string());
        }
        Ok((property, nullable))
    }

    fn convert_object(&mut self, object: &Map<String, Value>) -> Result<(PropertySchema, bool)> {
        if let Some(reference) = object.get("$ref").and_then(Value::as_str) {
            return self.resolve_reference(reference);
        }

        if let Some(Value::Array(all_of)) = object.get("allOf") {
            return match all_of.as_slice() {
                [single] => self.convert(single),
                _ => Err(self.unsupported("intersection types have no mapping")),
            };
        }

        for keyword in ["anyOf", "oneOf"] {
            if let Some(Value::Array(variants)) = object.get(keyword) {
                return self.convert_union(variants);
            }
        }

        let (schema_type, nullable) = self.instance_type(object)?;
        let property = match schema_type {
            SchemaType::String => match object.get("enum") {
                Some(values) => PropertySchema::string_enum(self.enum_values(values)?),
                None => PropertySchema::new(SchemaType::String),
            },
            SchemaType::Array => self.convert_array(object)?,
            SchemaType::Object => self.convert_record(object)?,
            scalar => PropertySchema::new(scalar),
        };
        Ok((property, nullable))
    }

    fn resolve_reference(&mut self, reference: &str) -> Result<(PropertySchema, bool)> {
        let Some(name) = reference.strip_prefix(DEFINITIONS_PREFIX) else {
            return Err(self.unsupported(format!("unresolvable reference '{}'", reference)));
        };

        if self.stack.iter().any(|open| open == name) {
            return Err(Error::schema_cycle(&self.param.name, name));
        }

        let definitions = self.definitions;
        let Some(definition) = definitions.get(name) else {
            return Err(self.unsupported(format!("missing definition '{}'", name)));
        };

        self.stack.push(name.to_string());
        let converted = self.convert(definition);
        self.stack.pop();
        converted
    }

    fn convert_union(&mut self, variants: &[Value]) -> Result<(PropertySchema, bool)> {
        let (nulls, members): (Vec<&Value>, Vec<&Value>) =
            variants.iter().partition(|variant| is_null_schema(variant));
        let nullable = !nulls.is_empty();

        match members.as_slice() {
            [] => Err(self.unsupported("null has no mapping")),
            [single] => {
                let (property, inner_nullable) = self.convert(single)?;
                Ok((property, nullable || inner_nullable))
            }
            many => {
                // Unit enums whose variants carry doc comments come out as a
                // union of single-value string enums.
                let mut values = Vec::new();
                for member in many {
                    let (property, _) = self.convert(member)?;
                    match (property.schema_type, property.enum_values) {
                        (SchemaType::String, Some(variant_values)) => values.extend(variant_values),
                        _ => return Err(self.unsupported("union types have no mapping")),
                    }
                }
                Ok((PropertySchema::string_enum(values), nullable))
            }
        }
    }

    fn instance_type(&self, object: &Map<String, Value>) -> Result<(SchemaType, bool)> {
        match object.get("type") {
            Some(Value::String(keyword)) => Ok((self.parse_type(keyword)?, false)),
            Some(Value::Array(keywords)) => {
                let mut nullable = false;
                let mut types = Vec::new();
                for keyword in keywords {
                    match keyword.as_str() {
                        Some("null") => nullable = true,
                        Some(keyword) => types.push(keyword),
                        None => return Err(self.unsupported("malformed type list")),
                    }
                }
                match types.as_slice() {
                    [single] => Ok((self.parse_type(single)?, nullable)),
                    _ => Err(self.unsupported("union types have no mapping")),
                }
            }
            _ if object.contains_key("enum") => Ok((SchemaType::String, false)),
            _ => Err(self.unsupported("schema has no type")),
        }
    }

    fn parse_type(&self, keyword: &str) -> Result<SchemaType> {
        SchemaType::parse(keyword)
            .ok_or_else(|| self.unsupported(format!("'{}' has no mapping", keyword)))
    }

    fn enum_values(&self, values: &Value) -> Result<Vec<String>> {
        values
            .as_array()
            .into_iter()
            .flatten()
            .map(|value| {
                value
                    .as_str()
                    .map(str::to_string)
                    .ok_or_else(|| self.unsupported("only string enums have a mapping"))
            })
            .collect()
    }

    fn convert_array(&mut self, object: &Map<String, Value>) -> Result<PropertySchema> {
        match object.get("items") {
            Some(items @ Value::Object(_)) => {
                let (items, _) = self.convert(items)?;
                Ok(PropertySchema::array(items))
            }
            Some(Value::Array(_)) => Err(self.unsupported("tuple types have no mapping")),
            _ => Err(self.unsupported("array without an item type")),
        }
    }

    fn convert_record(&mut self, object: &Map<String, Value>) -> Result<PropertySchema> {
        let properties = object.get("properties").and_then(Value::as_object);
        let open_map = object
            .get("additionalProperties")
            .is_some_and(|additional| additional != &Value::Bool(false));
        if properties.is_none() && open_map {
            return Err(self.unsupported("map types have no mapping"));
        }

        let mut fields = IndexMap::new();
        for (field, schema) in properties.into_iter().flatten() {
            let (property, _) = self.convert(schema)?;
            fields.insert(field.clone(), property);
        }

        let required = object
            .get("required")
            .and_then(Value::as_array)
            .map(|names| {
                names
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(PropertySchema::object(fields, required))
    }

    fn unsupported(&self, reason: impl Into<String>) -> Error {
        Error::unsupported_type(
            &self.param.name,
            format!("{} ({})", reason.into(), self.param.type_name),
        )
    }
}

fn is_null_schema(schema: &Value) -> bool {
    schema.get("type").and_then(Value::as_str) == Some("null")
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemars::JsonSchema;
    use serde::Deserialize;
    use serde_json::json;
    use std::collections::{HashMap, HashSet};

    /// A postal address
    #[allow(dead_code)]
    #[derive(Deserialize, JsonSchema)]
    struct Address {
        /// Street and number
        street: String,
        zip: Option<String>,
        coordinates: Vec<f64>,
    }

    #[allow(dead_code)]
    #[derive(Deserialize, JsonSchema)]
    struct Customer {
        name: String,
        billing: Address,
        shipping: Option<Address>,
    }

    #[allow(dead_code)]
    #[derive(Deserialize, JsonSchema)]
    enum Unit {
        Celsius,
        Fahrenheit,
    }

    #[allow(dead_code)]
    #[derive(Deserialize, JsonSchema)]
    enum Priority {
        /// Can wait
        Low,
        /// Do it now
        High,
    }

    #[allow(dead_code)]
    #[derive(Deserialize, JsonSchema)]
    enum Shape {
        Circle { radius: f64 },
        Square(f64),
    }

    #[allow(dead_code)]
    #[derive(Deserialize, JsonSchema)]
    struct TreeNode {
        label: String,
        children: Vec<TreeNode>,
    }

    #[allow(dead_code)]
    #[derive(Deserialize, JsonSchema)]
    struct Employee {
        name: String,
        manager: Option<Box<Manager>>,
    }

    #[allow(dead_code)]
    #[derive(Deserialize, JsonSchema)]
    struct Manager {
        reports: Vec<Employee>,
    }

    fn single<T: JsonSchema>() -> Result<FunctionSpec> {
        generate_spec("f", "test", &[ParamSignature::of::<T>("p")])
    }

    fn type_of<T: JsonSchema>() -> SchemaType {
        single::<T>().unwrap().parameters.get("p").unwrap().schema_type
    }

    #[test]
    fn test_scalar_type_mapping() {
        assert_eq!(type_of::<i8>(), SchemaType::Integer);
        assert_eq!(type_of::<i16>(), SchemaType::Integer);
        assert_eq!(type_of::<i32>(), SchemaType::Integer);
        assert_eq!(type_of::<i64>(), SchemaType::Integer);
        assert_eq!(type_of::<i128>(), SchemaType::Integer);
        assert_eq!(type_of::<isize>(), SchemaType::Integer);
        assert_eq!(type_of::<u8>(), SchemaType::Integer);
        assert_eq!(type_of::<u16>(), SchemaType::Integer);
        assert_eq!(type_of::<u32>(), SchemaType::Integer);
        assert_eq!(type_of::<u64>(), SchemaType::Integer);
        assert_eq!(type_of::<usize>(), SchemaType::Integer);
        assert_eq!(type_of::<f32>(), SchemaType::Number);
        assert_eq!(type_of::<f64>(), SchemaType::Number);
        assert_eq!(type_of::<bool>(), SchemaType::Boolean);
        assert_eq!(type_of::<String>(), SchemaType::String);
        assert_eq!(type_of::<char>(), SchemaType::String);
    }

    #[test]
    fn test_scalars_emit_only_the_type() {
        let spec = single::<u32>().unwrap();
        assert_eq!(
            spec.parameters.to_value(),
            json!({
                "type": "object",
                "properties": {"p": {"type": "integer"}},
                "required": ["p"]
            })
        );
    }

    #[test]
    fn test_sequences_map_to_arrays() {
        let spec = single::<Vec<Vec<i64>>>().unwrap();
        assert_eq!(
            serde_json::to_value(spec.parameters.get("p").unwrap()).unwrap(),
            json!({"type": "array", "items": {"type": "array", "items": {"type": "integer"}}})
        );

        assert_eq!(type_of::<HashSet<String>>(), SchemaType::Array);
    }

    #[test]
    fn test_required_set_is_exactly_the_non_optional_params() {
        let spec = generate_spec(
            "search",
            "Searches the catalog",
            &[
                ParamSignature::of::<String>("query"),
                ParamSignature::of::<Option<u32>>("limit"),
                ParamSignature::of::<bool>("exact"),
                ParamSignature::of::<Option<Vec<String>>>("tags"),
            ],
        )
        .unwrap();

        assert_eq!(spec.parameters.required_names(), &["query", "exact"]);
        assert_eq!(
            spec.parameters.get("limit").unwrap().schema_type,
            SchemaType::Integer
        );
        assert_eq!(
            spec.parameters.get("tags").unwrap().schema_type,
            SchemaType::Array
        );
        let names: Vec<&String> = spec.parameters.properties().keys().collect();
        assert_eq!(names, vec!["query", "limit", "exact", "tags"]);
    }

    #[test]
    fn test_records_are_inlined_recursively() {
        let spec = generate_spec(
            "create_customer",
            "Creates a customer",
            &[ParamSignature::of::<Customer>("customer").with_description("The new customer")],
        )
        .unwrap();

        let customer = spec.parameters.get("customer").unwrap();
        assert_eq!(customer.description.as_deref(), Some("The new customer"));
        assert_eq!(
            customer.required.as_deref(),
            Some(&["name".to_string(), "billing".to_string()][..])
        );

        let fields = customer.properties.as_ref().unwrap();
        let billing = &fields["billing"];
        assert_eq!(billing.schema_type, SchemaType::Object);
        assert_eq!(billing.description.as_deref(), Some("A postal address"));

        let address_fields = billing.properties.as_ref().unwrap();
        assert_eq!(
            address_fields["street"].description.as_deref(),
            Some("Street and number")
        );
        assert_eq!(address_fields["zip"].schema_type, SchemaType::String);
        assert!(!billing.requires("zip"));
        assert_eq!(
            address_fields["coordinates"].items.as_ref().unwrap().schema_type,
            SchemaType::Number
        );

        // The same record reached twice is not a cycle
        assert_eq!(fields["shipping"].schema_type, SchemaType::Object);
    }

    #[test]
    fn test_unit_enums_map_to_string_enums() {
        let unit = single::<Unit>().unwrap();
        assert_eq!(
            unit.parameters.get("p").unwrap().enum_values.as_deref(),
            Some(&["Celsius".to_string(), "Fahrenheit".to_string()][..])
        );

        let priority = single::<Priority>().unwrap();
        let property = priority.parameters.get("p").unwrap();
        assert_eq!(property.schema_type, SchemaType::String);
        assert_eq!(
            property.enum_values.as_deref(),
            Some(&["Low".to_string(), "High".to_string()][..])
        );
    }

    #[test]
    fn test_direct_self_reference_is_a_cycle() {
        let err = single::<TreeNode>().unwrap_err();
        assert!(matches!(
            err,
            Error::SchemaCycle { ref param, ref type_name }
                if param == "p" && type_name == "TreeNode"
        ));
    }

    #[test]
    fn test_indirect_self_reference_is_a_cycle() {
        let err = single::<Employee>().unwrap_err();
        assert!(matches!(err, Error::SchemaCycle { .. }));
    }

    #[test]
    fn test_unsupported_types_name_the_parameter() {
        let map = generate_spec(
            "f",
            "test",
            &[ParamSignature::of::<HashMap<String, i32>>("scores")],
        )
        .unwrap_err();
        assert!(matches!(map, Error::UnsupportedType { ref param, .. } if param == "scores"));

        assert!(matches!(
            single::<serde_json::Value>().unwrap_err(),
            Error::UnsupportedType { .. }
        ));
        assert!(matches!(
            single::<(i32, String)>().unwrap_err(),
            Error::UnsupportedType { .. }
        ));
        assert!(matches!(
            single::<Shape>().unwrap_err(),
            Error::UnsupportedType { .. }
        ));
        assert!(matches!(
            single::<()>().unwrap_err(),
            Error::UnsupportedType { .. }
        ));
    }

    #[test]
    fn test_duplicate_parameter_names_are_rejected() {
        let err = generate_spec(
            "f",
            "test",
            &[
                ParamSignature::of::<String>("a"),
                ParamSignature::of::<i32>("a"),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidDeclaration(_)));
    }

    #[test]
    fn test_no_parameters() {
        let spec = generate_spec("now", "Current time", &[]).unwrap();
        assert!(spec.parameters.is_empty());
        assert_eq!(
            spec.parameters.to_value(),
            json!({"type": "object", "properties": {}, "required": []})
        );
    }
}
