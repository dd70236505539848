use crate::call::InvokeError;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Decoded, positionally ordered arguments for one invocation
///
/// The dispatcher fills one slot per declared parameter, in declaration order.
/// Absent optional parameters are `None` and decode as `null`, which is what
/// `Option<T>` parameters expect.
#[derive(Debug, Clone, Default)]
pub struct Arguments {
    slots: Vec<(String, Option<Value>)>,
    cursor: usize,
}

impl Arguments {
    pub fn new(slots: Vec<(String, Option<Value>)>) -> Self {
        Self { slots, cursor: 0 }
    }

    /// Decodes the next positional argument into its native type
    pub fn next<T: DeserializeOwned>(&mut self) -> Result<T, InvokeError> {
        let Some((name, value)) = self.slots.get_mut(self.cursor) else {
            return Err(InvokeError::MissingArgument {
                param: format!("#{}", self.cursor),
            });
        };
        self.cursor += 1;

        let value = value.take().unwrap_or(Value::Null);
        serde_json::from_value(value).map_err(|e| InvokeError::mismatch(name.clone(), e))
    }

    /// Returns the raw JSON of an argument by name without consuming it
    pub fn raw(&self, name: &str) -> Option<&Value> {
        self.slots
            .iter()
            .find(|(slot, _)| slot == name)
            .and_then(|(_, value)| value.as_ref())
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|(name, _)| name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(slots: Vec<(&str, Option<Value>)>) -> Arguments {
        Arguments::new(
            slots
                .into_iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
        )
    }

    #[test]
    fn test_positional_decoding() {
        let mut arguments = args(vec![("name", Some(json!("a"))), ("limit", Some(json!(5)))]);

        let name: String = arguments.next().unwrap();
        let limit: i64 = arguments.next().unwrap();

        assert_eq!(name, "a");
        assert_eq!(limit, 5);
    }

    #[test]
    fn test_absent_optional_decodes_to_none() {
        let mut arguments = args(vec![("days", None)]);
        let days: Option<u32> = arguments.next().unwrap();
        assert_eq!(days, None);
    }

    #[test]
    fn test_narrowing_overflow_is_a_mismatch() {
        let mut arguments = args(vec![("small", Some(json!(300)))]);
        let err = arguments.next::<u8>().unwrap_err();
        assert!(matches!(
            err,
            InvokeError::ArgumentTypeMismatch { ref param, .. } if param == "small"
        ));
    }

    #[test]
    fn test_reading_past_the_end() {
        let mut arguments = args(vec![]);
        assert!(matches!(
            arguments.next::<String>(),
            Err(InvokeError::MissingArgument { .. })
        ));
    }

    #[test]
    fn test_raw_lookup() {
        let arguments = args(vec![("q", Some(json!("rust"))), ("page", None)]);
        assert_eq!(arguments.raw("q"), Some(&json!("rust")));
        assert_eq!(arguments.raw("page"), None);
        assert_eq!(arguments.names().collect::<Vec<_>>(), vec!["q", "page"]);
    }
}
