use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Parameter '{param}' has a self-referential type '{type_name}'")]
    SchemaCycle { param: String, type_name: String },

    #[error("Parameter '{param}' has an unsupported type: {reason}")]
    UnsupportedType { param: String, reason: String },

    #[error("Function '{0}' is already registered")]
    DuplicateFunction(String),

    #[error("Invalid function declaration: {0}")]
    InvalidDeclaration(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Helper for creating configuration errors
    ///
    /// # Example
    /// ```
    /// use fnkit_core::Error;
    /// let err = Error::config_error("unknown duplicate policy");
    /// ```
    pub fn config_error(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Helper for creating general errors with a message
    pub fn message(msg: impl Into<String>) -> Self {
        Error::Other(anyhow::anyhow!("{}", msg.into()))
    }

    pub fn unsupported_type(param: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::UnsupportedType {
            param: param.into(),
            reason: reason.into(),
        }
    }

    pub fn schema_cycle(param: impl Into<String>, type_name: impl Into<String>) -> Self {
        Error::SchemaCycle {
            param: param.into(),
            type_name: type_name.into(),
        }
    }

    /// Returns true for the errors raised while deriving a parameter schema.
    ///
    /// Extraction recovers from these per member instead of aborting the scan.
    pub fn is_schema_error(&self) -> bool {
        matches!(
            self,
            Error::SchemaCycle { .. } | Error::UnsupportedType { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_cycle_display() {
        let err = Error::schema_cycle("tree", "Node");
        let message = err.to_string();
        assert!(message.contains("tree"));
        assert!(message.contains("Node"));
        assert!(err.is_schema_error());
    }

    #[test]
    fn test_unsupported_type_display() {
        let err = Error::unsupported_type("payload", "map types have no mapping");
        assert_eq!(
            err.to_string(),
            "Parameter 'payload' has an unsupported type: map types have no mapping"
        );
        assert!(err.is_schema_error());
    }

    #[test]
    fn test_other_errors_are_not_schema_errors() {
        assert!(!Error::DuplicateFunction("f".into()).is_schema_error());
        assert!(!Error::config_error("bad").is_schema_error());
        assert!(!Error::message("boom").is_schema_error());
    }
}
