/// Errors raised while building graphs or generating bindings.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// An argument is not one of the recognised input shapes, or is malformed.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The node failed the structural check against its schema. Holds the checker's diagnostic.
    #[error("{0}")]
    SchemaValidation(String),

    /// A graph output declaration received an argument it cannot declare.
    #[error("Unsupported graph output: {0}")]
    UnsupportedOutput(String),

    /// No schema matches the requested operator and version.
    #[error("No schema for operator '{name}' (domain '{domain}') at opset version {version}")]
    UnknownSchema {
        /// Operator name.
        name: String,
        /// Operator domain.
        domain: String,
        /// Requested version.
        version: i64,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The schema catalogue is not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The model could not be serialized.
    #[error("Protobuf error: {0}")]
    Protobuf(#[from] protobuf::Error),

    /// Generated tokens could not be rendered to source.
    #[error("Formatting error: {0}")]
    Format(#[from] rust_format::Error),
}

impl Error {
    /// No schema of `name` in `domain` at `version`.
    pub fn unknown_schema(name: &str, domain: &str, version: i64) -> Self {
        Error::UnknownSchema {
            name: name.to_string(),
            domain: domain.to_string(),
            version,
        }
    }
}

/// Result type of this crate.
pub type Result<T> = core::result::Result<T, Error>;
