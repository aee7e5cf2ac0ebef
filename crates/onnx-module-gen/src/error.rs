use onnx_graph::ParseError;

/// Errors raised while generating a module from an ONNX graph.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The generator is not configured properly.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// No generator is registered for the operator.
    #[error("Unsupported operator: {0}")]
    UnsupportedOperator(String),

    /// A value that must be known at generation time is computed at run time.
    #[error("Node ({node}): '{tensor}' must be a constant initializer")]
    UnresolvedDynamicValue {
        /// Node name.
        node: String,
        /// Tensor that is not an initializer.
        tensor: String,
    },

    /// The graph does not declare the shape or type the generator needs.
    #[error("Missing value info for '{0}'")]
    MissingValueInfo(String),

    /// The node cannot be expressed with the target API.
    #[error("Node ({node}): {reason}")]
    InvalidNode {
        /// Node name.
        node: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The model could not be read.
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The embedding configuration is not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generated tokens could not be rendered to source.
    #[error("Formatting error: {0}")]
    Format(#[from] rust_format::Error),
}

impl Error {
    pub(crate) fn invalid_node(node: &str, reason: impl Into<String>) -> Self {
        Error::InvalidNode {
            node: node.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type of this crate.
pub type Result<T> = core::result::Result<T, Error>;
