use crate::ir::ElementType;

/// Error type for reading ONNX models.
#[derive(thiserror::Error, Debug)]
pub enum ParseError {
    /// The model file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The bytes are not a valid ONNX protobuf message.
    #[error("Protobuf error: {0}")]
    Protobuf(#[from] protobuf::Error),

    /// The element type code is unknown or not handled.
    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(i32),

    /// The tensor payload could not be decoded.
    #[error("Invalid tensor '{name}': {reason}")]
    InvalidTensor {
        /// Tensor name.
        name: String,
        /// What is wrong with it.
        reason: String,
    },

    /// An attribute could not be decoded.
    #[error("Invalid attribute '{name}': {reason}")]
    InvalidAttribute {
        /// Attribute name.
        name: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The tensor does not hold integers.
    #[error("Expected integer data, found {0}")]
    NotInteger(ElementType),
}
