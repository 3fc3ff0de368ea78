//! Error types for secp256k1 ZKP operations

use thiserror::Error;

/// Result type for ZKP operations
pub type Result<T> = std::result::Result<T, ZkpError>;

/// Errors returned by the arithmetic, generator and surjection proof APIs.
///
/// Every variant stems from caller-supplied data and is recoverable. A proof
/// that fails its cryptographic check is not an error: verification returns
/// `false` instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ZkpError {
    /// A scalar was out of range, or zero where zero is forbidden
    #[error("Invalid scalar: {0}")]
    InvalidScalar(String),

    /// Serialized bytes or text could not be decoded
    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),

    /// No input tag equals the output tag
    #[error("No input tag matches the output tag")]
    NoMatchingInput,

    /// No acceptable anonymity set was found within the iteration bound
    #[error("Anonymity set selection exhausted after {iterations} iterations")]
    ExhaustedIterations { iterations: usize },

    /// Supplied generators are inconsistent with the proof skeleton
    #[error("Generator mismatch: {0}")]
    GeneratorMismatch(String),

    /// Undefined arithmetic, e.g. inverting zero
    #[error("Arithmetic error: {0}")]
    ArithmeticError(String),

    /// The context was created without the capability this operation needs
    #[error("Context lacks the {0} capability")]
    MissingCapability(&'static str),

    /// Number of candidate inputs is zero or above the protocol maximum
    #[error("Invalid number of inputs: {0}")]
    InvalidInputCount(usize),
}

impl From<hex::FromHexError> for ZkpError {
    fn from(e: hex::FromHexError) -> Self {
        ZkpError::InvalidEncoding(e.to_string())
    }
}
