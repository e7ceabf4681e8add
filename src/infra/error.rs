//! Error types for exchange set checking operations.

use thiserror::Error;

/// Result type for checking operations
pub type CheckResult<T> = Result<T, CheckError>;

/// Error types for exchange set checking
#[derive(Error, Debug, miette::Diagnostic)]
pub enum CheckError {
    #[error("trust anchor error: {0}")]
    TrustAnchor(String),

    #[error("container error: {0}")]
    Container(String),

    #[error("no entry {0} in exchange set")]
    NotFound(String),

    #[error("not an S-63 exchange set: {0}")]
    Structure(String),

    #[error("signature format error: {0}")]
    Format(String),

    #[error("signature manifest error: {0}")]
    Manifest(String),

    #[error("cryptographic error: {0}")]
    Crypto(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl From<std::io::Error> for CheckError {
    fn from(error: std::io::Error) -> Self {
        CheckError::Io(error.to_string())
    }
}

impl From<zip::result::ZipError> for CheckError {
    fn from(error: zip::result::ZipError) -> Self {
        CheckError::Container(error.to_string())
    }
}

impl From<roxmltree::Error> for CheckError {
    fn from(error: roxmltree::Error) -> Self {
        CheckError::Manifest(error.to_string())
    }
}
