//! Error types for inlet-util.

/// Errors produced by utility functions.
#[derive(Debug, thiserror::Error)]
pub enum UtilError {
    /// An artifact coordinate string is malformed.
    #[error("invalid artifact coordinate \"{coordinate}\": {reason}")]
    InvalidCoordinate { coordinate: String, reason: String },

    /// A version specification cannot be parsed as a version or range.
    #[error("invalid version specification \"{spec}\": {reason}")]
    InvalidVersionSpec { spec: String, reason: String },

    /// A command line contains an unterminated quote.
    #[error("unbalanced quotes in command line: {line}")]
    UnbalancedQuotes { line: String },
}
