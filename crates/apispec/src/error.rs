use thiserror::Error;

/// Errors produced while decoding, building, or emitting a specification.
#[derive(Debug, Error)]
pub enum Error {
    /// No registered dialect's adequacy predicate matched the document.
    #[error("the specification dialect could not be determined")]
    DialectNotRecognized,

    /// An explicitly requested dialect name is not registered.
    #[error("unknown dialect: {0}")]
    UnknownDialect(String),

    /// The requested dialect cannot emit documents.
    #[error("dialect '{0}' does not support document emission")]
    EmissionUnsupported(String),

    /// A reference pointer does not begin from the document root (`#`).
    #[error("reference '{pointer}' must begin from the root (#)")]
    UnanchoredReference { pointer: String },

    /// A reference pointer names a segment that does not exist.
    #[error("invalid reference '{pointer}' found: segment '{segment}' does not exist")]
    DanglingReference { pointer: String, segment: String },

    /// Structural validation failure (missing required field, invalid
    /// enumerated value, cross-field inconsistency).
    #[error("failed to validate specification: {0}")]
    Validation(String),

    /// The text codec does not recognize the content type.
    #[error("unknown content type: {0}")]
    UnknownContentType(String),

    /// The text codec failed to decode the input into a field tree.
    #[error("failed to decode document: {0}")]
    Decode(String),

    /// The text codec failed to encode the emitted field tree.
    #[error("failed to encode document: {0}")]
    Encode(String),
}
