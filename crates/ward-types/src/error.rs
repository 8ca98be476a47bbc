//! Error type for record-line parsing.

/// A `patient_data_line` (or one of its fields) could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The line has fewer than the four space-separated fields.
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// The id field is not a decimal integer.
    #[error("invalid patient id: {0:?}")]
    InvalidId(String),

    /// The cured field is neither `True` nor `False`.
    #[error("invalid cured flag: {0:?}")]
    InvalidCured(String),

    /// The disease field is not wrapped in `[` `]`, or holds an empty element.
    #[error("invalid disease list: {0:?}")]
    InvalidDiseases(String),

    /// A `%` is not followed by one of the escapes written by the encoder.
    #[error("invalid escape sequence in {0:?}")]
    InvalidEscape(String),

    /// A fingerprint is not 64 hex characters.
    #[error("invalid fingerprint: {0:?}")]
    InvalidFingerprint(String),
}
