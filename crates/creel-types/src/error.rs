//! Error types for record encoding and decoding.

/// Errors that can occur while encoding or decoding wire records.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The record declares a version this build does not understand.
    #[error("unsupported record version: found {found}, supported <= {supported}")]
    UnsupportedVersion {
        /// Version read from the record.
        found: u16,
        /// Highest version this build accepts.
        supported: u16,
    },

    /// The record's embedded name does not match the key it was read under.
    #[error("record name mismatch: expected '{expected}', found '{found}'")]
    NameMismatch {
        /// Name the record was addressed by.
        expected: String,
        /// Name embedded in the record.
        found: String,
    },

    /// The underlying envelope failed to serialize or deserialize.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<postcard::Error> for CodecError {
    fn from(e: postcard::Error) -> Self {
        CodecError::Serialization(e.to_string())
    }
}
