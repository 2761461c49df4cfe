use thiserror::Error;

#[derive(Debug, Error)]
/// Errors produced by storage and clipboard operations.
pub enum StoreError {
    #[error("I/O error: {0}")]
    /// Filesystem I/O failed.
    Io(#[from] std::io::Error),

    #[error("storage quota exceeded: {needed} bytes needed, {available} available")]
    /// The backend refused the write for lack of space.
    QuotaExceeded {
        /// Bytes the write would occupy.
        needed: usize,
        /// Bytes still free.
        available: usize,
    },

    #[error("JSON error: {0}")]
    /// Serializing or parsing JSON failed.
    Json(#[from] serde_json::Error),

    #[error("payload is not a JSON array")]
    /// An import payload parsed but was not an array.
    NotAnArray,

    #[error("malformed highlight at index {index}: {message}")]
    /// An array element did not have the shape of a highlight.
    Malformed {
        /// Position of the bad element.
        index: usize,
        /// Parser message.
        message: String,
    },

    #[error("clipboard error: {0}")]
    /// The clipboard backend failed.
    Clipboard(String),
}
