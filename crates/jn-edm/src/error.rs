//! Error types for jn-edm.

use thiserror::Error;

/// Errors raised while dispatching factories, decoding records, or
/// assembling events.
#[derive(Error, Debug)]
pub enum EdmError {
    /// Not enough bytes left in the buffer for the requested read.
    #[error("buffer underflow at offset {offset}: need {need} bytes, have {have}")]
    BufferUnderflow {
        /// Byte offset where the read was attempted.
        offset: usize,
        /// Bytes requested.
        need: usize,
        /// Bytes available from the offset.
        have: usize,
    },

    /// Malformed serialized data.
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// No registered factory rule matched a non-primitive type.
    ///
    /// This is a configuration/schema mismatch, not a recoverable
    /// condition: the streamer info names a class the registry cannot
    /// decode.
    #[error("no factory rule matches type '{type_name}' at '{item_path}'")]
    UnhandledType {
        /// Fully-qualified class name that failed dispatch.
        type_name: String,
        /// Item path where the type was encountered.
        item_path: String,
    },

    /// A class name was not present in the streamer info.
    #[error("class '{0}' not found in streamer info")]
    ClassNotFound(String),

    /// A navigator reference row has the wrong number of slots.
    ///
    /// The slot count per row must equal the number of navigation paths;
    /// a mismatch signals a corrupted or mispaired file.
    #[error("reference row has {slots} slots but file declares {paths} navigation paths")]
    SlotCountMismatch {
        /// Slots found in the offending reference row.
        slots: usize,
        /// Navigation paths declared by the file metadata.
        paths: usize,
    },

    /// Sub-table row count does not match the presence-derived group sizes.
    #[error("path '{path}': read {got} rows but presence counts sum to {expected}")]
    GroupSizeMismatch {
        /// Navigation path being assembled.
        path: String,
        /// Expected row count (sum of presence flags over the range).
        expected: usize,
        /// Rows actually read from the sub-table.
        got: usize,
    },

    /// Invalid path filter pattern.
    #[error("invalid filter pattern: {0}")]
    BadFilter(String),

    /// Error from the columnar-array collaborator.
    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
}

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, EdmError>;
