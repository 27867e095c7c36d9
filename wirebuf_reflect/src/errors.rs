use thiserror::Error;
use wirebuf_gen::codegen::shared::layout::{LayoutError, Scalar};

/// Result alias used across the reflection crate.
pub type ReflectResult<T> = Result<T, ReflectError>;

/// Errors produced while interpreting a wire layout.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ReflectError {
    /// Classifying the schema into wire layouts failed.
    #[error("failed to build wire layout: {0}")]
    Layout(#[from] LayoutError),

    /// Requested struct is not part of the schema.
    #[error("type '{type_name}' not found in schema")]
    UnknownType { type_name: String },

    /// A value does not have the shape its layout requires.
    #[error("'{path}': expected {expected}, found {found}")]
    TypeMismatch {
        path: String,
        expected: String,
        found: String,
    },

    /// A number does not fit the wire scalar of its field.
    #[error("'{path}': {value} does not fit in {scalar:?}")]
    OutOfRange {
        path: String,
        scalar: Scalar,
        value: String,
    },

    /// A fixed-length array or byte block has the wrong number of elements.
    #[error("'{path}': expected exactly {expected} elements, found {found}")]
    LengthMismatch {
        path: String,
        expected: u64,
        found: usize,
    },

    /// A container is too large for its u32 length prefix.
    #[error("'{path}': {count} elements exceed the length prefix range")]
    CountOverflow { path: String, count: usize },

    /// A count of zero-width elements above the decoder's limit.
    #[error("'{path}': count {count} exceeds the limit of {limit} zero-width elements")]
    CountLimit { path: String, count: usize, limit: u64 },

    #[error("'{path}': struct value is missing field '{field}'")]
    MissingField { path: String, field: String },

    #[error("'{path}': struct value has unknown field '{field}'")]
    UnknownField { path: String, field: String },

    /// A read or write ran past the end of the buffer.
    #[error("'{path}': {need} bytes at offset {offset} exceed buffer of {len} bytes")]
    OutOfBounds {
        path: String,
        offset: usize,
        need: usize,
        len: usize,
    },

    #[error("'{path}': invalid UTF-8 in string at offset {offset}")]
    InvalidUtf8 { path: String, offset: usize },

    /// Decoding stopped before the end of the input.
    #[error("type '{type_name}' consumed {consumed} of {len} bytes")]
    TrailingBytes {
        type_name: String,
        consumed: usize,
        len: usize,
    },

    /// Embedded structs nest deeper than the interpreter follows.
    #[error("'{path}': struct nesting exceeds {limit} levels")]
    DepthExceeded { path: String, limit: usize },
}
