//! NDR error types

use thiserror::Error;

/// Upper bound on the element count of any decoded array
pub const MAX_NDR_ARRAY_ELEMENTS: usize = 16 * 1024 * 1024;

/// Upper bound on the byte size of any single decoded allocation
pub const MAX_NDR_ALLOCATION_SIZE: usize = 64 * 1024 * 1024;

/// NDR encoding/decoding errors
#[derive(Debug, Error)]
pub enum NdrError {
    /// Buffer underflow - not enough data
    #[error("buffer underflow: needed {needed} bytes, have {have}")]
    BufferUnderflow { needed: usize, have: usize },

    /// A value's length is outside the bounds its field declares
    #[error("{what} length {len} out of range [{min}, {max}]")]
    OutOfRange {
        what: &'static str,
        len: u64,
        min: u64,
        max: u64,
    },

    /// A transmitted size field is outside the bounds its field declares
    #[error("declared {what} size {declared} out of range [{min}, {max}]")]
    DeclaredSizeOutOfRange {
        what: &'static str,
        declared: u64,
        min: u64,
        max: u64,
    },

    /// A count does not fit the 32-bit wire representation
    #[error("count {0} does not fit in a 32-bit size field")]
    CountOverflow(u64),

    /// Invalid string - bad framing or encoding
    #[error("invalid string: {0}")]
    InvalidString(String),

    /// A non-null referent ID was seen twice in one pass
    #[error("duplicate referent ID 0x{0:08x}")]
    DuplicateReferent(u32),

    /// More values than the declared array size
    #[error("array size mismatch: declared {expected}, got {got}")]
    ArraySizeMismatch { expected: usize, got: usize },

    /// Invalid discriminant for union
    #[error("invalid union discriminant: {0}")]
    InvalidDiscriminant(u32),

    /// Invalid enum value
    #[error("invalid enum value: {0}")]
    InvalidEnumValue(u16),

    /// Conformance mismatch
    #[error("conformance mismatch: max_count={max_count}, actual_count={actual_count}")]
    ConformanceMismatch { max_count: u32, actual_count: u32 },

    /// Decoded size exceeds the configured allocation limit
    #[error("allocation limit exceeded: requested {requested}, limit {limit}")]
    AllocationLimitExceeded { requested: usize, limit: usize },

    /// Size arithmetic overflowed
    #[error("integer overflow in size computation")]
    IntegerOverflow,

    /// Bytes left over after a complete decode
    #[error("{0} trailing bytes after decode")]
    TrailingData(usize),

    /// UTF-8 decoding error
    #[error("UTF-8 error: {0}")]
    Utf8Error(#[from] std::string::FromUtf8Error),

    /// UTF-16 decoding error
    #[error("UTF-16 error: {0}")]
    Utf16Error(#[from] std::char::DecodeUtf16Error),
}

impl NdrError {
    /// A value violated a declared constraint before anything was written.
    pub fn is_encode_constraint(&self) -> bool {
        matches!(
            self,
            NdrError::OutOfRange { .. }
                | NdrError::CountOverflow(_)
                | NdrError::ArraySizeMismatch { .. }
        )
    }

    /// The input bytes could not be framed into a value.
    pub fn is_framing(&self) -> bool {
        !self.is_encode_constraint()
    }
}

/// Result type for NDR operations
pub type Result<T> = std::result::Result<T, NdrError>;
