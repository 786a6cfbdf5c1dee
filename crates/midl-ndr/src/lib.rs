//! NDR (Network Data Representation) runtime library
//!
//! This crate implements the NDR transfer syntax used by DCE RPC stubs.
//!
//! # NDR Wire Format
//!
//! - Primitives align to their natural size (1, 2, 4, or 8 bytes), measured
//!   from the start of the stub buffer
//! - Unique and full pointers write a 4-byte referent ID inline; the pointee
//!   follows in a deferred section after the enclosing top-level parameter
//! - Conformant data carries its element count as a 32-bit prefix
//! - Strings are conformant varying arrays with a null terminator
//! - Unions carry a 32-bit selector ahead of the chosen arm
//!
//! # Example
//!
//! ```
//! use midl_ndr::{decode_from_bytes, encode_to_bytes, ConformantArray};
//!
//! let values: ConformantArray<u32> = ConformantArray::new(vec![1, 2, 3]);
//! let bytes = encode_to_bytes(&values).unwrap();
//! let back: ConformantArray<u32> = decode_from_bytes(bytes).unwrap();
//! assert_eq!(back, values);
//! ```

mod arrays;
mod context;
mod cursor;
mod decode;
mod encode;
mod error;
mod handle;
mod pointers;
mod primitives;
mod strings;
mod unions;

pub use arrays::{Bounds, ConformantArray, ConformantVaryingArray, FixedArray, VaryingArray};
pub use context::{NdrContext, NdrLimits};
pub use cursor::{NdrReader, NdrWriter, FIRST_REFERENT_ID, REFERENT_ID_STEP};
pub use decode::{decode_from_bytes, decode_with, DeferredDecode, NdrDecode};
pub use encode::{encode_to_bytes, encode_with, DeferredEncode, NdrEncode};
pub use error::{NdrError, Result, MAX_NDR_ALLOCATION_SIZE, MAX_NDR_ARRAY_ELEMENTS};
pub use handle::{ContextHandle, CONTEXT_HANDLE_SIZE};
pub use pointers::{FullPtr, NdrPtr, RefPtr, UniquePtr};
pub use primitives::Uuid;
pub use strings::{read_str, read_wstr, write_str, write_wstr, BString, LpWStr, NdrString, NdrWString};
pub use unions::{read_union, unknown_selector, write_union, NdrUnion};

/// Re-export bytes for convenience
pub use bytes::{Buf, BufMut, Bytes, BytesMut};
