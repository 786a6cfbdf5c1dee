//! NDR decoding traits

use bytes::Bytes;

use crate::{NdrContext, NdrReader, Result};

/// Trait for types that can be decoded from NDR format
///
/// Decoding fills a default-initialised value in place. A pointer field
/// reads its referent ID, then registers itself with the reader so its body
/// can be read once the reader reaches the deferred section.
pub trait NdrDecode: Default {
    /// Read the inline part of this value into `self`.
    fn ndr_decode<'a>(&'a mut self, r: &mut NdrReader<'a>) -> Result<()>;

    /// Get the NDR alignment requirement for this type
    ///
    /// Must agree with the type's `NdrEncode::ndr_align`.
    fn ndr_align() -> usize {
        1
    }

    /// Smallest number of bytes one inline instance occupies on the wire.
    ///
    /// Used to reject declared counts the remaining buffer cannot hold.
    /// Aggregates override it with the sum of their members' sizes.
    fn ndr_min_size() -> usize {
        0
    }
}

/// Body of a pointer, read when the reader flushes its deferred queue
pub trait DeferredDecode {
    /// Allocate and read the pointee.
    fn decode_deferred<'a>(&'a mut self, r: &mut NdrReader<'a>) -> Result<()>;
}

/// Decode one value with a little-endian context and default limits.
pub fn decode_from_bytes<T: NdrDecode>(bytes: Bytes) -> Result<T> {
    decode_with(bytes, NdrContext::new())
}

/// Decode one value, reading every deferred pointee and rejecting trailing
/// data.
pub fn decode_with<T: NdrDecode>(bytes: Bytes, ctx: NdrContext) -> Result<T> {
    let mut value = T::default();
    let mut r = NdrReader::with_context(bytes, ctx);
    value.ndr_decode(&mut r)?;
    r.finish()?;
    Ok(value)
}
