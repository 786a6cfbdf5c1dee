//! NDR encoding traits

use bytes::Bytes;

use crate::{NdrContext, NdrWriter, Result};

/// Trait for types that can be encoded to NDR format
///
/// The lifetime ties the value to the writer so pointer fields can queue a
/// borrow of their pointee instead of copying it.
pub trait NdrEncode {
    /// Write the inline part of this value; pointees go on the writer's
    /// deferred queue.
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()>;

    /// Get the NDR alignment requirement for this type
    fn ndr_align() -> usize
    where
        Self: Sized,
    {
        1
    }
}

/// Body of a pointer, written when the writer flushes its deferred queue
pub trait DeferredEncode {
    /// Write the pointee itself.
    fn encode_deferred<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()>;
}

impl<T: NdrEncode + ?Sized> NdrEncode for &T {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        (**self).ndr_encode(w)
    }
}

/// Encode one value with a little-endian context and default limits.
pub fn encode_to_bytes<T: NdrEncode + ?Sized>(value: &T) -> Result<Bytes> {
    encode_with(value, NdrContext::new())
}

/// Encode one value, flushing every deferred pointee before returning.
pub fn encode_with<T: NdrEncode + ?Sized>(value: &T, ctx: NdrContext) -> Result<Bytes> {
    let mut w = NdrWriter::with_context(ctx);
    value.ndr_encode(&mut w)?;
    w.finish()
}
