//! Wire cursors
//!
//! `NdrWriter` and `NdrReader` own the stub buffer for one encode or decode
//! pass. Alignment is always measured from the start of that buffer, and
//! each cursor keeps a FIFO queue of pointer bodies whose inline referent
//! has already been handled but whose data belongs to the deferred section
//! that follows the current top-level parameter.

use std::collections::{HashSet, VecDeque};

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tracing::trace;

use crate::{
    DeferredDecode, DeferredEncode, NdrContext, NdrDecode, NdrEncode, NdrError, Result,
};

/// First referent ID handed out for a non-null pointer
pub const FIRST_REFERENT_ID: u32 = 0x0002_0000;

/// Step between consecutive referent IDs
pub const REFERENT_ID_STEP: u32 = 4;

/// Encoding cursor
pub struct NdrWriter<'a> {
    buf: BytesMut,
    ctx: NdrContext,
    next_referent: u32,
    deferred: VecDeque<&'a (dyn DeferredEncode + 'a)>,
}

macro_rules! writer_scalar {
    ($($name:ident: $ty:ty => $put:ident, $align:expr;)*) => {
        $(
            pub fn $name(&mut self, value: $ty) {
                self.align($align);
                self.ctx.$put(&mut self.buf, value);
            }
        )*
    };
}

impl<'a> NdrWriter<'a> {
    /// Writer with a little-endian context
    pub fn new() -> Self {
        Self::with_context(NdrContext::new())
    }

    /// Writer with an explicit context
    pub fn with_context(ctx: NdrContext) -> Self {
        Self {
            buf: BytesMut::new(),
            ctx,
            next_referent: FIRST_REFERENT_ID,
            deferred: VecDeque::new(),
        }
    }

    pub fn context(&self) -> &NdrContext {
        &self.ctx
    }

    /// Bytes written so far
    pub fn position(&self) -> usize {
        self.buf.len()
    }

    /// Zero-pad to the next multiple of `alignment`
    pub fn align(&mut self, alignment: usize) {
        let padding = NdrContext::align_padding(self.buf.len(), alignment);
        self.buf.put_bytes(0, padding);
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.put_slice(bytes);
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.put_u8(value);
    }

    pub fn write_i8(&mut self, value: i8) {
        self.buf.put_i8(value);
    }

    writer_scalar! {
        write_u16: u16 => put_u16, 2;
        write_i16: i16 => put_i16, 2;
        write_u32: u32 => put_u32, 4;
        write_i32: i32 => put_i32, 4;
        write_u64: u64 => put_u64, 8;
        write_i64: i64 => put_i64, 8;
        write_f32: f32 => put_f32, 4;
        write_f64: f64 => put_f64, 8;
    }

    /// Enumerations travel as 16-bit values.
    pub fn write_enum(&mut self, value: u16) {
        self.write_u16(value);
    }

    /// Write a conformance or variance count.
    pub fn write_size(&mut self, count: usize) -> Result<()> {
        let count = u32::try_from(count).map_err(|_| NdrError::CountOverflow(count as u64))?;
        self.write_u32(count);
        Ok(())
    }

    /// Write the referent ID for a pointer and return it; 0 for null.
    pub fn write_referent(&mut self, present: bool) -> u32 {
        let id = if present {
            let id = self.next_referent;
            self.next_referent = self.next_referent.wrapping_add(REFERENT_ID_STEP);
            id
        } else {
            0
        };
        self.write_u32(id);
        id
    }

    /// Pad to `T`'s alignment, then encode it.
    ///
    /// Used for array elements, pointees and embedded structures whose first
    /// member is narrower than their widest one.
    pub fn write_aligned<T: NdrEncode>(&mut self, value: &'a T) -> Result<()> {
        self.align(T::ndr_align());
        value.ndr_encode(self)
    }

    /// Write a pointer's referent and queue its body.
    pub fn write_pointer(&mut self, body: Option<&'a (dyn DeferredEncode + 'a)>) {
        if self.write_referent(body.is_some()) != 0 {
            if let Some(body) = body {
                self.defer(body);
            }
        }
    }

    /// Queue a pointer body for the next flush.
    pub fn defer(&mut self, body: &'a (dyn DeferredEncode + 'a)) {
        self.deferred.push_back(body);
    }

    /// Flush the deferred queue. Bodies queued while flushing are written in
    /// the same pass, after everything queued before them.
    pub fn write_deferred(&mut self) -> Result<()> {
        if !self.deferred.is_empty() {
            trace!(pending = self.deferred.len(), position = self.position(), "writing deferred pointees");
        }
        while let Some(body) = self.deferred.pop_front() {
            body.encode_deferred(self)?;
        }
        Ok(())
    }

    /// Encode a value that does not outlive this call, including its
    /// pointees, at the current position.
    ///
    /// Used for synthesised fill elements.
    pub fn write_detached<T: NdrEncode + ?Sized>(&mut self, value: &T) -> Result<()> {
        let mut scoped = NdrWriter {
            buf: std::mem::take(&mut self.buf),
            ctx: self.ctx,
            next_referent: self.next_referent,
            deferred: VecDeque::new(),
        };
        let result = value
            .ndr_encode(&mut scoped)
            .and_then(|()| scoped.write_deferred());
        self.buf = scoped.buf;
        self.next_referent = scoped.next_referent;
        result
    }

    /// Flush outstanding pointees and return the stub bytes.
    pub fn finish(mut self) -> Result<Bytes> {
        self.write_deferred()?;
        Ok(self.buf.freeze())
    }
}

impl Default for NdrWriter<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// Decoding cursor
pub struct NdrReader<'a> {
    buf: Bytes,
    total: usize,
    ctx: NdrContext,
    referents: HashSet<u32>,
    deferred: VecDeque<&'a mut (dyn DeferredDecode + 'a)>,
}

macro_rules! reader_scalar {
    ($($name:ident: $ty:ty => $get:ident, $size:expr;)*) => {
        $(
            pub fn $name(&mut self) -> Result<$ty> {
                self.align($size)?;
                self.need($size)?;
                Ok(self.ctx.$get(&mut self.buf))
            }
        )*
    };
}

impl<'a> NdrReader<'a> {
    /// Reader with a little-endian context
    pub fn new(bytes: Bytes) -> Self {
        Self::with_context(bytes, NdrContext::new())
    }

    /// Reader with an explicit context
    pub fn with_context(bytes: Bytes, ctx: NdrContext) -> Self {
        Self {
            total: bytes.len(),
            buf: bytes,
            ctx,
            referents: HashSet::new(),
            deferred: VecDeque::new(),
        }
    }

    pub fn context(&self) -> &NdrContext {
        &self.ctx
    }

    /// Bytes consumed so far
    pub fn position(&self) -> usize {
        self.total - self.buf.remaining()
    }

    /// Bytes left to read
    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    fn need(&self, needed: usize) -> Result<()> {
        if self.buf.remaining() < needed {
            return Err(NdrError::BufferUnderflow {
                needed,
                have: self.buf.remaining(),
            });
        }
        Ok(())
    }

    /// Skip the padding a writer inserted to reach `alignment`.
    pub fn align(&mut self, alignment: usize) -> Result<()> {
        let padding = NdrContext::align_padding(self.position(), alignment);
        self.need(padding)?;
        self.buf.advance(padding);
        Ok(())
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<Bytes> {
        self.need(len)?;
        Ok(self.buf.split_to(len))
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.need(1)?;
        Ok(self.buf.get_u8())
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        self.need(1)?;
        Ok(self.buf.get_i8())
    }

    reader_scalar! {
        read_u16: u16 => get_u16, 2;
        read_i16: i16 => get_i16, 2;
        read_u32: u32 => get_u32, 4;
        read_i32: i32 => get_i32, 4;
        read_u64: u64 => get_u64, 8;
        read_i64: i64 => get_i64, 8;
        read_f32: f32 => get_f32, 4;
        read_f64: f64 => get_f64, 8;
    }

    pub fn read_enum(&mut self) -> Result<u16> {
        self.read_u16()
    }

    /// Read a conformance or variance count.
    pub fn read_size(&mut self) -> Result<u32> {
        self.read_u32()
    }

    /// Read a referent ID. Non-null IDs may appear only once per pass.
    pub fn read_referent(&mut self) -> Result<u32> {
        let id = self.read_u32()?;
        if id != 0 && !self.referents.insert(id) {
            return Err(NdrError::DuplicateReferent(id));
        }
        Ok(id)
    }

    /// Skip to `T`'s alignment, then decode into `slot`.
    pub fn read_aligned<T: NdrDecode>(&mut self, slot: &'a mut T) -> Result<()> {
        self.align(T::ndr_align())?;
        slot.ndr_decode(self)
    }

    /// Validate a declared element count before anything is allocated.
    ///
    /// `min_size` is the smallest inline size of one element, taken as at
    /// least one byte; a count the rest of the buffer cannot hold is
    /// rejected outright.
    pub fn check_count(&self, count: u32, min_size: usize) -> Result<usize> {
        let count = count as usize;
        let min_size = min_size.max(1);
        let limits = self.ctx.limits;
        if count > limits.max_array_elements {
            return Err(NdrError::AllocationLimitExceeded {
                requested: count,
                limit: limits.max_array_elements,
            });
        }
        let needed = count.checked_mul(min_size).ok_or(NdrError::IntegerOverflow)?;
        if needed > limits.max_allocation_size {
            return Err(NdrError::AllocationLimitExceeded {
                requested: needed,
                limit: limits.max_allocation_size,
            });
        }
        self.need(needed)?;
        Ok(count)
    }

    /// Queue a pointer slot for the next flush.
    pub fn defer(&mut self, slot: &'a mut (dyn DeferredDecode + 'a)) {
        self.deferred.push_back(slot);
    }

    /// Flush the deferred queue in the order the referents were read.
    pub fn read_deferred(&mut self) -> Result<()> {
        if !self.deferred.is_empty() {
            trace!(pending = self.deferred.len(), position = self.position(), "reading deferred pointees");
        }
        while let Some(slot) = self.deferred.pop_front() {
            slot.decode_deferred(self)?;
        }
        Ok(())
    }

    /// Read outstanding pointees and reject anything but trailing padding.
    pub fn finish(mut self) -> Result<()> {
        self.read_deferred()?;
        let left = self.buf.remaining();
        if left >= 8 {
            return Err(NdrError::TrailingData(left));
        }
        Ok(())
    }
}
