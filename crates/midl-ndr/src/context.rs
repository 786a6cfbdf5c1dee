//! NDR encoding/decoding context
//!
//! The context carries the negotiated byte order and the decode limits that
//! protect a reader from hostile size fields. Both ends of a call must use
//! the same byte order; the limits only matter to the decoding side.

use bytes::{Buf, BufMut};

use crate::error::{MAX_NDR_ALLOCATION_SIZE, MAX_NDR_ARRAY_ELEMENTS};

/// Caps applied to every size field a reader accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NdrLimits {
    /// Largest element count accepted for one array or string
    pub max_array_elements: usize,
    /// Largest byte allocation made for one decoded value
    pub max_allocation_size: usize,
}

impl NdrLimits {
    /// Limits with custom caps
    pub fn new(max_array_elements: usize, max_allocation_size: usize) -> Self {
        Self {
            max_array_elements,
            max_allocation_size,
        }
    }
}

impl Default for NdrLimits {
    fn default() -> Self {
        Self::new(MAX_NDR_ARRAY_ELEMENTS, MAX_NDR_ALLOCATION_SIZE)
    }
}

/// NDR encoding/decoding context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NdrContext {
    /// Whether to use little-endian byte order
    pub little_endian: bool,
    /// Decode limits
    pub limits: NdrLimits,
}

macro_rules! ctx_scalar {
    ($($put:ident / $get:ident: $ty:ty => $put_le:ident, $put_be:ident, $get_le:ident, $get_be:ident;)*) => {
        $(
            #[inline]
            pub fn $put<B: BufMut>(&self, buf: &mut B, value: $ty) {
                if self.little_endian {
                    buf.$put_le(value);
                } else {
                    buf.$put_be(value);
                }
            }

            #[inline]
            pub fn $get<B: Buf>(&self, buf: &mut B) -> $ty {
                if self.little_endian {
                    buf.$get_le()
                } else {
                    buf.$get_be()
                }
            }
        )*
    };
}

impl NdrContext {
    /// Little-endian context with default limits
    pub fn new() -> Self {
        Self {
            little_endian: true,
            limits: NdrLimits::default(),
        }
    }

    /// Big-endian context with default limits
    pub fn big_endian() -> Self {
        Self::with_byte_order(false)
    }

    /// Context with specified byte order
    pub fn with_byte_order(little_endian: bool) -> Self {
        Self {
            little_endian,
            ..Self::new()
        }
    }

    /// Replace the decode limits
    pub fn with_limits(mut self, limits: NdrLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Calculate padding needed to align to the given boundary
    #[inline]
    pub fn align_padding(position: usize, alignment: usize) -> usize {
        if alignment <= 1 {
            return 0;
        }
        match position % alignment {
            0 => 0,
            rem => alignment - rem,
        }
    }

    ctx_scalar! {
        put_u16 / get_u16: u16 => put_u16_le, put_u16, get_u16_le, get_u16;
        put_i16 / get_i16: i16 => put_i16_le, put_i16, get_i16_le, get_i16;
        put_u32 / get_u32: u32 => put_u32_le, put_u32, get_u32_le, get_u32;
        put_i32 / get_i32: i32 => put_i32_le, put_i32, get_i32_le, get_i32;
        put_u64 / get_u64: u64 => put_u64_le, put_u64, get_u64_le, get_u64;
        put_i64 / get_i64: i64 => put_i64_le, put_i64, get_i64_le, get_i64;
        put_f32 / get_f32: f32 => put_f32_le, put_f32, get_f32_le, get_f32;
        put_f64 / get_f64: f64 => put_f64_le, put_f64, get_f64_le, get_f64;
    }
}

impl Default for NdrContext {
    fn default() -> Self {
        Self::new()
    }
}
