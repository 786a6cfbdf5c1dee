//! NDR primitive type implementations
//!
//! | MIDL Type      | Rust Type | Size | Alignment |
//! |----------------|-----------|------|-----------|
//! | boolean        | bool      | 1    | 1         |
//! | byte/char      | u8        | 1    | 1         |
//! | small          | i8        | 1    | 1         |
//! | short          | i16       | 2    | 2         |
//! | long/int       | i32       | 4    | 4         |
//! | hyper          | i64       | 8    | 8         |
//! | unsigned short | u16       | 2    | 2         |
//! | unsigned long  | u32       | 4    | 4         |
//! | unsigned hyper | u64       | 8    | 8         |
//! | float          | f32       | 4    | 4         |
//! | double         | f64       | 8    | 8         |
//! | enum           | `ndr_enum!` | 2  | 2         |
//! | GUID           | Uuid      | 16   | 4         |

use std::fmt;

use crate::{NdrDecode, NdrEncode, NdrReader, NdrWriter, Result};

macro_rules! impl_ndr_primitive {
    ($($ty:ty: $size:expr, $write:ident, $read:ident;)*) => {
        $(
            impl NdrEncode for $ty {
                fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
                    w.$write(*self);
                    Ok(())
                }

                fn ndr_align() -> usize {
                    $size
                }
            }

            impl NdrDecode for $ty {
                fn ndr_decode<'a>(&'a mut self, r: &mut NdrReader<'a>) -> Result<()> {
                    *self = r.$read()?;
                    Ok(())
                }

                fn ndr_align() -> usize {
                    $size
                }

                fn ndr_min_size() -> usize {
                    $size
                }
            }
        )*
    };
}

impl_ndr_primitive! {
    u8: 1, write_u8, read_u8;
    i8: 1, write_i8, read_i8;
    u16: 2, write_u16, read_u16;
    i16: 2, write_i16, read_i16;
    u32: 4, write_u32, read_u32;
    i32: 4, write_i32, read_i32;
    u64: 8, write_u64, read_u64;
    i64: 8, write_i64, read_i64;
    f32: 4, write_f32, read_f32;
    f64: 8, write_f64, read_f64;
}

/// NDR boolean - encoded as a single byte (0x00 = false, 0x01 = true)
impl NdrEncode for bool {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        w.write_u8(u8::from(*self));
        Ok(())
    }
}

impl NdrDecode for bool {
    fn ndr_decode<'a>(&'a mut self, r: &mut NdrReader<'a>) -> Result<()> {
        *self = r.read_u8()? != 0;
        Ok(())
    }

    fn ndr_min_size() -> usize {
        1
    }
}

/// Declare a closed enumeration carried as a 16-bit NDR enum.
///
/// The first variant is the `Default`. Decoding a value outside the listed
/// variants fails with `NdrError::InvalidEnumValue`.
///
/// ```
/// midl_ndr::ndr_enum! {
///     pub enum RecordKind {
///         File = 1,
///         Directory = 2,
///     }
/// }
/// assert_eq!(RecordKind::default(), RecordKind::File);
/// ```
#[macro_export]
macro_rules! ndr_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident = $value:expr),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u16)]
        $vis enum $name {
            $($(#[$vmeta])* $variant = $value),+
        }

        impl $name {
            /// Every variant, in declaration order
            pub const VARIANTS: &'static [$name] = &[$($name::$variant),+];
        }

        impl ::core::default::Default for $name {
            fn default() -> Self {
                Self::VARIANTS[0]
            }
        }

        impl ::core::convert::TryFrom<u16> for $name {
            type Error = $crate::NdrError;

            fn try_from(value: u16) -> $crate::Result<Self> {
                Self::VARIANTS
                    .iter()
                    .copied()
                    .find(|v| *v as u16 == value)
                    .ok_or($crate::NdrError::InvalidEnumValue(value))
            }
        }

        impl $crate::NdrEncode for $name {
            fn ndr_encode<'a>(&'a self, w: &mut $crate::NdrWriter<'a>) -> $crate::Result<()> {
                w.write_enum(*self as u16);
                Ok(())
            }

            fn ndr_align() -> usize {
                2
            }
        }

        impl $crate::NdrDecode for $name {
            fn ndr_decode<'a>(&'a mut self, r: &mut $crate::NdrReader<'a>) -> $crate::Result<()> {
                *self = <$name as ::core::convert::TryFrom<u16>>::try_from(r.read_enum()?)?;
                Ok(())
            }

            fn ndr_align() -> usize {
                2
            }

            fn ndr_min_size() -> usize {
                2
            }
        }
    };
}

/// GUID/UUID type for NDR encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Uuid {
    pub data1: u32,
    pub data2: u16,
    pub data3: u16,
    pub data4: [u8; 8],
}

impl Uuid {
    /// Nil UUID
    pub const NIL: Self = Self::from_fields(0, 0, 0, [0; 8]);

    pub const fn from_fields(data1: u32, data2: u16, data3: u16, data4: [u8; 8]) -> Self {
        Self {
            data1,
            data2,
            data3,
            data4,
        }
    }

    pub fn is_nil(&self) -> bool {
        *self == Self::NIL
    }

    /// Parse from string "xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx"
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let parts: Vec<&str> = s.split('-').collect();
        let [d1, d2, d3, clock, node] = parts.as_slice() else {
            return None;
        };
        if d1.len() != 8 || d2.len() != 4 || d3.len() != 4 || clock.len() != 4 || node.len() != 12 {
            return None;
        }
        if !parts.iter().all(|p| p.bytes().all(|b| b.is_ascii_hexdigit())) {
            return None;
        }

        let clock = u16::from_str_radix(clock, 16).ok()?;
        let mut data4 = [0u8; 8];
        data4[..2].copy_from_slice(&clock.to_be_bytes());
        for (i, byte) in data4[2..].iter_mut().enumerate() {
            *byte = u8::from_str_radix(node.get(i * 2..i * 2 + 2)?, 16).ok()?;
        }

        Some(Self {
            data1: u32::from_str_radix(d1, 16).ok()?,
            data2: u16::from_str_radix(d2, 16).ok()?,
            data3: u16::from_str_radix(d3, 16).ok()?,
            data4,
        })
    }
}

impl fmt::Display for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}-{:04x}-{:04x}-", self.data1, self.data2, self.data3)?;
        for (i, byte) in self.data4.iter().enumerate() {
            if i == 2 {
                f.write_str("-")?;
            }
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl NdrEncode for Uuid {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        w.write_u32(self.data1);
        w.write_u16(self.data2);
        w.write_u16(self.data3);
        w.write_bytes(&self.data4);
        Ok(())
    }

    fn ndr_align() -> usize {
        4
    }
}

impl NdrDecode for Uuid {
    fn ndr_decode<'a>(&'a mut self, r: &mut NdrReader<'a>) -> Result<()> {
        self.data1 = r.read_u32()?;
        self.data2 = r.read_u16()?;
        self.data3 = r.read_u16()?;
        self.data4.copy_from_slice(&r.read_bytes(8)?);
        Ok(())
    }

    fn ndr_align() -> usize {
        4
    }

    fn ndr_min_size() -> usize {
        16
    }
}
