//! Context handles
//!
//! A context handle is a 20-byte opaque token: a 32-bit attribute word
//! followed by a UUID. Clients hand it back unchanged; only the issuing
//! server gives it meaning.

use std::fmt;

use crate::{NdrDecode, NdrEncode, NdrError, NdrReader, NdrWriter, Result, Uuid};

/// Size of a context handle on the wire
pub const CONTEXT_HANDLE_SIZE: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ContextHandle {
    attributes: u32,
    uuid: Uuid,
}

impl ContextHandle {
    pub fn new(attributes: u32, uuid: Uuid) -> Self {
        Self { attributes, uuid }
    }

    /// The all-zero handle, meaning "no context"
    pub fn nil() -> Self {
        Self::default()
    }

    pub fn is_nil(&self) -> bool {
        self.attributes == 0 && self.uuid.is_nil()
    }

    pub fn attributes(&self) -> u32 {
        self.attributes
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// Little-endian wire image
    pub fn to_bytes(&self) -> [u8; CONTEXT_HANDLE_SIZE] {
        let mut out = [0u8; CONTEXT_HANDLE_SIZE];
        out[0..4].copy_from_slice(&self.attributes.to_le_bytes());
        out[4..8].copy_from_slice(&self.uuid.data1.to_le_bytes());
        out[8..10].copy_from_slice(&self.uuid.data2.to_le_bytes());
        out[10..12].copy_from_slice(&self.uuid.data3.to_le_bytes());
        out[12..20].copy_from_slice(&self.uuid.data4);
        out
    }

    /// Parse a little-endian wire image
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let raw: &[u8; CONTEXT_HANDLE_SIZE] = bytes.try_into().map_err(|_| NdrError::BufferUnderflow {
            needed: CONTEXT_HANDLE_SIZE,
            have: bytes.len(),
        })?;
        let word = |i: usize| [raw[i], raw[i + 1], raw[i + 2], raw[i + 3]];
        let mut data4 = [0u8; 8];
        data4.copy_from_slice(&raw[12..20]);
        Ok(Self {
            attributes: u32::from_le_bytes(word(0)),
            uuid: Uuid::from_fields(
                u32::from_le_bytes(word(4)),
                u16::from_le_bytes([raw[8], raw[9]]),
                u16::from_le_bytes([raw[10], raw[11]]),
                data4,
            ),
        })
    }
}

impl fmt::Display for ContextHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}:{}", self.attributes, self.uuid)
    }
}

impl NdrEncode for ContextHandle {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        w.write_u32(self.attributes);
        self.uuid.ndr_encode(w)
    }

    fn ndr_align() -> usize {
        4
    }
}

impl NdrDecode for ContextHandle {
    fn ndr_decode<'a>(&'a mut self, r: &mut NdrReader<'a>) -> Result<()> {
        self.attributes = r.read_u32()?;
        self.uuid.ndr_decode(r)
    }

    fn ndr_align() -> usize {
        4
    }

    fn ndr_min_size() -> usize {
        CONTEXT_HANDLE_SIZE
    }
}
