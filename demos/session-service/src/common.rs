//! Common definitions shared between client and server

// =============================================================================
// Interface identity
// =============================================================================

use dcerpc::{SyntaxId, Uuid};

/// Interface UUID for the session store: 3c4728c5-f0ab-448b-bda1-6ce01eb0a6d5
pub const STORE_INTERFACE_UUID: Uuid = Uuid::from_fields(
    0x3c4728c5,
    0xf0ab,
    0x448b,
    [0xbd, 0xa1, 0x6c, 0xe0, 0x1e, 0xb0, 0xa6, 0xd5],
);
pub const STORE_INTERFACE_VERSION: (u16, u16) = (1, 0);

pub fn store_syntax() -> SyntaxId {
    let (major, minor) = STORE_INTERFACE_VERSION;
    SyntaxId::new(STORE_INTERFACE_UUID, major, minor)
}

/// Operation numbers
pub mod opnum {
    pub const OPEN_STORE: u16 = 0;
    pub const SET_VALUE: u16 = 1;
    pub const QUERY_VALUE: u16 = 2;
    pub const ENUM_VALUES: u16 = 3;
    pub const DELETE_VALUE: u16 = 4;
    pub const CLOSE_STORE: u16 = 5;
    pub const FLUSH_STORE: u16 = 6;
}

// =============================================================================
// Access rights and limits
// =============================================================================

pub const ACCESS_READ: u32 = 0x0001;
pub const ACCESS_WRITE: u32 = 0x0002;
pub const ACCESS_ALL: u32 = ACCESS_READ | ACCESS_WRITE;

/// Longest store or value name, in characters
pub const MAX_NAME_LEN: u32 = 256;

/// Largest value payload, in bytes
pub const MAX_VALUE_SIZE: u32 = 65536;

/// Enumeration detail levels
pub const INFO_LEVEL_BASIC: u32 = 1;
pub const INFO_LEVEL_FULL: u32 = 2;
