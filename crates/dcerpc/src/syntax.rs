//! Interface identification

use std::fmt;

pub use midl_ndr::Uuid;

/// NDR Transfer Syntax UUID
pub const NDR_SYNTAX_UUID: &str = "8a885d04-1ceb-11c9-9fe8-08002b104860";
pub const NDR_SYNTAX_VERSION: u32 = 2;

/// Interface UUID plus version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SyntaxId {
    pub uuid: Uuid,
    pub version: u32, // major in lower 16 bits, minor in upper 16 bits
}

impl SyntaxId {
    pub fn new(uuid: Uuid, major: u16, minor: u16) -> Self {
        Self {
            uuid,
            version: (major as u32) | ((minor as u32) << 16),
        }
    }

    /// Build from a UUID string; `None` if the string is malformed.
    pub fn parse(uuid: &str, major: u16, minor: u16) -> Option<Self> {
        Uuid::parse(uuid).map(|uuid| Self::new(uuid, major, minor))
    }

    pub fn major_version(&self) -> u16 {
        self.version as u16
    }

    pub fn minor_version(&self) -> u16 {
        (self.version >> 16) as u16
    }

    /// Whether a server offering `self` can serve a caller asking for
    /// `requested`: same UUID and major version, and a minor version at
    /// least as new.
    pub fn accepts(&self, requested: &SyntaxId) -> bool {
        self.uuid == requested.uuid
            && self.major_version() == requested.major_version()
            && self.minor_version() >= requested.minor_version()
    }
}

impl fmt::Display for SyntaxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} v{}.{}", self.uuid, self.major_version(), self.minor_version())
    }
}
