//! Outcome and fault codes

use std::fmt;

use midl_ndr::{NdrDecode, NdrEncode, NdrReader, NdrWriter};

/// 32-bit outcome code returned by every operation; zero is success
///
/// Any nonzero value is a failure. Callers compare against the specific
/// codes an operation documents (for example `ERROR_INSUFFICIENT_BUFFER`
/// with a "needed size" companion field) and otherwise treat all failures
/// alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Status(pub u32);

impl Status {
    pub const SUCCESS: Status = Status(0);
    pub const ERROR_ACCESS_DENIED: Status = Status(5);
    pub const ERROR_INVALID_HANDLE: Status = Status(6);
    pub const ERROR_NOT_ENOUGH_MEMORY: Status = Status(8);
    pub const ERROR_INVALID_PARAMETER: Status = Status(87);
    pub const ERROR_INSUFFICIENT_BUFFER: Status = Status(122);
    pub const ERROR_MORE_DATA: Status = Status(234);
    pub const ERROR_NO_MORE_ITEMS: Status = Status(259);
    pub const ERROR_NOT_FOUND: Status = Status(1168);

    pub fn is_success(self) -> bool {
        self.0 == 0
    }

    pub fn code(self) -> u32 {
        self.0
    }
}

impl From<u32> for Status {
    fn from(code: u32) -> Self {
        Status(code)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

impl NdrEncode for Status {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> midl_ndr::Result<()> {
        w.write_u32(self.0);
        Ok(())
    }

    fn ndr_align() -> usize {
        4
    }
}

impl NdrDecode for Status {
    fn ndr_decode<'a>(&'a mut self, r: &mut NdrReader<'a>) -> midl_ndr::Result<()> {
        self.0 = r.read_u32()?;
        Ok(())
    }

    fn ndr_align() -> usize {
        4
    }

    fn ndr_min_size() -> usize {
        4
    }
}

/// Fault status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum FaultStatus {
    /// No error
    None = 0,
    /// Access denied
    AccessDenied = 0x00000005,
    /// Stub data could not be unmarshalled (rpc_x_bad_stub_data)
    BadStubData = 0x000006f7,
    /// General RPC error
    RpcError = 0x1c000000,
    /// Protocol version not supported
    NdrVersion = 0x1c000008,
    /// Context mismatch
    ContextMismatch = 0x1c00001a,
    /// Operation number out of range
    OpRngError = 0x1c010002,
    /// Unknown interface
    UnkIf = 0x1c010003,
}

impl FaultStatus {
    pub fn code(self) -> u32 {
        self as u32
    }

    pub fn from_code(code: u32) -> Option<Self> {
        [
            FaultStatus::None,
            FaultStatus::AccessDenied,
            FaultStatus::BadStubData,
            FaultStatus::RpcError,
            FaultStatus::NdrVersion,
            FaultStatus::ContextMismatch,
            FaultStatus::OpRngError,
            FaultStatus::UnkIf,
        ]
        .into_iter()
        .find(|f| f.code() == code)
    }
}
