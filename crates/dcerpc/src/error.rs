//! Error types for DCE RPC

use midl_ndr::NdrError;
use thiserror::Error;

use crate::status::FaultStatus;
use crate::syntax::SyntaxId;

/// Why the dispatcher could not route a request to a handler, or the
/// handler could not read it
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("interface not found: {0}")]
    UnknownInterface(SyntaxId),

    #[error("operation unavailable: {0}")]
    UnknownOpnum(u16),

    #[error("malformed request for opnum {opnum}: {source}")]
    MalformedRequest {
        opnum: u16,
        #[source]
        source: NdrError,
    },
}

impl DispatchError {
    pub fn fault_status(&self) -> FaultStatus {
        match self {
            DispatchError::UnknownInterface(_) => FaultStatus::UnkIf,
            DispatchError::UnknownOpnum(_) => FaultStatus::OpRngError,
            DispatchError::MalformedRequest { .. } => FaultStatus::BadStubData,
        }
    }
}

/// RPC error types
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("NDR error: {0}")]
    Ndr(#[from] NdrError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("operation not implemented")]
    NotImplemented,

    #[error("fault: status 0x{0:08x}")]
    Fault(u32),

    #[error("stub data too large: {size} bytes exceeds maximum {max}")]
    StubTooLarge { size: usize, max: usize },

    #[error("handler failed: {0}")]
    Handler(String),

    #[error("connection closed")]
    ConnectionClosed,

    #[error("timeout")]
    Timeout,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RpcError {
    /// Fault code a server reports to the caller for this error
    pub fn fault_status(&self) -> FaultStatus {
        match self {
            RpcError::Dispatch(e) => e.fault_status(),
            RpcError::NotImplemented => FaultStatus::OpRngError,
            RpcError::Ndr(_) | RpcError::StubTooLarge { .. } => FaultStatus::BadStubData,
            _ => FaultStatus::RpcError,
        }
    }
}

pub type Result<T> = std::result::Result<T, RpcError>;
