//! DCE RPC operation envelopes and dispatch
//!
//! This crate sits on top of `midl-ndr`: it pairs opnums with typed request
//! and response shapes, routes encoded calls to handlers, and maps routing
//! and decoding failures onto DCE RPC fault codes.
//!
//! # Features
//!
//! - Typed operations with a 32-bit outcome code carried in every response
//! - Interface registry keyed by UUID and version
//! - Distinct faults for unknown interfaces, unknown opnums and malformed
//!   stub data
//! - Context handle table for server-side sessions
//! - Client over an abstract transport, with an in-process loopback
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use dcerpc::{Dispatcher, InterfaceBuilder, LoopbackTransport, Operation, RpcClient, Status};
//!
//! struct GetVersion;
//!
//! impl Operation for GetVersion {
//!     const OPNUM: u16 = 0;
//!     const NAME: &'static str = "/Info/v1.0/GetVersion";
//!     type Request = u32;
//!     type Response = Status;
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let interface = InterfaceBuilder::new("12345678-1234-1234-1234-123456789012", 1, 0)
//!         .unwrap()
//!         .operation::<GetVersion, _, _>(|level: u32| async move {
//!             Ok(if level == 1 { Status::SUCCESS } else { Status::ERROR_INVALID_PARAMETER })
//!         })
//!         .build();
//!     let syntax = interface.syntax;
//!
//!     let dispatcher = Arc::new(Dispatcher::new());
//!     dispatcher.register_interface(interface).await;
//!
//!     let client = RpcClient::new(LoopbackTransport::new(dispatcher), syntax);
//!     let reply = client.invoke::<GetVersion>(&2).await.unwrap();
//!     assert_eq!(reply.status, Status::ERROR_INVALID_PARAMETER);
//! }
//! ```

pub mod client;
pub mod dispatcher;
pub mod error;
pub mod handles;
pub mod operation;
pub mod status;
pub mod syntax;
pub mod transport;

#[cfg(test)]
mod testing;

pub use client::{ClientConfig, RpcClient};
pub use dispatcher::{
    DispatchReply, Dispatcher, DispatcherConfig, DispatcherStats, DispatcherStatsSnapshot,
    Interface, InterfaceBuilder, OperationHandler, DEFAULT_MAX_STUB_SIZE,
};
pub use error::{DispatchError, Result, RpcError};
pub use handles::ContextHandleTable;
pub use operation::{ApplicationError, Operation, Outcome, Reply};
pub use status::{FaultStatus, Status};
pub use syntax::{SyntaxId, Uuid, NDR_SYNTAX_UUID, NDR_SYNTAX_VERSION};
pub use transport::{LoopbackTransport, Transport};

pub use midl_ndr::ContextHandle;
