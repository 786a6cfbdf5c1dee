//! Call transports
//!
//! A transport carries one request stub to a server and brings back the
//! response stub. Faults come back as `RpcError::Fault` with the wire code;
//! the caller never sees the server's own error values.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::trace;

use crate::dispatcher::Dispatcher;
use crate::error::{Result, RpcError};
use crate::syntax::SyntaxId;

/// Carries a request stub to a server and returns the response stub
#[async_trait]
pub trait Transport: Send + Sync {
    async fn call(&self, interface: &SyntaxId, opnum: u16, stub_data: Bytes) -> Result<Bytes>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn call(&self, interface: &SyntaxId, opnum: u16, stub_data: Bytes) -> Result<Bytes> {
        (**self).call(interface, opnum, stub_data).await
    }
}

/// In-process transport that hands calls straight to a dispatcher
///
/// Server-side errors are flattened into fault codes exactly as a network
/// transport would report them.
#[derive(Clone)]
pub struct LoopbackTransport {
    dispatcher: Arc<Dispatcher>,
}

impl LoopbackTransport {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }
}

#[async_trait]
impl Transport for LoopbackTransport {
    async fn call(&self, interface: &SyntaxId, opnum: u16, stub_data: Bytes) -> Result<Bytes> {
        trace!(%interface, opnum, stub_len = stub_data.len(), "loopback call");
        match self.dispatcher.dispatch(interface, opnum, stub_data).await {
            Ok(reply) => Ok(reply.stub_data),
            Err(e) => Err(RpcError::Fault(e.fault_status().code())),
        }
    }
}
