//! DCE RPC Client
//!
//! Typed calls over any `Transport`: encode the request, carry it, decode
//! the response and surface its outcome code.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use bytes::Bytes;
use midl_ndr::{decode_with, encode_with, NdrContext, NdrLimits};
use tracing::{debug, trace};

use crate::error::{Result, RpcError};
use crate::operation::{Operation, Outcome, Reply};
use crate::syntax::SyntaxId;
use crate::transport::Transport;

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Per-call deadline; `None` waits forever
    pub call_timeout: Option<Duration>,
    pub little_endian: bool,
    /// Decode limits applied to responses
    pub limits: NdrLimits,
}

impl ClientConfig {
    pub fn ndr_context(&self) -> NdrContext {
        NdrContext::with_byte_order(self.little_endian).with_limits(self.limits)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            call_timeout: Some(Duration::from_secs(30)),
            little_endian: true,
            limits: NdrLimits::default(),
        }
    }
}

/// Client bound to one interface version
pub struct RpcClient<T> {
    transport: T,
    interface: SyntaxId,
    config: ClientConfig,
    call_id_counter: AtomicU32,
}

impl<T: Transport> RpcClient<T> {
    pub fn new(transport: T, interface: SyntaxId) -> Self {
        Self::with_config(transport, interface, ClientConfig::default())
    }

    pub fn with_config(transport: T, interface: SyntaxId, config: ClientConfig) -> Self {
        Self {
            transport,
            interface,
            config,
            call_id_counter: AtomicU32::new(1),
        }
    }

    pub fn interface(&self) -> &SyntaxId {
        &self.interface
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Make an RPC call with pre-encoded stub data
    pub async fn invoke_raw(&self, opnum: u16, stub_data: Bytes) -> Result<Bytes> {
        let call_id = self.call_id_counter.fetch_add(1, Ordering::SeqCst);
        trace!(
            "Sending request: call_id={}, opnum={}, stub_len={}",
            call_id,
            opnum,
            stub_data.len()
        );

        let call = self.transport.call(&self.interface, opnum, stub_data);
        let response = match self.config.call_timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| RpcError::Timeout)??,
            None => call.await?,
        };

        trace!("Received response: call_id={}, stub_len={}", call_id, response.len());
        Ok(response)
    }

    /// Invoke a typed operation
    ///
    /// Transport failures and faults are `Err`. A nonzero outcome code is
    /// not: it comes back in the `Reply` alongside the decoded response.
    pub async fn invoke<O: Operation>(&self, request: &O::Request) -> Result<Reply<O::Response>> {
        let ctx = self.config.ndr_context();
        let stub_data = encode_with(request, ctx)?;
        let response = self.invoke_raw(O::OPNUM, stub_data).await?;
        let response: O::Response = decode_with(response, ctx)?;

        let status = response.status();
        if !status.is_success() {
            debug!(operation = O::NAME, %status, "operation returned failure");
        }
        Ok(Reply::named(O::NAME, response))
    }
}
