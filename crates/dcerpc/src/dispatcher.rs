//! DCE RPC request dispatcher
//!
//! Routes one call (interface, opnum, stub bytes) to the registered handler
//! and returns the encoded response with its outcome code. Transports sit
//! in front of this and turn `Err` results into fault PDUs using
//! `RpcError::fault_status`.
//!
//! - Interfaces are keyed by UUID and major version; the registered minor
//!   version must be at least the caller's
//! - Handlers are cloned out of the registry and the lock is released before
//!   they run
//! - Each call decodes and encodes with its own cursors; nothing is shared
//!   between calls except the registry and the statistics counters

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use futures::future::{BoxFuture, FutureExt};
use midl_ndr::{decode_with, encode_with, NdrContext, NdrLimits};
use tokio::sync::RwLock;
use tracing::{debug, info, trace, warn};

use crate::error::{DispatchError, Result, RpcError};
use crate::operation::{Operation, Outcome};
use crate::status::Status;
use crate::syntax::{SyntaxId, Uuid};

/// Default upper bound on one request's stub data
pub const DEFAULT_MAX_STUB_SIZE: usize = 4 * 1024 * 1024;

/// Encoded response and the outcome code it carries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReply {
    pub status: Status,
    pub stub_data: Bytes,
}

/// Operation handler function type
pub type OperationHandler =
    Arc<dyn Fn(Bytes, NdrContext) -> BoxFuture<'static, Result<DispatchReply>> + Send + Sync>;

#[derive(Clone)]
struct OperationEntry {
    name: &'static str,
    handler: OperationHandler,
}

/// Interface definition - contains operations for a specific interface version
pub struct Interface {
    pub syntax: SyntaxId,
    operations: HashMap<u16, OperationEntry>,
}

impl Interface {
    pub fn new(uuid: Uuid, major_version: u16, minor_version: u16) -> Self {
        Self::from_syntax(SyntaxId::new(uuid, major_version, minor_version))
    }

    pub fn from_syntax(syntax: SyntaxId) -> Self {
        Self {
            syntax,
            operations: HashMap::new(),
        }
    }

    /// Register a typed operation. The handler sees a decoded request and
    /// returns the response; the outcome code is read off the response.
    pub fn register_operation<O, F, Fut>(&mut self, handler: F)
    where
        O: Operation,
        F: Fn(O::Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O::Response>> + Send + 'static,
    {
        let handler = Arc::new(handler);
        let erased: OperationHandler = Arc::new(move |stub_data: Bytes, ctx: NdrContext| {
            let handler = Arc::clone(&handler);
            async move {
                let request: O::Request = decode_with(stub_data, ctx).map_err(|source| {
                    DispatchError::MalformedRequest {
                        opnum: O::OPNUM,
                        source,
                    }
                })?;
                trace!(operation = O::NAME, "request decoded");

                let response = handler(request).await?;
                let status = response.status();
                let stub_data = encode_with(&response, ctx)?;
                Ok(DispatchReply { status, stub_data })
            }
            .boxed()
        });
        self.operations.insert(
            O::OPNUM,
            OperationEntry {
                name: O::NAME,
                handler: erased,
            },
        );
    }

    /// Register a handler that works on raw stub bytes. Its replies report
    /// `Status::SUCCESS`; any outcome code stays inside the bytes.
    pub fn register_raw<F, Fut>(&mut self, opnum: u16, handler: F)
    where
        F: Fn(Bytes) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Bytes>> + Send + 'static,
    {
        let handler = Arc::new(handler);
        let erased: OperationHandler = Arc::new(move |stub_data: Bytes, _ctx: NdrContext| {
            let fut = handler(stub_data);
            async move {
                Ok(DispatchReply {
                    status: Status::SUCCESS,
                    stub_data: fut.await?,
                })
            }
            .boxed()
        });
        self.operations.insert(
            opnum,
            OperationEntry {
                name: "",
                handler: erased,
            },
        );
    }

    /// Get an operation handler
    pub fn get_operation(&self, opnum: u16) -> Option<&OperationHandler> {
        self.operations.get(&opnum).map(|entry| &entry.handler)
    }

    /// Display name of an operation, if it was registered with one
    pub fn operation_name(&self, opnum: u16) -> Option<&'static str> {
        self.operations
            .get(&opnum)
            .map(|entry| entry.name)
            .filter(|name| !name.is_empty())
    }
}

/// Builder for creating DCE RPC interfaces with a fluent API
pub struct InterfaceBuilder {
    interface: Interface,
}

impl InterfaceBuilder {
    pub fn new(uuid: &str, major_version: u16, minor_version: u16) -> Option<Self> {
        let uuid = Uuid::parse(uuid)?;
        Some(Self {
            interface: Interface::new(uuid, major_version, minor_version),
        })
    }

    pub fn from_syntax(syntax: SyntaxId) -> Self {
        Self {
            interface: Interface::from_syntax(syntax),
        }
    }

    pub fn operation<O, F, Fut>(mut self, handler: F) -> Self
    where
        O: Operation,
        F: Fn(O::Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O::Response>> + Send + 'static,
    {
        self.interface.register_operation::<O, F, Fut>(handler);
        self
    }

    pub fn raw_operation<F, Fut>(mut self, opnum: u16, handler: F) -> Self
    where
        F: Fn(Bytes) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Bytes>> + Send + 'static,
    {
        self.interface.register_raw(opnum, handler);
        self
    }

    pub fn build(self) -> Interface {
        self.interface
    }
}

/// Dispatcher configuration
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Requests with more stub data than this are refused before decoding
    pub max_stub_size: usize,
    /// Byte order of request and response stubs
    pub little_endian: bool,
    /// Decode limits applied to every request
    pub limits: NdrLimits,
}

impl DispatcherConfig {
    pub fn ndr_context(&self) -> NdrContext {
        NdrContext::with_byte_order(self.little_endian).with_limits(self.limits)
    }
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            max_stub_size: DEFAULT_MAX_STUB_SIZE,
            little_endian: true,
            limits: NdrLimits::default(),
        }
    }
}

/// Dispatcher statistics
#[derive(Debug, Default)]
pub struct DispatcherStats {
    pub requests_received: AtomicU64,
    pub requests_processed: AtomicU64,
    pub requests_failed: AtomicU64,
    pub application_failures: AtomicU64,
    pub unknown_interface: AtomicU64,
    pub unknown_opnum: AtomicU64,
    pub malformed_requests: AtomicU64,
    pub bytes_received: AtomicU64,
    pub bytes_sent: AtomicU64,
}

impl DispatcherStats {
    pub fn snapshot(&self) -> DispatcherStatsSnapshot {
        DispatcherStatsSnapshot {
            requests_received: self.requests_received.load(Ordering::Relaxed),
            requests_processed: self.requests_processed.load(Ordering::Relaxed),
            requests_failed: self.requests_failed.load(Ordering::Relaxed),
            application_failures: self.application_failures.load(Ordering::Relaxed),
            unknown_interface: self.unknown_interface.load(Ordering::Relaxed),
            unknown_opnum: self.unknown_opnum.load(Ordering::Relaxed),
            malformed_requests: self.malformed_requests.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
        }
    }

    fn record_failure(&self, err: &RpcError) {
        self.requests_failed.fetch_add(1, Ordering::Relaxed);
        let counter = match err {
            RpcError::Dispatch(DispatchError::UnknownInterface(_)) => &self.unknown_interface,
            RpcError::Dispatch(DispatchError::UnknownOpnum(_)) => &self.unknown_opnum,
            RpcError::Dispatch(DispatchError::MalformedRequest { .. })
            | RpcError::StubTooLarge { .. } => &self.malformed_requests,
            _ => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Snapshot of dispatcher statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatcherStatsSnapshot {
    pub requests_received: u64,
    pub requests_processed: u64,
    pub requests_failed: u64,
    pub application_failures: u64,
    pub unknown_interface: u64,
    pub unknown_opnum: u64,
    pub malformed_requests: u64,
    pub bytes_received: u64,
    pub bytes_sent: u64,
}

/// Routes calls to registered interfaces
pub struct Dispatcher {
    interfaces: RwLock<HashMap<(Uuid, u16), Interface>>,
    config: DispatcherConfig,
    stats: Arc<DispatcherStats>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::with_config(DispatcherConfig::default())
    }

    pub fn with_config(config: DispatcherConfig) -> Self {
        Self {
            interfaces: RwLock::new(HashMap::new()),
            config,
            stats: Arc::new(DispatcherStats::default()),
        }
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Get dispatcher statistics
    pub fn stats(&self) -> &Arc<DispatcherStats> {
        &self.stats
    }

    /// Register an interface, replacing any with the same UUID and major
    /// version
    pub async fn register_interface(&self, interface: Interface) {
        let syntax = interface.syntax;
        info!(
            "Registering interface: {} ({} operations)",
            syntax,
            interface.operations.len()
        );
        let mut interfaces = self.interfaces.write().await;
        interfaces.insert((syntax.uuid, syntax.major_version()), interface);
    }

    async fn lookup(&self, syntax: &SyntaxId, opnum: u16) -> std::result::Result<OperationEntry, DispatchError> {
        let interfaces = self.interfaces.read().await;
        let interface = interfaces
            .get(&(syntax.uuid, syntax.major_version()))
            .filter(|iface| iface.syntax.accepts(syntax))
            .ok_or(DispatchError::UnknownInterface(*syntax))?;
        interface
            .operations
            .get(&opnum)
            .cloned()
            .ok_or(DispatchError::UnknownOpnum(opnum))
    }

    /// Run one call
    pub async fn dispatch(&self, syntax: &SyntaxId, opnum: u16, stub_data: Bytes) -> Result<DispatchReply> {
        self.stats.requests_received.fetch_add(1, Ordering::Relaxed);
        self.stats
            .bytes_received
            .fetch_add(stub_data.len() as u64, Ordering::Relaxed);

        let result = self.run(syntax, opnum, stub_data).await;
        match &result {
            Ok(reply) => {
                self.stats.requests_processed.fetch_add(1, Ordering::Relaxed);
                self.stats
                    .bytes_sent
                    .fetch_add(reply.stub_data.len() as u64, Ordering::Relaxed);
                if !reply.status.is_success() {
                    self.stats.application_failures.fetch_add(1, Ordering::Relaxed);
                }
            }
            Err(e) => {
                self.stats.record_failure(e);
                warn!(interface = %syntax, opnum, "call failed: {}", e);
            }
        }
        result
    }

    async fn run(&self, syntax: &SyntaxId, opnum: u16, stub_data: Bytes) -> Result<DispatchReply> {
        if stub_data.len() > self.config.max_stub_size {
            return Err(RpcError::StubTooLarge {
                size: stub_data.len(),
                max: self.config.max_stub_size,
            });
        }

        let entry = self.lookup(syntax, opnum).await?;
        let reply = (entry.handler)(stub_data, self.config.ndr_context()).await?;
        if !reply.status.is_success() {
            debug!(operation = entry.name, opnum, status = %reply.status, "application failure");
        }
        Ok(reply)
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}
