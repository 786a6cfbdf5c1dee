//! Shared helpers for the integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Once};
use std::time::Duration;

use bytes::Bytes;
use dcerpc::{Dispatcher, LoopbackTransport, Result, SyntaxId, Transport};
use parking_lot::Mutex;
use session_service::common::ACCESS_ALL;
use session_service::{SessionClient, SessionServer};

static INIT: Once = Once::new();

/// Install a test-friendly subscriber once per test binary
pub fn init_logging() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init();
    });
}

/// A served session store and the dispatcher in front of it
pub struct TestService {
    pub server: Arc<SessionServer>,
    pub dispatcher: Arc<Dispatcher>,
}

impl TestService {
    pub async fn start() -> Self {
        let server = SessionServer::new();
        let dispatcher = Arc::new(Dispatcher::new());
        dispatcher.register_interface(server.interface()).await;
        Self { server, dispatcher }
    }

    pub fn transport(&self) -> LoopbackTransport {
        LoopbackTransport::new(Arc::clone(&self.dispatcher))
    }

    pub fn client(&self) -> SessionClient<LoopbackTransport> {
        SessionClient::new(self.transport())
    }
}

/// Open `store` with full access and return the issued handle
pub async fn open_store<T: Transport>(
    client: &SessionClient<T>,
    store: &str,
) -> dcerpc::ContextHandle {
    let reply = client.open_store(store, ACCESS_ALL).await.unwrap();
    assert!(reply.is_success(), "open failed: {}", reply.status);
    reply.response.handle
}

/// Transport that answers every call with fixed stub bytes
pub struct CannedTransport {
    pub response: Bytes,
    pub calls: AtomicU64,
}

impl CannedTransport {
    pub fn new(response: impl Into<Bytes>) -> Self {
        Self {
            response: response.into(),
            calls: AtomicU64::new(0),
        }
    }
}

#[async_trait::async_trait]
impl Transport for CannedTransport {
    async fn call(&self, _interface: &SyntaxId, _opnum: u16, _stub: Bytes) -> Result<Bytes> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        Ok(self.response.clone())
    }
}

/// Success/failure counters and latencies collected across tasks
pub struct ConcurrentStats {
    success: AtomicU64,
    failure: AtomicU64,
    latencies: Mutex<Vec<Duration>>,
}

impl ConcurrentStats {
    pub fn new() -> Self {
        Self {
            success: AtomicU64::new(0),
            failure: AtomicU64::new(0),
            latencies: Mutex::new(Vec::new()),
        }
    }

    pub fn record_success(&self, latency: Duration) {
        self.success.fetch_add(1, Ordering::Relaxed);
        self.latencies.lock().push(latency);
    }

    pub fn record_failure(&self) {
        self.failure.fetch_add(1, Ordering::Relaxed);
    }

    pub fn success_count(&self) -> u64 {
        self.success.load(Ordering::Relaxed)
    }

    pub fn failure_count(&self) -> u64 {
        self.failure.load(Ordering::Relaxed)
    }

    pub fn avg_latency(&self) -> Duration {
        let latencies = self.latencies.lock();
        if latencies.is_empty() {
            return Duration::ZERO;
        }
        latencies.iter().sum::<Duration>() / latencies.len() as u32
    }

    pub fn max_latency(&self) -> Duration {
        self.latencies.lock().iter().max().copied().unwrap_or_default()
    }
}
