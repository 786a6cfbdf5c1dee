//! Session Store Demo
//!
//! Serves the session store interface and calls it through the in-process
//! transport, printing each call's outcome.
//!
//! USAGE:
//!   session-demo [OPTIONS]
//!
//! EXAMPLES:
//!   session-demo                          # default store, 3 values
//!   session-demo --store profile          # Custom store name
//!   session-demo --values 10              # Write more values
//!   session-demo --buffer-size 2          # Force the insufficient-buffer retry
//!   session-demo --log-level debug        # Show dispatcher and handle logs

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use dcerpc::{ClientConfig, Dispatcher, LoopbackTransport, RpcClient, RpcError, Status};
use session_service::common::{store_syntax, ACCESS_ALL, STORE_INTERFACE_UUID};
use session_service::schema::{FlushStore, HandleRequest, ValueInfo, ValueKind};
use session_service::{SessionClient, SessionServer};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "session-demo")]
#[command(version)]
#[command(about = "Session store served and called in-process")]
struct Args {
    /// Store to open
    #[arg(long, default_value = "settings")]
    store: String,

    /// Number of values to write
    #[arg(long, default_value_t = 3)]
    values: u32,

    /// Initial buffer size for reads
    #[arg(long, default_value_t = 4)]
    buffer_size: u32,

    /// Per-call timeout in milliseconds
    #[arg(long, default_value_t = 5000)]
    timeout_ms: u64,

    /// Maximum log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: Level,
}

fn describe(info: &ValueInfo) -> String {
    match info {
        ValueInfo::Basic(basic) => format!("{} ({:?})", basic.name.as_str(), basic.kind),
        ValueInfo::Full(full) => format!(
            "{} ({:?}, {} bytes)",
            full.name.as_str(),
            full.kind,
            full.data.as_ref().map_or(0, |d| d.len())
        ),
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║              Session Store Demo (DCE RPC / NDR)              ║");
    println!("╠══════════════════════════════════════════════════════════════╣");
    println!("║  Interface: {} v1.0  ║", STORE_INTERFACE_UUID);
    println!("║  Transport: in-process loopback                              ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    let server = SessionServer::new();
    let dispatcher = Arc::new(Dispatcher::new());
    dispatcher.register_interface(server.interface()).await;

    let config = ClientConfig {
        call_timeout: Some(Duration::from_millis(args.timeout_ms)),
        ..Default::default()
    };
    let transport = LoopbackTransport::new(Arc::clone(&dispatcher));
    let client = SessionClient::from_rpc(RpcClient::with_config(transport, store_syntax(), config));

    let opened = client.open_store(&args.store, ACCESS_ALL).await?;
    let handle = opened.into_result()?.handle;
    println!("[OPEN]   {} -> handle {}", args.store, handle);

    for i in 0..args.values {
        let name = format!("value{}", i);
        let data = format!("payload number {}", i).into_bytes();
        let status = client
            .set_value(handle, &name, ValueKind::String, data)
            .await?
            .status;
        println!("[SET]    {} -> {}", name, status);
    }

    if args.values > 0 {
        let first = client.query_value(handle, "value0", args.buffer_size).await?;
        println!(
            "[QUERY]  value0 with {} bytes -> {} (needed {})",
            args.buffer_size, first.status, first.response.needed
        );

        let read = client.read_value(handle, "value0", args.buffer_size).await?;
        let value = read.response.value().unwrap_or_default();
        println!(
            "[READ]   value0 -> {} {:?}",
            read.status,
            String::from_utf8_lossy(value)
        );
    }

    let (entries, status) = client.enum_all(handle).await?;
    for entry in &entries {
        println!("[ENUM]   {}", describe(entry));
    }
    println!("[ENUM]   {} entries, final status {}", entries.len(), status);

    match client.rpc().invoke::<FlushStore>(&HandleRequest { handle }).await {
        Err(RpcError::Fault(code)) => println!("[FLUSH]  fault 0x{:08x}", code),
        other => println!("[FLUSH]  unexpected {:?}", other.map(|r| r.status)),
    }

    let closed = client.close_store(handle).await?;
    println!("[CLOSE]  {} -> {}", handle, closed.status);

    let reused = client.query_value(handle, "value0", 64).await?;
    let expected = if reused.status == Status::ERROR_INVALID_HANDLE {
        "rejected"
    } else {
        "accepted"
    };
    println!("[REUSE]  closed handle {} ({})", expected, reused.status);

    let stats = dispatcher.stats().snapshot();
    println!();
    println!(
        "Dispatcher: {} received, {} processed, {} failed, {} application failures",
        stats.requests_received,
        stats.requests_processed,
        stats.requests_failed,
        stats.application_failures
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    run(args).await
}
