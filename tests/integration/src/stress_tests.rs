//! Stress Tests - Concurrent Calls
//!
//! These tests exercise concurrency through a single dispatcher:
//! - Many clients, each with its own store and handle
//! - Many clients sharing one store
//! - Handles opened and closed while other tasks use them
//! - Per-call cursors never mix data between calls

mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use parking_lot::Mutex;
use tokio::sync::Barrier;

use common::*;
use dcerpc::Status;
use session_service::schema::ValueKind;

/// Test: many clients with private stores, all calls verified
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_many_clients_private_stores() {
    init_logging();

    const NUM_CLIENTS: usize = 32;
    const VALUES_PER_CLIENT: usize = 25;

    let service = Arc::new(TestService::start().await);
    let stats = Arc::new(ConcurrentStats::new());
    let barrier = Arc::new(Barrier::new(NUM_CLIENTS));

    let tasks = (0..NUM_CLIENTS).map(|client_id| {
        let service = Arc::clone(&service);
        let stats = Arc::clone(&stats);
        let barrier = Arc::clone(&barrier);

        tokio::spawn(async move {
            let client = service.client();
            let handle = open_store(&client, &format!("store-{}", client_id)).await;
            barrier.wait().await;

            for i in 0..VALUES_PER_CLIENT {
                let name = format!("v{:03}", i);
                let payload = format!("client {} value {}", client_id, i).into_bytes();

                let start = Instant::now();
                let set = client
                    .set_value(handle, &name, ValueKind::String, payload.clone())
                    .await;
                let read = client.read_value(handle, &name, 4).await;

                match (set, read) {
                    (Ok(set), Ok(read))
                        if set.is_success()
                            && read.is_success()
                            && read.response.value() == Some(&payload[..]) =>
                    {
                        stats.record_success(start.elapsed())
                    }
                    _ => stats.record_failure(),
                }
            }

            let (entries, status) = client.enum_all(handle).await.unwrap();
            assert!(status.is_success());
            assert_eq!(entries.len(), VALUES_PER_CLIENT);
            assert!(client.close_store(handle).await.unwrap().is_success());
        })
    });

    for result in join_all(tasks).await {
        result.unwrap();
    }

    println!("\n=== Private Store Results ===");
    println!("Successful: {}", stats.success_count());
    println!("Failed: {}", stats.failure_count());
    println!("Avg latency: {:?}", stats.avg_latency());
    println!("Max latency: {:?}", stats.max_latency());

    assert_eq!(stats.failure_count(), 0);
    assert_eq!(stats.success_count(), (NUM_CLIENTS * VALUES_PER_CLIENT) as u64);
    assert_eq!(service.server.open_sessions(), 0);

    let snapshot = service.dispatcher.stats().snapshot();
    assert_eq!(snapshot.requests_failed, 0);
}

/// Test: writers on one shared store see each other's values
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_shared_store_concurrent_writers() {
    init_logging();

    const NUM_WRITERS: usize = 16;
    const VALUES_PER_WRITER: usize = 10;

    let service = Arc::new(TestService::start().await);
    let barrier = Arc::new(Barrier::new(NUM_WRITERS));

    let tasks = (0..NUM_WRITERS).map(|writer_id| {
        let service = Arc::clone(&service);
        let barrier = Arc::clone(&barrier);

        tokio::spawn(async move {
            let client = service.client();
            let handle = open_store(&client, "shared").await;
            barrier.wait().await;

            for i in 0..VALUES_PER_WRITER {
                let name = format!("w{:02}-{:02}", writer_id, i);
                let reply = client
                    .set_value(handle, &name, ValueKind::Dword, (i as u32).to_le_bytes().to_vec())
                    .await
                    .unwrap();
                assert!(reply.is_success());
            }
            handle
        })
    });

    let handles: Vec<_> = join_all(tasks)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();

    let client = service.client();
    let (entries, status) = client.enum_all(handles[0]).await.unwrap();
    assert!(status.is_success());
    assert_eq!(entries.len(), NUM_WRITERS * VALUES_PER_WRITER);

    for handle in handles {
        assert!(client.close_store(handle).await.unwrap().is_success());
    }
}

/// Test: handles closed mid-flight are rejected, never confused with others
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_close_races_with_use() {
    init_logging();

    const NUM_SESSIONS: usize = 20;
    const READS_PER_SESSION: usize = 30;

    let service = Arc::new(TestService::start().await);
    let outcomes: Arc<Mutex<Vec<Status>>> = Arc::new(Mutex::new(Vec::new()));

    let tasks = (0..NUM_SESSIONS).map(|session_id| {
        let service = Arc::clone(&service);
        let outcomes = Arc::clone(&outcomes);

        tokio::spawn(async move {
            let client = service.client();
            let handle = open_store(&client, &format!("race-{}", session_id)).await;
            client
                .set_value(handle, "id", ValueKind::Dword, (session_id as u32).to_le_bytes().to_vec())
                .await
                .unwrap();

            let reader = {
                let service = Arc::clone(&service);
                let outcomes = Arc::clone(&outcomes);
                tokio::spawn(async move {
                    let client = service.client();
                    for _ in 0..READS_PER_SESSION {
                        let reply = client.query_value(handle, "id", 4).await.unwrap();
                        if reply.is_success() {
                            // a live handle only ever reaches its own store
                            assert_eq!(
                                reply.response.value(),
                                Some(&(session_id as u32).to_le_bytes()[..])
                            );
                        }
                        outcomes.lock().push(reply.status);
                        tokio::task::yield_now().await;
                    }
                })
            };

            tokio::time::sleep(Duration::from_millis(1)).await;
            assert!(client.close_store(handle).await.unwrap().is_success());
            reader.await.unwrap();

            let after = client.query_value(handle, "id", 4).await.unwrap();
            assert_eq!(after.status, Status::ERROR_INVALID_HANDLE);
        })
    });

    for result in join_all(tasks).await {
        result.unwrap();
    }

    let outcomes = outcomes.lock();
    assert_eq!(outcomes.len(), NUM_SESSIONS * READS_PER_SESSION);
    assert!(outcomes
        .iter()
        .all(|s| *s == Status::SUCCESS || *s == Status::ERROR_INVALID_HANDLE));
    assert_eq!(service.server.open_sessions(), 0);
}

/// Test: rapid sequential calls on one client
#[tokio::test]
async fn test_rapid_fire_sequential() {
    init_logging();

    const NUM_REQUESTS: usize = 500;

    let service = TestService::start().await;
    let client = service.client();
    let handle = open_store(&client, "rapid").await;
    let stats = ConcurrentStats::new();

    let start = Instant::now();
    for i in 0..NUM_REQUESTS {
        let req_start = Instant::now();
        let data = format!("request_{:05}", i).into_bytes();
        match client.set_value(handle, "last", ValueKind::String, data).await {
            Ok(reply) if reply.is_success() => stats.record_success(req_start.elapsed()),
            _ => stats.record_failure(),
        }
    }
    let total_duration = start.elapsed();

    println!("\n=== Rapid Fire Test Results ===");
    println!("Total requests: {}", NUM_REQUESTS);
    println!("Successful: {}", stats.success_count());
    println!("Total duration: {:?}", total_duration);
    println!(
        "Throughput: {:.2} req/sec",
        NUM_REQUESTS as f64 / total_duration.as_secs_f64()
    );

    assert_eq!(stats.failure_count(), 0, "No failures expected in sequential test");
    let last = client.read_value(handle, "last", 4).await.unwrap();
    assert_eq!(last.response.value(), Some(&b"request_00499"[..]));
}
