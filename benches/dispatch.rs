//! Dispatch benchmark suite.
//!
//! Benchmarks the hot paths of inbound event delivery:
//! - Registry fan-out at different listener counts
//! - Frame decode plus routing for direct and enveloped channels
//! - End-to-end inbound delivery over the in-process transport
//!
//! Run with: cargo bench --bench dispatch
//! Results saved to: target/criterion/

use std::hint::black_box;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use fintrack_realtime::events::Router;
use fintrack_realtime::{
    ClientType, Frame, ListenerRegistry, MemoryConnector, RealtimeClient, StaticCredentials,
    channel,
};
use serde_json::json;
use tokio::runtime::Runtime;
use tokio::sync::Notify;

// ============================================================================
// Benchmark Parameters
// ============================================================================

const LISTENER_COUNTS: &[usize] = &[1, 8, 64];
const BURST_SIZE: usize = 256;

// ============================================================================
// Benchmark: Registry Fan-out
// ============================================================================

fn bench_fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("registry_fan_out");
    let payload = json!({"text": "Your grocery budget is 80% spent", "sender": "bot"});

    for &count in LISTENER_COUNTS {
        let registry = ListenerRegistry::new();
        let hits = Arc::new(AtomicUsize::new(0));
        for _ in 0..count {
            let hits = Arc::clone(&hits);
            registry.on(channel::USER_MESSAGE, move |_| {
                hits.fetch_add(1, Ordering::Relaxed);
            });
        }

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("dispatch", count), &count, |b, _| {
            b.iter(|| registry.dispatch(black_box(channel::USER_MESSAGE), black_box(&payload)));
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark: Decode and Route
// ============================================================================

fn bench_route(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_route");

    let registry = ListenerRegistry::new();
    registry.on(channel::CHAT_HISTORY, |_| {});
    registry.on("budget_alert", |_| {});
    let router = Router::new(registry);

    let direct = Frame::new(channel::CHAT_HISTORY, json!([{"text": "hi"}, {"text": "hello"}]))
        .encode()
        .expect("encode direct frame");
    let enveloped = Frame::new(
        channel::INBOUND_ENVELOPE,
        json!({"type": "budget_alert", "payload": {"category": "food", "spent": 420}}),
    )
    .encode()
    .expect("encode enveloped frame");

    for (name, text) in [("direct", &direct), ("enveloped", &enveloped)] {
        group.bench_function(name, |b| {
            b.iter(|| {
                let frame = Frame::decode(black_box(text)).expect("decode");
                router.route(frame)
            });
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark: End-to-end Delivery
// ============================================================================

fn bench_memory_delivery(c: &mut Criterion) {
    let rt = Runtime::new().expect("tokio runtime");

    let (connector, mut acceptor) = MemoryConnector::new();
    let client = RealtimeClient::builder()
        .credentials(StaticCredentials::new("bench"))
        .transport(connector)
        .build()
        .expect("build client");

    let received = Arc::new(AtomicUsize::new(0));
    let burst_done = Arc::new(Notify::new());
    {
        let received = Arc::clone(&received);
        let burst_done = Arc::clone(&burst_done);
        client.on(channel::USER_MESSAGE, move |_| {
            if received.fetch_add(1, Ordering::Relaxed) + 1 == BURST_SIZE {
                burst_done.notify_one();
            }
        });
    }

    let peer = rt.block_on(async {
        let server = tokio::spawn(async move {
            let mut peer = acceptor.next().await.expect("peer");
            peer.accept("bench-session").await.expect("handshake");
            peer
        });
        client.connect(ClientType::User).await.expect("connect");
        server.await.expect("join")
    });

    let mut group = c.benchmark_group("memory_delivery");
    group.throughput(Throughput::Elements(BURST_SIZE as u64));
    group.bench_function("burst", |b| {
        b.to_async(&rt).iter(|| async {
            received.store(0, Ordering::Relaxed);
            for i in 0..BURST_SIZE {
                peer.emit(channel::USER_MESSAGE, json!({ "seq": i }));
            }
            burst_done.notified().await;
        });
    });
    group.finish();

    client.disconnect();
}

criterion_group!(benches, bench_fan_out, bench_route, bench_memory_delivery);
criterion_main!(benches);
