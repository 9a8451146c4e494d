//! Benchmarks for the hot paths on a message's way through the node: the
//! inbound de-duplication cache and operation registry resolution.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use hstp_node::context::MessageContext;
use hstp_node::domain_types::{DedupCacheSize, MessageId};
use hstp_node::message::HstpMessage;
use hstp_node::operation::{HandlerError, OperationHandler, OperationRegistry};
use hstp_node::transport::DedupCache;
use std::sync::Arc;

struct Echo;

#[async_trait::async_trait]
impl OperationHandler for Echo {
    fn operation(&self) -> &str {
        "echo"
    }

    async fn handle(&self, _ctx: &mut MessageContext) -> Result<Option<HstpMessage>, HandlerError> {
        Ok(None)
    }
}

struct Named(String);

#[async_trait::async_trait]
impl OperationHandler for Named {
    fn operation(&self) -> &str {
        &self.0
    }

    async fn handle(&self, _ctx: &mut MessageContext) -> Result<Option<HstpMessage>, HandlerError> {
        Ok(None)
    }
}

/// Insert/lookup throughput of the de-dup cache at a few capacities, with
/// every id a fresh arrival (the worst case for the underlying eviction
/// bookkeeping).
fn bench_dedup_cache(c: &mut Criterion) {
    let mut group = c.benchmark_group("dedup_cache");

    for capacity in [256usize, 8192, 65536] {
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::new("record_and_check_duplicate", capacity), &capacity, |b, &capacity| {
            let cache = DedupCache::new(DedupCacheSize::try_new(capacity).unwrap());
            b.iter(|| {
                let id = MessageId::generate();
                black_box(cache.record_and_check_duplicate(id));
            });
        });
    }

    group.finish();
}

/// Resolution throughput of the operation registry as the number of
/// registered operations grows.
fn bench_registry_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("operation_registry");

    for operation_count in [1usize, 16, 256] {
        group.bench_with_input(
            BenchmarkId::new("resolve", operation_count),
            &operation_count,
            |b, &operation_count| {
                let registry = OperationRegistry::new();
                registry.register(Arc::new(Echo));
                for i in 0..operation_count {
                    registry.register(Arc::new(Named(format!("op-{i}"))));
                }
                b.iter(|| black_box(registry.resolve("echo")));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_dedup_cache, bench_registry_resolve);
criterion_main!(benches);
