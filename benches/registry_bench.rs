use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use openflow_protocol::protocol::factories::CustomPayloadCodec;
use openflow_protocol::protocol::registry::{SerializerRegistry, SharedSerializerRegistry};
use openflow_protocol::protocol::{MessageKind, MessageTypeKey, OFP_VERSION_1_3};

#[allow(clippy::unwrap_used)]
fn bench_registry(c: &mut Criterion) {
    let mut group = c.benchmark_group("registry");
    let shared = SharedSerializerRegistry::new(SerializerRegistry::builtin());
    let key = MessageTypeKey::new(OFP_VERSION_1_3, MessageKind::PortMod);

    group.bench_function("snapshot_lookup", |b| {
        b.iter(|| shared.lookup(black_box(&key)).unwrap())
    });

    let snapshot = shared.snapshot().unwrap();
    group.bench_function("frozen_lookup", |b| {
        b.iter(|| snapshot.lookup(black_box(&key)).unwrap())
    });

    group.bench_function("publish_override", |b| {
        let custom = MessageTypeKey::new(OFP_VERSION_1_3, MessageKind::Custom(200));
        b.iter(|| {
            shared
                .register_override(custom, Arc::new(CustomPayloadCodec))
                .unwrap()
        })
    });

    group.finish();
}

criterion_group!(benches, bench_registry);
criterion_main!(benches);
