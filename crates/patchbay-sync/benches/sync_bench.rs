//! Criterion benchmarks for synchronizer passes
//!
//! Run with: cargo bench -p patchbay-sync

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use patchbay_core::{
    Dimensions, GraphStore, InputPort, MemoryHost, NodeId, NodeTypeDef, ParamRef, PortDef,
    PortRef, PortSet, Position, RuntimeUnit, SignalInput, SignalOutput, TypeCatalog,
};
use patchbay_sync::Synchronizer;

fn catalog() -> TypeCatalog {
    let mut catalog = TypeCatalog::new();
    catalog.register_type(
        "gain",
        NodeTypeDef::new(
            PortSet::new(
                vec![PortDef::new("in", "audio"), PortDef::new("gain", "audio")],
                vec![PortDef::new("out", "audio")],
            ),
            Dimensions::new(120.0, 60.0),
            |ctx| {
                let node = ctx.host().create_node("gain", &[("gain", 1.0)])?;
                Ok(RuntimeUnit::new()
                    .with_input("in", InputPort::Signal(SignalInput::new(node, 0)))
                    .with_input("gain", InputPort::Parameter(ParamRef::new(node, "gain")))
                    .with_output("out", SignalOutput::new(node, 0))
                    .owning(node))
            },
        ),
    );
    catalog
}

/// Builds a linear chain of `len` gain nodes.
fn chain(catalog: &TypeCatalog, len: usize) -> GraphStore {
    let mut store = GraphStore::default();
    let ids: Vec<NodeId> = (0..len)
        .map(|i| {
            store
                .add_node(catalog, "gain", Position::new(i as f32 * 150.0, 0.0))
                .unwrap()
        })
        .collect();
    for pair in ids.windows(2) {
        store.link(catalog, PortRef::new(pair[0], 0), PortRef::new(pair[1], 0));
    }
    store
}

fn bench_full_build(c: &mut Criterion) {
    let catalog = catalog();
    let mut group = c.benchmark_group("sync_full_build");
    for len in [16usize, 128, 512] {
        group.bench_with_input(BenchmarkId::from_parameter(len), &len, |b, &len| {
            b.iter_batched(
                || (chain(&catalog, len), MemoryHost::new(), Synchronizer::new()),
                |(mut store, mut host, mut sync)| {
                    black_box(sync.sync(&mut store, &catalog, &mut host));
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_state_change(c: &mut Criterion) {
    let catalog = catalog();
    let mut store = chain(&catalog, 512);
    let mut host = MemoryHost::new();
    let mut sync = Synchronizer::new();
    sync.sync(&mut store, &catalog, &mut host);
    let target = NodeId(256);
    let mut value = 0.0_f64;

    c.bench_function("sync_single_state_change", |b| {
        b.iter(|| {
            value += 0.01;
            store.set_state(target, "gain", value).unwrap();
            black_box(sync.sync(&mut store, &catalog, &mut host));
        });
    });
}

criterion_group!(benches, bench_full_build, bench_state_change);
criterion_main!(benches);
