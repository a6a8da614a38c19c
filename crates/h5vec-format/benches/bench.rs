use criterion::{criterion_group, criterion_main, Criterion};
use h5vec_format::{dataset_1d, read_tree, write_tree, Datatype, FormatVersion, GroupNode, Node, WriteOptions};

const N: usize = 1_000_000;

fn make_tree() -> GroupNode {
    let bytes = (0..N).flat_map(|i| (i as f64).to_le_bytes()).collect();
    let mut root = GroupNode::new();
    root.insert("data", Node::Dataset(dataset_1d(Datatype::ieee_f64(), bytes).unwrap()));
    root
}

fn make_wide_tree(members: usize) -> GroupNode {
    let mut root = GroupNode::new();
    for i in 0..members {
        let bytes = (i as i32).to_le_bytes().to_vec();
        root.insert(format!("m{i:05}"), Node::Dataset(dataset_1d(Datatype::integer(4, true), bytes).unwrap()));
    }
    root
}

fn opts(version: FormatVersion) -> WriteOptions {
    WriteOptions { version, ..Default::default() }
}

fn bench_write_1m(c: &mut Criterion) {
    let root = make_tree();
    c.bench_function("write_1M_f64_earliest", |b| b.iter(|| write_tree(&root, &opts(FormatVersion::Earliest)).unwrap()));
    c.bench_function("write_1M_f64_latest", |b| b.iter(|| write_tree(&root, &opts(FormatVersion::Latest)).unwrap()));
}

fn bench_read_1m(c: &mut Criterion) {
    let bytes = write_tree(&make_tree(), &opts(FormatVersion::Earliest)).unwrap();
    c.bench_function("read_1M_f64", |b| b.iter(|| read_tree(&bytes).unwrap()));
}

fn bench_wide_group(c: &mut Criterion) {
    let root = make_wide_tree(10_000);
    let bytes = write_tree(&root, &opts(FormatVersion::Earliest)).unwrap();
    c.bench_function("write_10k_members_symbol_table", |b| {
        b.iter(|| write_tree(&root, &opts(FormatVersion::Earliest)).unwrap())
    });
    c.bench_function("read_10k_members_symbol_table", |b| b.iter(|| read_tree(&bytes).unwrap()));
}

criterion_group!(benches, bench_write_1m, bench_read_1m, bench_wide_group);
criterion_main!(benches);
