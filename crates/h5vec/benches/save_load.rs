use criterion::{criterion_group, criterion_main, Criterion};
use h5vec::{AccessMode, File, Location, VersionPolicy};

const N: usize = 1_000_000;

fn bench_save(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("save.h5");
    let data: Vec<f64> = (0..N).map(|i| i as f64).collect();

    for (label, policy) in [("default", VersionPolicy::Default), ("latest", VersionPolicy::Latest)] {
        c.bench_function(&format!("save_1M_f64_{label}"), |b| {
            b.iter(|| {
                let file = File::create(&path, policy).unwrap();
                file.save("data", &data).unwrap();
                file.close().unwrap();
            })
        });
    }
}

fn bench_load(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("load.h5");
    let data: Vec<i32> = (0..N as i32).collect();
    let file = File::create(&path, VersionPolicy::Default).unwrap();
    file.save("data", &data).unwrap();
    file.close().unwrap();

    c.bench_function("load_1M_i32", |b| {
        let mut out = Vec::new();
        b.iter(|| {
            let file = File::open(&path, AccessMode::ReadOnly, VersionPolicy::Default).unwrap();
            file.load("data", &mut out).unwrap();
            out.len()
        })
    });
    c.bench_function("load_1M_i32_as_f64", |b| {
        b.iter(|| {
            let file = File::open(&path, AccessMode::ReadOnly, VersionPolicy::Default).unwrap();
            file.read::<f64>("data").unwrap()
        })
    });
}

criterion_group!(benches, bench_save, bench_load);
criterion_main!(benches);
