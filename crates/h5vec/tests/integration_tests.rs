//! End-to-end tests: files written, closed, reopened and read back through
//! the public API.

use std::path::{Path, PathBuf};

use h5vec::{AccessMode, Error, File, FileCreateProps, FormatVersion, H5Type, Location, VersionPolicy};
use h5vec_format::{read_tree, write_tree, Dataspace, DatasetNode, Datatype, DatatypeByteOrder, GroupNode, Node, WriteOptions};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn scratch(dir: &tempfile::TempDir, name: &str) -> PathBuf {
    dir.path().join(name)
}

const POLICIES: [VersionPolicy; 2] = [VersionPolicy::Default, VersionPolicy::Latest];

fn round_trip<T: H5Type + PartialEq + std::fmt::Debug>(values: &[T], policy: VersionPolicy) {
    let dir = tempfile::tempdir().unwrap();
    let path = scratch(&dir, "rt.h5");

    let file = h5vec::create_file(&path, policy).unwrap();
    h5vec::save(&file, "data", values).unwrap();
    h5vec::close_file(file).unwrap();

    let file = h5vec::open_file(&path, AccessMode::ReadOnly, VersionPolicy::Default).unwrap();
    let mut out: Vec<T> = Vec::new();
    h5vec::load(&file, "data", &mut out).unwrap();
    assert_eq!(out, values, "{} under {policy:?}", T::NAME);
}

#[test]
fn every_element_type_round_trips() {
    init_logging();
    for policy in POLICIES {
        round_trip(&[i8::MIN, -1, 0, i8::MAX], policy);
        round_trip(&[0u8, 1, u8::MAX], policy);
        round_trip(&[i16::MIN, 0, i16::MAX], policy);
        round_trip(&[0u16, 300, u16::MAX], policy);
        round_trip(&[i32::MIN, -5, i32::MAX], policy);
        round_trip(&[0u32, 70_000, u32::MAX], policy);
        round_trip(&[i64::MIN, 42, i64::MAX], policy);
        round_trip(&[0u64, 1 << 40, u64::MAX], policy);
        round_trip(&[f32::MIN, -0.5, 0.0, f32::MAX, f32::INFINITY], policy);
        round_trip(&[f64::MIN_POSITIVE, 1.0 / 3.0, -1e300], policy);
        round_trip::<f64>(&[], policy);
    }
}

#[test]
fn version_policy_does_not_change_values() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let values: Vec<f64> = (0..1000).map(|i| (i as f64).sqrt()).collect();
    let mut loaded = Vec::new();
    for (i, policy) in POLICIES.into_iter().enumerate() {
        let path = scratch(&dir, &format!("p{i}.h5"));
        let file = File::create(&path, policy).unwrap();
        file.save("v", &values).unwrap();
        file.close().unwrap();
        let file = File::open(&path, AccessMode::ReadOnly, VersionPolicy::Default).unwrap();
        loaded.push(file.read::<f64>("v").unwrap());
    }
    assert_eq!(loaded[0], values);
    assert_eq!(loaded[0], loaded[1]);
}

#[test]
fn layout_follows_policy() {
    let dir = tempfile::tempdir().unwrap();
    for (policy, superblock) in [(VersionPolicy::Default, 0u8), (VersionPolicy::Latest, 3)] {
        let path = scratch(&dir, "layout.h5");
        let file = File::create(&path, policy).unwrap();
        file.save("x", &[1i32]).unwrap();
        file.close().unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes[8], superblock);
    }
}

#[test]
fn nested_groups_survive_reopen() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = scratch(&dir, "groups.h5");
    for policy in POLICIES {
        let file = h5vec::create_file(&path, policy).unwrap();
        let a = h5vec::create_group(&file, "a").unwrap();
        let b = h5vec::create_group(&a, "b").unwrap();
        h5vec::save(&b, "deep", &[1u32, 2, 3]).unwrap();
        h5vec::save(&a, "shallow", &[-1i16]).unwrap();
        h5vec::create_group(&file, "a/b/c").unwrap();
        h5vec::close_group(b);
        h5vec::close_group(a);
        h5vec::close_file(file).unwrap();

        let file = h5vec::open_file(&path, AccessMode::ReadOnly, policy).unwrap();
        assert_eq!(file.member_names().unwrap(), vec!["a"]);
        let a = h5vec::open_group(&file, "a").unwrap();
        assert_eq!(a.member_names().unwrap(), vec!["b", "shallow"]);
        assert_eq!(h5vec::read::<u32, _>(&a, "b/deep").unwrap(), vec![1, 2, 3]);
        assert_eq!(h5vec::read::<i16, _>(&file, "/a/shallow").unwrap(), vec![-1]);
        assert!(file.open_group("a/b/c").unwrap().member_names().unwrap().is_empty());
    }
}

#[test]
fn reopen_read_write_and_extend() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = scratch(&dir, "extend.h5");
    let file = File::create(&path, VersionPolicy::Default).unwrap();
    file.save("first", &[1.5f32]).unwrap();
    file.close().unwrap();

    let file = File::open(&path, AccessMode::ReadWrite, VersionPolicy::Default).unwrap();
    let g = file.create_group("more").unwrap();
    g.save("second", &[2u8, 3]).unwrap();
    drop(g);
    file.close().unwrap();

    let file = File::open(&path, AccessMode::ReadOnly, VersionPolicy::Default).unwrap();
    assert_eq!(file.read::<f32>("first").unwrap(), vec![1.5]);
    assert_eq!(file.read::<u8>("more/second").unwrap(), vec![2, 3]);
}

#[test]
fn drop_flushes_changes() {
    let dir = tempfile::tempdir().unwrap();
    let path = scratch(&dir, "drop.h5");
    {
        let file = File::create(&path, VersionPolicy::Latest).unwrap();
        file.save("kept", &[7i64]).unwrap();
    }
    let file = File::open(&path, AccessMode::ReadOnly, VersionPolicy::Default).unwrap();
    assert_eq!(file.read::<i64>("kept").unwrap(), vec![7]);
    assert_eq!(file.format_version(), FormatVersion::Latest);
}

#[test]
fn flush_without_close() {
    let dir = tempfile::tempdir().unwrap();
    let path = scratch(&dir, "flush.h5");
    let file = File::create(&path, VersionPolicy::Default).unwrap();
    file.save("x", &[1u16, 2]).unwrap();
    file.flush().unwrap();

    let other = File::open(&path, AccessMode::ReadOnly, VersionPolicy::Default).unwrap();
    assert_eq!(other.read::<u16>("x").unwrap(), vec![1, 2]);
    file.close().unwrap();
}

#[test]
fn second_save_fails_and_keeps_first() {
    let dir = tempfile::tempdir().unwrap();
    let path = scratch(&dir, "dup.h5");
    let file = File::create(&path, VersionPolicy::Default).unwrap();
    file.save("x", &[1i32, 2]).unwrap();
    file.create_group("g").unwrap();

    assert!(matches!(file.save("x", &[5i32, 6, 7]), Err(Error::AlreadyExists(p)) if p == "/x"));
    assert!(matches!(file.save("g", &[5i32]), Err(Error::AlreadyExists(_))));
    assert!(matches!(file.create_group("x"), Err(Error::AlreadyExists(_))));
    file.close().unwrap();

    let file = File::open(&path, AccessMode::ReadOnly, VersionPolicy::Default).unwrap();
    assert_eq!(file.read::<i32>("x").unwrap(), vec![1, 2]);
}

#[test]
fn missing_resources() {
    let dir = tempfile::tempdir().unwrap();
    let path = scratch(&dir, "missing.h5");
    assert!(matches!(
        h5vec::open_file(&path, AccessMode::ReadOnly, VersionPolicy::Default),
        Err(Error::Open { .. })
    ));

    let file = h5vec::create_file(&path, VersionPolicy::Default).unwrap();
    assert!(matches!(h5vec::open_group(&file, "g"), Err(Error::NotFound(_))));
    let mut out = vec![1.0f64];
    assert!(matches!(h5vec::load(&file, "d", &mut out), Err(Error::NotFound(_))));
    assert_eq!(out, vec![1.0]);
    assert!(matches!(h5vec::save(&file, "no/such/d", &[1u8]), Err(Error::NotFound(p)) if p == "/no"));
}

#[test]
fn wrong_object_kind() {
    let dir = tempfile::tempdir().unwrap();
    let file = File::create(scratch(&dir, "kind.h5"), VersionPolicy::Default).unwrap();
    file.save("d", &[1u8]).unwrap();
    file.create_group("g").unwrap();
    assert!(matches!(file.open_group("d"), Err(Error::NotAGroup(p)) if p == "/d"));
    assert!(matches!(file.read::<u8>("g"), Err(Error::NotADataset(_))));
    assert!(matches!(file.create_group("d/sub"), Err(Error::NotAGroup(_))));
}

#[test]
fn read_only_file_rejects_writes() {
    let dir = tempfile::tempdir().unwrap();
    let path = scratch(&dir, "ro.h5");
    let file = File::create(&path, VersionPolicy::Default).unwrap();
    file.create_group("g").unwrap();
    file.close().unwrap();
    let before = std::fs::read(&path).unwrap();

    let file = File::open(&path, AccessMode::ReadOnly, VersionPolicy::Latest).unwrap();
    assert!(matches!(file.save("x", &[1.0f64]), Err(Error::ReadOnly(_))));
    assert!(matches!(file.create_group("h"), Err(Error::ReadOnly(_))));
    let g = file.open_group("g").unwrap();
    assert!(matches!(g.save("x", &[1i8]), Err(Error::ReadOnly(_))));
    drop(g);
    file.close().unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), before);
}

#[test]
fn create_truncates_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = scratch(&dir, "trunc.h5");
    let file = File::create(&path, VersionPolicy::Default).unwrap();
    file.save("old", &[1u8]).unwrap();
    file.close().unwrap();

    let file = File::create(&path, VersionPolicy::Default).unwrap();
    assert!(file.member_names().unwrap().is_empty());
    file.close().unwrap();
    let file = File::open(&path, AccessMode::ReadOnly, VersionPolicy::Default).unwrap();
    assert!(!file.contains("old").unwrap());
}

#[test]
fn load_converts_element_type() {
    let dir = tempfile::tempdir().unwrap();
    let file = File::create(scratch(&dir, "conv.h5"), VersionPolicy::Default).unwrap();
    file.save("small", &[1u8, 2, 250]).unwrap();
    file.save("neg", &[-3i32]).unwrap();

    assert_eq!(file.read::<f64>("small").unwrap(), vec![1.0, 2.0, 250.0]);
    assert_eq!(file.read::<i64>("small").unwrap(), vec![1, 2, 250]);
    assert!(matches!(file.read::<i8>("small"), Err(Error::Conversion { index: 2, .. })));
    assert!(matches!(file.read::<u32>("neg"), Err(Error::Conversion { index: 0, .. })));
}

/// Write a file containing objects that `save` cannot produce.
fn write_foreign(path: &Path, root: &GroupNode) {
    let bytes = write_tree(root, &WriteOptions::default()).unwrap();
    std::fs::write(path, bytes).unwrap();
}

#[test]
fn load_rejects_rank_two() {
    let dir = tempfile::tempdir().unwrap();
    let path = scratch(&dir, "rank2.h5");
    let matrix = DatasetNode::new(
        Datatype::ieee_f64(),
        Dataspace { dimensions: vec![2, 3], ..Dataspace::simple_1d(0) },
        vec![0; 48],
    )
    .unwrap();
    let mut root = GroupNode::new();
    root.insert("m", Node::Dataset(matrix));
    write_foreign(&path, &root);

    let file = File::open(&path, AccessMode::ReadOnly, VersionPolicy::Default).unwrap();
    let mut out = vec![9.0f64];
    assert!(matches!(file.load("m", &mut out), Err(Error::RankMismatch { rank: 2, .. })));
    assert_eq!(out, vec![9.0]);
}

#[test]
fn big_endian_data_reads() {
    let dir = tempfile::tempdir().unwrap();
    let path = scratch(&dir, "be.h5");
    let datatype = Datatype::FixedPoint {
        size: 2,
        byte_order: DatatypeByteOrder::BigEndian,
        signed: false,
        bit_offset: 0,
        bit_precision: 16,
    };
    let node = DatasetNode::new(datatype, Dataspace::simple_1d(2), vec![0x01, 0x02, 0xff, 0x00]).unwrap();
    let mut root = GroupNode::new();
    root.insert("be", Node::Dataset(node));
    write_foreign(&path, &root);

    let file = File::open(&path, AccessMode::ReadWrite, VersionPolicy::Default).unwrap();
    assert_eq!(file.read::<u16>("be").unwrap(), vec![0x0102, 0xff00]);
}

#[test]
fn non_numeric_dataset_is_read_only() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = scratch(&dir, "str.h5");
    let mut root = GroupNode::new();
    root.insert("n", Node::Dataset(h5vec_format::dataset_1d(Datatype::integer(4, true), vec![0; 8]).unwrap()));
    write_foreign(&path, &root);

    // Swap the stored class of "n" to string (class 3) in place.
    let mut bytes = std::fs::read(&path).unwrap();
    let tree = read_tree(&bytes).unwrap();
    assert!(tree.is_lossless());
    let pattern = Datatype::integer(4, true).serialize().unwrap();
    let at = bytes.windows(pattern.len()).position(|w| w == pattern.as_slice()).unwrap();
    bytes[at] = 0x13;
    bytes[at + 1] = 0;
    bytes[at + 2] = 0;
    bytes[at + 3] = 0;
    std::fs::write(&path, &bytes).unwrap();

    assert!(matches!(
        File::open(&path, AccessMode::ReadWrite, VersionPolicy::Default),
        Err(Error::Unsupported(_))
    ));
    let file = File::open(&path, AccessMode::ReadOnly, VersionPolicy::Default).unwrap();
    assert!(matches!(file.read::<i32>("n"), Err(Error::TypeMismatch { .. })));
}

#[test]
fn wide_group_across_btree_levels() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = scratch(&dir, "wide.h5");
    let props = FileCreateProps::new().sym_leaf_k(2).btree_k(2);
    let file = File::create_with(&path, VersionPolicy::Default, props).unwrap();
    let g = file.create_group("many").unwrap();
    for i in 0..300u32 {
        g.save(&format!("d{i:03}"), &[i]).unwrap();
    }
    drop(g);
    file.close().unwrap();

    let file = File::open(&path, AccessMode::ReadWrite, VersionPolicy::Default).unwrap();
    let g = file.open_group("many").unwrap();
    let names = g.member_names().unwrap();
    assert_eq!(names.len(), 300);
    assert_eq!(names[0], "d000");
    assert_eq!(names[299], "d299");
    assert_eq!(g.read::<u32>("d123").unwrap(), vec![123]);
    g.save("extra", &[1u8]).unwrap();
    drop(g);
    file.close().unwrap();

    let file = File::open(&path, AccessMode::ReadOnly, VersionPolicy::Default).unwrap();
    assert_eq!(file.open_group("many").unwrap().member_names().unwrap().len(), 301);
}

#[test]
fn latest_policy_rewrites_old_layout() {
    let dir = tempfile::tempdir().unwrap();
    let path = scratch(&dir, "upgrade.h5");
    let file = File::create(&path, VersionPolicy::Default).unwrap();
    file.save("x", &[1i32, 2]).unwrap();
    file.close().unwrap();

    let file = File::open(&path, AccessMode::ReadWrite, VersionPolicy::Latest).unwrap();
    file.save("y", &[3i32]).unwrap();
    file.close().unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(bytes[8], 3);
    let file = File::open(&path, AccessMode::ReadOnly, VersionPolicy::Default).unwrap();
    assert_eq!(file.format_version(), FormatVersion::Latest);
    assert_eq!(file.read::<i32>("x").unwrap(), vec![1, 2]);
}

/// Replace the file at `path` with a directory so the next flush fails.
fn block_flush(path: &Path) {
    std::fs::remove_file(path).unwrap();
    std::fs::create_dir(path).unwrap();
}

#[test]
fn close_reports_flush_failure() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = scratch(&dir, "blocked.h5");
    let file = h5vec::create_file(&path, VersionPolicy::Default).unwrap();
    h5vec::save(&file, "x", &[1u8, 2]).unwrap();
    block_flush(&path);

    assert!(matches!(h5vec::close_file(file), Err(Error::Io(_))));
    assert!(path.is_dir());
}

#[test]
fn flush_failure_keeps_changes_pending() {
    let dir = tempfile::tempdir().unwrap();
    let path = scratch(&dir, "retry.h5");
    let file = File::create(&path, VersionPolicy::Latest).unwrap();
    file.save("x", &[5i16]).unwrap();
    block_flush(&path);
    assert!(matches!(file.flush(), Err(Error::Io(_))));

    std::fs::remove_dir(&path).unwrap();
    file.close().unwrap();
    let file = File::open(&path, AccessMode::ReadOnly, VersionPolicy::Default).unwrap();
    assert_eq!(file.read::<i16>("x").unwrap(), vec![5]);
}

#[test]
fn drop_with_failing_flush_does_not_panic() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = scratch(&dir, "dropped.h5");
    {
        let file = File::create(&path, VersionPolicy::Default).unwrap();
        file.save("x", &[1.0f32]).unwrap();
        block_flush(&path);
    }
    assert!(path.is_dir());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}
