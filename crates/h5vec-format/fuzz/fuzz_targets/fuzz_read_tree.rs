#![no_main]
use libfuzzer_sys::fuzz_target;

// Whole-file reads must fail cleanly on damaged input, and anything that
// reads back losslessly must also write back.
fuzz_target!(|data: &[u8]| {
    if let Ok(tree) = h5vec_format::read_tree(data) {
        if tree.is_lossless() {
            let opts = h5vec_format::WriteOptions { version: tree.version, create: tree.create };
            let _ = h5vec_format::write_tree(&tree.root, &opts);
        }
    }
});
