#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = h5vec_format::superblock::Superblock::parse(data, 0);
    if let Ok(offset) = h5vec_format::signature::find_signature(data) {
        let _ = h5vec_format::superblock::Superblock::parse(data, offset);
    }
});
