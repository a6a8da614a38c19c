#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    for &offset_size in &[2u8, 4, 8] {
        for &length_size in &[2u8, 4, 8] {
            let _ = h5vec_format::object_header::ObjectHeader::parse(data, 0, offset_size, length_size);
        }
    }
});
