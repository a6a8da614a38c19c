#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    for &length_size in &[2u8, 4, 8] {
        let _ = h5vec_format::dataspace::Dataspace::parse(data, length_size);
    }
    let _ = h5vec_format::datatype::Datatype::parse(data);
});
