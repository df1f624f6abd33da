#![no_main]
use libfuzzer_sys::fuzz_target;
use sortline_core::{LineAssembler, decode_line};

fuzz_target!(|data: &[u8]| {
    // Arbitrary link bytes must never panic the framer or the decoder,
    // and any decoded mass must be usable downstream.
    let mut assembler = LineAssembler::new();
    for &b in data {
        if let Some(line) = assembler.push(b) {
            let _ = decode_line(&line).grams();
        }
    }
});
