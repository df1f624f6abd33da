use proptest::prelude::*;
use sortline_core::sort_node::{classify, Bin};
use sortline_core::{decode_line, encode_mass, Decoded, LineAssembler, SortCfg};

proptest! {
    // Three decimals on the wire: anything a scale can produce comes
    // back within half a milligram.
    #[test]
    fn encoded_mass_decodes_within_wire_precision(grams in 0.0f32..20_000.0) {
        let line = encode_mass(grams);
        let stripped = line.trim_end_matches('\n');
        match decode_line(stripped) {
            Decoded::Mass(back) => prop_assert!(
                (back - grams).abs() <= 0.0005 * grams.abs().max(1.0),
                "{grams} -> {line:?} -> {back}"
            ),
            other => prop_assert!(false, "decoded {other:?} from {line:?}"),
        }
    }

    // Every integer weight lands in exactly one bin, and band edges
    // honor the inclusive upper bounds.
    #[test]
    fn every_weight_classifies_consistently(weight in -5_000i32..50_000) {
        let cfg = SortCfg::default();
        let bin = classify(weight, &cfg);
        let expected = if weight > 0 && weight <= cfg.bin1_max_g {
            Bin::One
        } else if weight > cfg.bin1_max_g && weight <= cfg.bin2_max_g {
            Bin::Two
        } else {
            Bin::Three
        };
        prop_assert_eq!(bin, expected);
    }

    // A well-formed message survives any interleaving with garbage
    // lines, as long as each line stays under the buffer cap.
    #[test]
    fn assembler_finds_message_between_garbage_lines(
        grams in 0.0f32..5_000.0,
        before in "[a-z ]{0,40}",
        after in "[a-z ]{0,40}",
    ) {
        let mut stream = Vec::new();
        if !before.is_empty() {
            stream.extend_from_slice(before.as_bytes());
            stream.push(b'\n');
        }
        stream.extend_from_slice(encode_mass(grams).as_bytes());
        if !after.is_empty() {
            stream.extend_from_slice(after.as_bytes());
            stream.push(b'\n');
        }

        let mut assembler = LineAssembler::new();
        let mut masses = Vec::new();
        for &b in &stream {
            if let Some(line) = assembler.push(b) {
                if let Decoded::Mass(g) = decode_line(&line) {
                    masses.push(g);
                }
            }
        }
        prop_assert_eq!(masses.len(), 1);
        prop_assert!((masses[0] - grams).abs() <= 0.0005 * grams.abs().max(1.0));
    }

    // Arbitrary bytes never panic the assembler or the decoder.
    #[test]
    fn assembler_tolerates_arbitrary_bytes(bytes in proptest::collection::vec(any::<u8>(), 0..300)) {
        let mut assembler = LineAssembler::new();
        for b in bytes {
            if let Some(line) = assembler.push(b) {
                let _ = decode_line(&line);
            }
        }
    }
}
