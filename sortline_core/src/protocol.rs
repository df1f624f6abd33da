//! Wire codec shared by both nodes.
//!
//! One message per line: `Khoi_luong:<mass>g\n`, mass in grams with
//! exactly 3 fractional digits. Keeping encode and decode in a single
//! module means the format symmetry is tested once, not per node.

/// Fixed message prefix on the wire.
pub const WIRE_PREFIX: &str = "Khoi_luong:";

/// Max bytes accumulated for one line before the assembler resets.
pub const MAX_LINE_LEN: usize = 100;

/// Outcome of decoding one received line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decoded {
    /// A well-formed weight message.
    Mass(f32),
    /// Prefix matched but the numeric payload did not parse. The
    /// original firmware silently read this as 0 g; callers preserve
    /// that policy, but the case stays distinguishable here.
    Unparsable,
    /// Not a weight message at all; ignore the line.
    NotWeight,
}

impl Decoded {
    /// Grams the nodes act on: `Unparsable` collapses to 0.
    pub fn grams(self) -> Option<f32> {
        match self {
            Decoded::Mass(g) => Some(g),
            Decoded::Unparsable => Some(0.0),
            Decoded::NotWeight => None,
        }
    }
}

/// Encode a mass in grams as one newline-terminated wire message.
pub fn encode_mass(grams: f32) -> String {
    format!("{WIRE_PREFIX}{grams:.3}g\n")
}

/// Decode one line (without its terminator).
pub fn decode_line(line: &str) -> Decoded {
    let Some(payload) = line.strip_prefix(WIRE_PREFIX) else {
        return Decoded::NotWeight;
    };
    let payload = payload.replace('g', "");
    match payload.trim().parse::<f32>() {
        Ok(g) => Decoded::Mass(g),
        Err(_) => Decoded::Unparsable,
    }
}

/// Incremental line framer fed one byte at a time from the link.
///
/// `\n` and `\r` both terminate a line; empty lines are swallowed. A
/// line longer than [`MAX_LINE_LEN`] is discarded wholesale, matching
/// the original receive-buffer guard.
#[derive(Debug, Default)]
pub struct LineAssembler {
    buf: Vec<u8>,
}

impl LineAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one byte; returns a complete line when one terminates.
    pub fn push(&mut self, byte: u8) -> Option<String> {
        if byte == b'\n' || byte == b'\r' {
            if self.buf.is_empty() {
                return None;
            }
            let line = String::from_utf8_lossy(&self.buf).into_owned();
            self.buf.clear();
            return Some(line);
        }
        self.buf.push(byte);
        if self.buf.len() > MAX_LINE_LEN {
            self.buf.clear();
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_three_decimals() {
        assert_eq!(encode_mass(250.0), "Khoi_luong:250.000g\n");
        assert_eq!(encode_mass(75.5), "Khoi_luong:75.500g\n");
        assert_eq!(encode_mass(0.0), "Khoi_luong:0.000g\n");
    }

    #[test]
    fn decodes_well_formed_line() {
        assert_eq!(decode_line("Khoi_luong:123.000g"), Decoded::Mass(123.0));
        assert_eq!(decode_line("Khoi_luong:75.500g"), Decoded::Mass(75.5));
    }

    #[test]
    fn rejects_missing_prefix() {
        assert_eq!(decode_line("khoi_luong:1.000g"), Decoded::NotWeight);
        assert_eq!(decode_line("WEIGHT:1.000g"), Decoded::NotWeight);
        assert_eq!(decode_line(""), Decoded::NotWeight);
    }

    #[test]
    fn unparsable_payload_is_distinct_but_reads_zero() {
        let d = decode_line("Khoi_luong:abcg");
        assert_eq!(d, Decoded::Unparsable);
        assert_eq!(d.grams(), Some(0.0));
    }

    #[test]
    fn tolerates_padded_payload() {
        assert_eq!(decode_line("Khoi_luong: 42.125 g"), Decoded::Mass(42.125));
    }

    #[test]
    fn assembler_splits_on_both_terminators() {
        let mut asm = LineAssembler::new();
        let mut lines = Vec::new();
        for b in b"Khoi_luong:1.000g\r\nKhoi_luong:2.000g\n" {
            if let Some(line) = asm.push(*b) {
                lines.push(line);
            }
        }
        assert_eq!(lines, ["Khoi_luong:1.000g", "Khoi_luong:2.000g"]);
    }

    #[test]
    fn assembler_discards_overlong_garbage() {
        let mut asm = LineAssembler::new();
        for _ in 0..(MAX_LINE_LEN * 3) {
            assert_eq!(asm.push(b'x'), None);
        }
        // Whatever tail of garbage survives the resets is flushed by the
        // terminator and rejected by decode; the next message is clean.
        if let Some(tail) = asm.push(b'\n') {
            assert_eq!(decode_line(&tail), Decoded::NotWeight);
        }
        let mut got = None;
        for b in encode_mass(9.0).bytes() {
            if let Some(line) = asm.push(b) {
                got = Some(line);
            }
        }
        assert_eq!(decode_line(&got.unwrap()), Decoded::Mass(9.0));
    }
}
