use bitvec::prelude::*;
use std::collections::BTreeMap;
use std::fmt;
use std::io::{Read, Write};
use tracing::{debug, trace};

use crate::bitstream::{for_each_chunk, BitWriter};
use crate::error::{Error, Result};
use crate::tree::{HuffmanTree, Node};

/// Code bits of one symbol, first bit first.
pub type Code = BitBox<u8, Msb0>;

/// Symbol to code mapping, read off the root-to-leaf paths of a tree
/// (left edge = 0, right edge = 1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeTable {
    codes: BTreeMap<u8, Code>,
}

impl CodeTable {
    /// Walks the tree depth first, left before right. A tree that is a
    /// single leaf gives its symbol the empty code.
    pub fn derive(tree: &HuffmanTree) -> Self {
        let mut codes = BTreeMap::new();
        let mut stack: Vec<(&Node, BitVec<u8, Msb0>)> = vec![(tree.root(), BitVec::new())];

        while let Some((node, prefix)) = stack.pop() {
            match node {
                Node::Leaf { symbol, .. } => {
                    trace!(symbol, code = ?prefix, "derived code");
                    codes.insert(*symbol, prefix.into_boxed_bitslice());
                }
                Node::Internal { left, right, .. } => {
                    let mut r = prefix.clone();
                    r.push(true);
                    stack.push((right, r));

                    let mut l = prefix;
                    l.push(false);
                    stack.push((left, l));
                }
            }
        }

        Self { codes }
    }

    pub fn get(&self, symbol: u8) -> Option<&BitSlice<u8, Msb0>> {
        self.codes.get(&symbol).map(|c| c.as_bitslice())
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Codes in ascending symbol order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, &BitSlice<u8, Msb0>)> + '_ {
        self.codes.iter().map(|(&s, c)| (s, c.as_bitslice()))
    }
}

impl fmt::Display for CodeTable {
    /// One `BBBBBBBB -> code` line per symbol.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (symbol, code) in self.iter() {
            write!(f, "{:08b} -> ", symbol)?;
            for bit in code.iter().by_vals() {
                f.write_str(if bit { "1" } else { "0" })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Turns a byte stream into the concatenation of its symbols' codes.
#[derive(Debug, Clone)]
pub struct Encoder {
    codes: CodeTable,
}

impl Encoder {
    pub fn new(codes: CodeTable) -> Self {
        Self { codes }
    }

    /// Encodes an in-memory stream of symbols.
    pub fn encode(&self, stream: impl IntoIterator<Item = u8>) -> Result<BitVec<u8, Msb0>> {
        let mut out = BitVec::new();
        for s in stream {
            out.extend_from_bitslice(self.lookup(s)?);
        }
        Ok(out)
    }

    /// Reads `input` to the end, writing each symbol's code to `out` as it
    /// goes. Returns the number of symbols encoded.
    pub fn encode_to<W: Write>(
        &self,
        input: impl Read,
        out: &mut BitWriter<W>,
    ) -> Result<u64> {
        let mut symbols = 0u64;
        for_each_chunk(input, |chunk| {
            for &b in chunk {
                out.write_bits(self.lookup(b)?)?;
            }
            symbols += chunk.len() as u64;
            Ok(())
        })?;
        debug!(symbols, bits = out.bits_written(), "encoded stream");
        Ok(symbols)
    }

    fn lookup(&self, symbol: u8) -> Result<&BitSlice<u8, Msb0>> {
        self.codes.get(symbol).ok_or(Error::Internal { symbol })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frequency::FrequencyTable;

    fn table_for(data: &[u8]) -> CodeTable {
        CodeTable::derive(&HuffmanTree::build(&FrequencyTable::from_bytes(data)).unwrap())
    }

    fn code_str(table: &CodeTable, symbol: u8) -> String {
        table
            .get(symbol)
            .unwrap()
            .iter()
            .by_vals()
            .map(|b| if b { '1' } else { '0' })
            .collect()
    }

    #[test]
    fn known_vector_lengths_are_monotonic() {
        let codes = table_for(&[0x41, 0x41, 0x41, 0x42, 0x42, 0x43]);
        let a = codes.get(0x41).unwrap().len();
        let b = codes.get(0x42).unwrap().len();
        let c = codes.get(0x43).unwrap().len();
        assert!(a <= b && b <= c, "{} {} {}", a, b, c);
    }

    #[test]
    fn known_vector_exact_codes() {
        let codes = table_for(b"AAABBC");
        assert_eq!(code_str(&codes, b'A'), "0");
        assert_eq!(code_str(&codes, b'C'), "10");
        assert_eq!(code_str(&codes, b'B'), "11");
        assert_eq!(
            codes.to_string(),
            "01000001 -> 0\n01000010 -> 11\n01000011 -> 10\n"
        );
    }

    #[test]
    fn single_symbol_has_empty_code() {
        let codes = table_for(&[0x41; 1000]);
        assert_eq!(codes.len(), 1);
        assert!(codes.get(0x41).unwrap().is_empty());
    }

    #[test]
    fn codes_are_prefix_free() {
        let data: Vec<u8> = (0..4000u32).map(|i| ((i * 7) % 97 + i % 13) as u8).collect();
        let codes = table_for(&data);
        let all: Vec<_> = codes.iter().collect();
        for (i, (_, a)) in all.iter().enumerate() {
            assert!(!a.is_empty());
            for (j, (_, b)) in all.iter().enumerate() {
                if i != j {
                    assert!(!b.starts_with(*a), "{} prefixes {}", i, j);
                }
            }
        }
    }

    #[test]
    fn encode_concatenates_codes() {
        let codes = table_for(b"AAABBC");
        let enc = Encoder::new(codes);
        let bits = enc.encode(b"ABC".iter().copied()).unwrap();
        assert_eq!(bits.as_bitslice(), bits![u8, Msb0; 0, 1, 1, 1, 0]);
    }

    #[test]
    fn unknown_symbol_is_internal_error() {
        let enc = Encoder::new(table_for(b"AB"));
        let err = enc.encode([b'Z']).unwrap_err();
        assert!(matches!(err, Error::Internal { symbol: b'Z' }));
    }

    #[test]
    fn encode_to_streams_into_writer() {
        let enc = Encoder::new(table_for(b"AAABBC"));
        let mut w = BitWriter::new(Vec::new());
        let n = enc.encode_to(&b"AAABBC"[..], &mut w).unwrap();
        assert_eq!(n, 6);
        assert_eq!(w.bits_written(), 9);
        // 0 0 0 11 11 10 + padding
        assert_eq!(w.finish().unwrap(), vec![0b0001_1111, 0b0000_0000]);
    }
}
