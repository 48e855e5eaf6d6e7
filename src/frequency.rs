use serde::{Deserialize, Serialize};
use std::collections::btree_map::{self, BTreeMap};
use std::fmt::Write as _;
use std::io::Read;
use tracing::debug;

use crate::bitstream::for_each_chunk;
use crate::error::{Error, Result};

/// Occurrence count of every byte value present in an input.
///
/// Iteration is in ascending symbol order, which is also the order the tree
/// builder enqueues leaves in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrequencyTable {
    counts: BTreeMap<u8, u64>,
}

impl FrequencyTable {
    /// Counts every byte of `input`, reading it to the end.
    pub fn build(input: impl Read) -> Result<Self> {
        let mut counts = [0u64; 256];
        for_each_chunk(input, |chunk| {
            for &b in chunk {
                counts[b as usize] += 1;
            }
            Ok(())
        })?;

        let table: Self = counts
            .iter()
            .enumerate()
            .filter(|&(_, &c)| c > 0)
            .map(|(s, &c)| (s as u8, c))
            .collect();
        debug!(
            symbols = table.len(),
            total = table.total(),
            "counted symbol frequencies"
        );
        Ok(table)
    }

    pub fn from_bytes(data: &[u8]) -> Self {
        data.iter().copied().collect()
    }

    pub fn get(&self, symbol: u8) -> Option<u64> {
        self.counts.get(&symbol).copied()
    }

    /// Number of distinct symbols.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts, i.e. the length of the input that was counted.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, u64)> + '_ {
        self.counts.iter().map(|(&s, &c)| (s, c))
    }

    /// Renders the table as `BBBBBBBB:N` lines, one per symbol, each ending
    /// in `\n`.
    pub fn serialize(&self) -> String {
        let mut out = String::with_capacity(self.counts.len() * 16);
        for (symbol, count) in self.iter() {
            // writing to a String cannot fail
            let _ = writeln!(out, "{:08b}:{}", symbol, count);
        }
        out
    }

    /// Parses the text produced by [`serialize`](Self::serialize).
    ///
    /// The counts must sum to at most `u64::MAX`, so that every later sum
    /// over the table (node frequencies, [`total`](Self::total)) fits.
    pub fn deserialize(text: &str) -> Result<Self> {
        let mut counts = BTreeMap::new();
        let mut total = 0u64;
        for (idx, raw) in text.lines().enumerate() {
            let line = idx + 1;
            let (symbol, count) = parse_line(raw, line)?;
            total = total
                .checked_add(count)
                .ok_or_else(|| Error::format(line, "total frequency overflows"))?;
            match counts.entry(symbol) {
                btree_map::Entry::Vacant(slot) => {
                    slot.insert(count);
                }
                btree_map::Entry::Occupied(_) => {
                    return Err(Error::format(
                        line,
                        format!("duplicate symbol {:08b}", symbol),
                    ))
                }
            }
        }
        Ok(Self { counts })
    }
}

fn parse_line(raw: &str, line: usize) -> Result<(u8, u64)> {
    let (bits, count) = raw
        .split_once(':')
        .ok_or_else(|| Error::format(line, "missing ':' separator"))?;

    if bits.is_empty() || !bits.bytes().all(|b| b == b'0' || b == b'1') {
        return Err(Error::format(
            line,
            format!("symbol {:?} is not a binary string", bits),
        ));
    }
    // leading zeros are fine, but the value has to fit in a byte
    let significant = bits.trim_start_matches('0');
    if significant.len() > 8 {
        return Err(Error::format(
            line,
            format!("symbol {} does not fit in a byte", bits),
        ));
    }
    let symbol = if significant.is_empty() {
        0
    } else {
        u8::from_str_radix(significant, 2)
            .map_err(|e| Error::format(line, format!("symbol {}: {}", bits, e)))?
    };

    if count.is_empty() || !count.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::format(
            line,
            format!("frequency {:?} is not a decimal integer", count),
        ));
    }
    let count: u64 = count
        .parse()
        .map_err(|e| Error::format(line, format!("frequency {}: {}", count, e)))?;
    if count == 0 {
        return Err(Error::format(line, "frequency must be at least 1"));
    }

    Ok((symbol, count))
}

impl FromIterator<u8> for FrequencyTable {
    fn from_iter<I: IntoIterator<Item = u8>>(iter: I) -> Self {
        let mut counts = BTreeMap::new();
        for b in iter {
            *counts.entry(b).or_default() += 1;
        }
        Self { counts }
    }
}

impl FromIterator<(u8, u64)> for FrequencyTable {
    /// Collects explicit `(symbol, count)` pairs. Zero counts are dropped and
    /// repeated symbols accumulate, saturating at `u64::MAX`.
    fn from_iter<I: IntoIterator<Item = (u8, u64)>>(iter: I) -> Self {
        let mut counts = BTreeMap::new();
        for (s, c) in iter.into_iter().filter(|&(_, c)| c > 0) {
            let slot: &mut u64 = counts.entry(s).or_default();
            *slot = slot.saturating_add(c);
        }
        Self { counts }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FrequencyTable {
        FrequencyTable::from_bytes(b"AAABBC")
    }

    #[test]
    fn build_counts_every_byte() {
        let data: Vec<u8> = (0..=255u8).chain(0..10).collect();
        let table = FrequencyTable::build(data.as_slice()).unwrap();
        assert_eq!(table.len(), 256);
        assert_eq!(table.total(), data.len() as u64);
        assert_eq!(table.get(5), Some(2));
        assert_eq!(table.get(200), Some(1));
    }

    #[test]
    fn build_on_empty_input() {
        let table = FrequencyTable::build(std::io::empty()).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.total(), 0);
    }

    #[test]
    fn serialize_format() {
        assert_eq!(
            sample().serialize(),
            "01000001:3\n01000010:2\n01000011:1\n"
        );
    }

    #[test]
    fn deserialize_inverts_serialize() {
        let t = sample();
        assert_eq!(FrequencyTable::deserialize(&t.serialize()).unwrap(), t);
    }

    #[test]
    fn deserialize_accepts_short_binary_and_crlf() {
        let t = FrequencyTable::deserialize("1:4\r\n00000000:2\r\n").unwrap();
        assert_eq!(t.get(1), Some(4));
        assert_eq!(t.get(0), Some(2));
    }

    #[test]
    fn deserialize_rejects_non_binary_symbol() {
        let err = FrequencyTable::deserialize("XYZ:5\n").unwrap_err();
        assert!(matches!(err, Error::Format { line: 1, .. }), "{}", err);
    }

    #[test]
    fn deserialize_rejects_malformed_lines() {
        for bad in [
            "01000001\n",
            "01000001:\n",
            "01000001:abc\n",
            "01000001:-3\n",
            "01000001:0\n",
            "111111111:1\n",
            ":7\n",
            "01000001:1\n\n",
            "01000001:1\n01000001:2\n",
        ] {
            let err = FrequencyTable::deserialize(bad).unwrap_err();
            assert!(matches!(err, Error::Format { .. }), "{:?} -> {}", bad, err);
        }
    }

    #[test]
    fn deserialize_rejects_overflowing_total() {
        let text = "00000000:18446744073709551615\n00000001:5\n00000010:5\n";
        match FrequencyTable::deserialize(text) {
            Err(Error::Format { line, message }) => {
                assert_eq!(line, 2);
                assert_eq!(message, "total frequency overflows");
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            FrequencyTable::deserialize("1:18446744073709551615\n0:1\n"),
            Err(Error::Format { line: 2, .. })
        ));
    }

    #[test]
    fn deserialize_accepts_total_of_exactly_max() {
        let t = FrequencyTable::deserialize("1:18446744073709551614\n0:1\n").unwrap();
        assert_eq!(t.total(), u64::MAX);
    }

    #[test]
    fn deserialize_rejects_count_beyond_u64() {
        let err = FrequencyTable::deserialize("00000001:18446744073709551616\n").unwrap_err();
        assert!(matches!(err, Error::Format { line: 1, .. }), "{}", err);
    }

    #[test]
    fn duplicate_reports_second_line() {
        match FrequencyTable::deserialize("00000001:1\n00000001:2\n") {
            Err(Error::Format { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn pairs_drop_zero_counts() {
        let t: FrequencyTable = [(1u8, 0u64), (2, 3), (2, 1)].into_iter().collect();
        assert_eq!(t.len(), 1);
        assert_eq!(t.get(2), Some(4));
    }

    #[test]
    fn messagepack_roundtrip() {
        let t = sample();
        let bytes = rmp_serde::to_vec(&t).unwrap();
        let back: FrequencyTable = rmp_serde::from_slice(&bytes).unwrap();
        assert_eq!(back, t);
    }
}
