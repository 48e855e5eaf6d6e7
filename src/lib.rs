//! Huffman coding of byte streams.
//!
//! Encoding writes two files: the packed code bits (no header, zero padded to
//! a whole byte) and a text frequency table with one `BBBBBBBB:N` line per
//! symbol. Decoding needs both.
//!
//! ```no_run
//! huffpack::encode("input.bin", "input.huff", "input.freq")?;
//! huffpack::decode("input.huff", "roundtrip.bin", "input.freq")?;
//! # Ok::<(), huffpack::Error>(())
//! ```

pub mod bitstream;
pub mod code;
pub mod decoder;
pub mod error;
pub mod frequency;
pub mod tree;

use bitvec::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub use bitstream::{BitReader, BitWriter};
pub use code::{CodeTable, Encoder};
pub use decoder::Decoder;
pub use error::{Error, Result};
pub use frequency::FrequencyTable;
pub use tree::{HuffmanTree, Node};

/// Encodes `input` into `output`, writing the frequency table to `freq`.
///
/// The input is read twice: once to count symbols and once to emit codes.
pub fn encode(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    freq: impl AsRef<Path>,
) -> Result<()> {
    let input = input.as_ref();

    let table = FrequencyTable::build(BufReader::new(File::open(input)?))?;
    let tree = HuffmanTree::build(&table)?;

    let mut freq_out = BufWriter::new(File::create(freq.as_ref())?);
    freq_out.write_all(table.serialize().as_bytes())?;
    freq_out.flush()?;
    drop(freq_out);

    let encoder = Encoder::new(CodeTable::derive(&tree));
    let mut bits = BitWriter::new(BufWriter::new(File::create(output.as_ref())?));
    let symbols = encoder.encode_to(BufReader::new(File::open(input)?), &mut bits)?;
    if symbols != table.total() {
        warn!(
            counted = table.total(),
            encoded = symbols,
            "input changed between counting and encoding"
        );
    }
    let written = bits.bits_written();
    bits.finish()?;

    debug!(
        input = %input.display(),
        symbols,
        bits = written,
        "encode finished"
    );
    Ok(())
}

/// Decodes `input` into `output` using the frequency table stored in `freq`.
pub fn decode(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    freq: impl AsRef<Path>,
) -> Result<()> {
    let text = String::from_utf8(fs::read(freq.as_ref())?)
        .map_err(|e| Error::format(0, format!("frequency file is not UTF-8: {}", e)))?;
    let table = FrequencyTable::deserialize(&text)?;
    let decoder = Decoder::new(&table)?;

    let mut bits = BitReader::new(BufReader::new(File::open(input.as_ref())?));
    let mut out = BufWriter::new(File::create(output.as_ref())?);
    let symbols = decoder.decode_to(&mut bits, &mut out)?;
    out.flush()?;

    debug!(
        output = %output.as_ref().display(),
        symbols,
        "decode finished"
    );
    Ok(())
}

/// The three files of one encode or decode job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecPaths {
    pub input: PathBuf,
    pub output: PathBuf,
    pub freq: PathBuf,
}

impl CodecPaths {
    pub fn new(
        input: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        freq: impl Into<PathBuf>,
    ) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            freq: freq.into(),
        }
    }

    pub fn encode(&self) -> Result<()> {
        encode(&self.input, &self.output, &self.freq)
    }

    pub fn decode(&self) -> Result<()> {
        decode(&self.input, &self.output, &self.freq)
    }
}

/// Encodes `data` in memory, returning the zero-padded packed bits and the
/// table needed to decode them.
pub fn compress(data: &[u8]) -> Result<(Vec<u8>, FrequencyTable)> {
    let table = FrequencyTable::from_bytes(data);
    let tree = HuffmanTree::build(&table)?;
    let encoder = Encoder::new(CodeTable::derive(&tree));

    let mut bits = BitWriter::new(Vec::new());
    encoder.encode_to(data, &mut bits)?;
    Ok((bits.finish()?, table))
}

/// Inverse of [`compress`].
pub fn decompress(packed: &[u8], table: &FrequencyTable) -> Result<Vec<u8>> {
    Decoder::new(table)?.decode(packed.view_bits::<Msb0>())
}
