//! Sequential bit I/O over byte-oriented readers and writers.
//!
//! Bits are packed most significant bit first. [`BitWriter::finish`] pads the
//! final byte with zero bits; the stream carries no length or end marker.

use bitvec::prelude::*;
use std::io::{self, BufRead, BufReader, ErrorKind, Read, Write};

use crate::error::Result;

/// Number of bytes buffered before touching the underlying reader/writer.
const CHUNK_BYTES: usize = 4096;

/// Feeds `input` to `f` one buffered chunk at a time until end of stream.
pub(crate) fn for_each_chunk(
    input: impl Read,
    mut f: impl FnMut(&[u8]) -> Result<()>,
) -> Result<()> {
    let mut reader = BufReader::with_capacity(CHUNK_BYTES * 2, input);
    loop {
        let chunk = match reader.fill_buf() {
            Ok([]) => break,
            Ok(chunk) => chunk,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        let n = chunk.len();
        f(chunk)?;
        reader.consume(n);
    }
    Ok(())
}

/// Writes individual bits and whole bytes to a [`Write`].
pub struct BitWriter<W: Write> {
    inner: W,
    buf: BitVec<u8, Msb0>,
    bits_written: u64,
}

impl<W: Write> BitWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            buf: BitVec::with_capacity(CHUNK_BYTES * 8),
            bits_written: 0,
        }
    }

    pub fn write_bit(&mut self, bit: bool) -> io::Result<()> {
        self.buf.push(bit);
        self.bits_written += 1;
        self.drain_full_chunk()
    }

    pub fn write_bits(&mut self, bits: &BitSlice<u8, Msb0>) -> io::Result<()> {
        self.buf.extend_from_bitslice(bits);
        self.bits_written += bits.len() as u64;
        self.drain_full_chunk()
    }

    pub fn write_byte(&mut self, byte: u8) -> io::Result<()> {
        self.write_bits(byte.view_bits::<Msb0>())
    }

    /// Bits accepted so far, not counting padding.
    pub fn bits_written(&self) -> u64 {
        self.bits_written
    }

    /// Pads to a byte boundary, flushes, and hands back the inner writer.
    pub fn finish(mut self) -> io::Result<W> {
        let rem = self.buf.len() % 8;
        if rem != 0 {
            self.buf.resize(self.buf.len() + 8 - rem, false);
        }
        self.inner.write_all(self.buf.as_raw_slice())?;
        self.buf.clear();
        self.inner.flush()?;
        Ok(self.inner)
    }

    fn drain_full_chunk(&mut self) -> io::Result<()> {
        if self.buf.len() < CHUNK_BYTES * 8 {
            return Ok(());
        }
        let whole = self.buf.len() / 8 * 8;
        self.inner.write_all(&self.buf.as_raw_slice()[..whole / 8])?;
        let tail: BitVec<u8, Msb0> = self.buf[whole..].to_bitvec();
        self.buf = tail;
        Ok(())
    }
}

/// Reads individual bits and whole bytes from a [`Read`].
pub struct BitReader<R: Read> {
    inner: R,
    chunk: Vec<u8>,
    pos: usize,
    bits_read: u64,
}

impl<R: Read> BitReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            chunk: Vec::new(),
            pos: 0,
            bits_read: 0,
        }
    }

    /// Returns `None` once the underlying reader is exhausted.
    pub fn read_bit(&mut self) -> io::Result<Option<bool>> {
        if !self.fill()? {
            return Ok(None);
        }
        let bit = self.chunk.view_bits::<Msb0>()[self.pos];
        self.pos += 1;
        self.bits_read += 1;
        Ok(Some(bit))
    }

    /// Reads eight bits. A partial byte at the end of the stream is an error.
    pub fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut byte = 0u8;
        for i in 0..8 {
            match self.read_bit()? {
                Some(bit) => byte = (byte << 1) | u8::from(bit),
                None if i == 0 => return Ok(None),
                None => {
                    return Err(io::Error::new(
                        ErrorKind::UnexpectedEof,
                        "stream ended inside a byte",
                    ))
                }
            }
        }
        Ok(Some(byte))
    }

    pub fn is_exhausted(&mut self) -> io::Result<bool> {
        Ok(!self.fill()?)
    }

    pub fn bits_read(&self) -> u64 {
        self.bits_read
    }

    /// Ensures at least one unread bit is buffered. Returns false at end of stream.
    fn fill(&mut self) -> io::Result<bool> {
        if self.pos < self.chunk.len() * 8 {
            return Ok(true);
        }
        self.chunk.resize(CHUNK_BYTES, 0);
        let n = loop {
            match self.inner.read(&mut self.chunk) {
                Ok(n) => break n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.chunk.clear();
                    return Err(e);
                }
            }
        };
        self.chunk.truncate(n);
        self.pos = 0;
        Ok(n > 0)
    }
}
