//! Bit-by-bit tree walk that turns an encoded stream back into bytes.
//!
//! The walk starts at the root, follows one child per bit and emits a symbol
//! the moment it lands on a leaf, then returns to the root. Decoding stops
//! once the number of symbols recorded in the frequency table has been
//! emitted, so the zero padding of the final byte is never interpreted.

use bitvec::prelude::*;
use std::io::{Read, Write};
use tracing::debug;

use crate::bitstream::BitReader;
use crate::error::{Error, Result};
use crate::frequency::FrequencyTable;
use crate::tree::{HuffmanTree, Node};

/// Position of the walk.
#[derive(Debug, Clone, Copy)]
enum State<'t> {
    AtRoot,
    Descending(&'t Node),
    Done,
}

#[derive(Debug, Clone)]
pub struct Decoder {
    tree: HuffmanTree,
    total: u64,
}

impl Decoder {
    /// Rebuilds the encoder's tree from its frequency table.
    pub fn new(table: &FrequencyTable) -> Result<Self> {
        Ok(Self {
            tree: HuffmanTree::build(table)?,
            total: table.total(),
        })
    }

    /// Decodes an in-memory bit sequence.
    ///
    /// The output is sized from the input rather than from the table total,
    /// which comes from an untrusted file.
    pub fn decode(&self, input: &BitSlice<u8, Msb0>) -> Result<Vec<u8>> {
        let capacity = if self.tree.root().is_leaf() {
            if self.total > isize::MAX as u64 {
                return Err(Error::corrupt(format!(
                    "table records {} symbols, more than fit in memory",
                    self.total
                )));
            }
            0
        } else {
            // every symbol takes at least one bit
            self.total.min(input.len() as u64) as usize
        };

        let mut bits = input.iter().by_vals();
        let mut out = Vec::with_capacity(capacity);
        self.walk(
            || Ok(bits.next()),
            |s| {
                out.push(s);
                Ok(())
            },
        )?;
        Ok(out)
    }

    /// Decodes from a bit reader into `out`. Returns the number of symbols
    /// written.
    pub fn decode_to<R: Read, W: Write>(
        &self,
        input: &mut BitReader<R>,
        out: &mut W,
    ) -> Result<u64> {
        let emitted = self.walk(
            || Ok(input.read_bit()?),
            |s| Ok(out.write_all(&[s])?),
        )?;
        debug!(symbols = emitted, bits = input.bits_read(), "decoded stream");
        Ok(emitted)
    }

    fn walk(
        &self,
        mut next_bit: impl FnMut() -> Result<Option<bool>>,
        mut emit: impl FnMut(u8) -> Result<()>,
    ) -> Result<u64> {
        let root = self.tree.root();

        // a lone leaf has the empty code: nothing was written per symbol
        if let Node::Leaf { symbol, .. } = root {
            for _ in 0..self.total {
                emit(*symbol)?;
            }
            return Ok(self.total);
        }

        let mut emitted = 0u64;
        let mut state = if self.total == 0 {
            State::Done
        } else {
            State::AtRoot
        };

        loop {
            let current = match state {
                State::Done => break,
                State::AtRoot => root,
                State::Descending(node) => node,
            };

            let bit = next_bit()?.ok_or_else(|| {
                Error::corrupt(format!(
                    "bit stream ended after {} of {} symbols",
                    emitted, self.total
                ))
            })?;
            let child = current
                .child(bit)
                .ok_or_else(|| Error::corrupt("walk reached a node with no children"))?;

            state = match child {
                Node::Leaf { symbol, .. } => {
                    emit(*symbol)?;
                    emitted += 1;
                    if emitted == self.total {
                        State::Done
                    } else {
                        State::AtRoot
                    }
                }
                Node::Internal { .. } => State::Descending(child),
            };
        }

        Ok(emitted)
    }
}
