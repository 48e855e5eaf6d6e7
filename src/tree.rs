use derivative::Derivative;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use tracing::debug;

use crate::error::{Error, Result};
use crate::frequency::FrequencyTable;

/// A node of a Huffman tree. Internal nodes own both of their children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Leaf {
        symbol: u8,
        frequency: u64,
    },
    Internal {
        frequency: u64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    fn leaf(symbol: u8, frequency: u64) -> Self {
        Node::Leaf { symbol, frequency }
    }

    fn from_children(left: Node, right: Node) -> Self {
        Node::Internal {
            frequency: left.frequency() + right.frequency(),
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn frequency(&self) -> u64 {
        match self {
            Node::Leaf { frequency, .. } | Node::Internal { frequency, .. } => *frequency,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }

    /// Child reached by following `bit` (false = left, true = right).
    /// Leaves have no children.
    pub fn child(&self, bit: bool) -> Option<&Node> {
        match self {
            Node::Leaf { .. } => None,
            Node::Internal { left, right, .. } => Some(if bit { right } else { left }),
        }
    }
}

/// Queue entry. Ordered by frequency, then by the order it entered the
/// queue, so equal frequencies always merge in the same order.
#[derive(Debug, Derivative)]
#[derivative(PartialEq, Eq, PartialOrd, Ord)]
struct Pending {
    frequency: u64,
    sequence: u64,

    #[derivative(PartialEq = "ignore")]
    #[derivative(PartialOrd = "ignore")]
    #[derivative(Ord = "ignore")]
    node: Node,
}

/// A Huffman tree built from a [`FrequencyTable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HuffmanTree {
    root: Node,
}

impl HuffmanTree {
    /// Builds the tree by repeatedly merging the two lowest-frequency nodes.
    ///
    /// Leaves enter the queue in ascending symbol order and every queued
    /// node is stamped with an increasing sequence number; ties on frequency
    /// go to the lower sequence number. The first node removed becomes the
    /// left child. The same table therefore always yields the same tree.
    ///
    /// A table with one symbol yields a tree that is a single leaf.
    pub fn build(table: &FrequencyTable) -> Result<Self> {
        if table.is_empty() {
            return Err(Error::EmptyInput);
        }
        // node frequencies are partial sums of the total
        table
            .iter()
            .try_fold(0u64, |acc, (_, count)| acc.checked_add(count))
            .ok_or_else(|| Error::format(0, "total frequency overflows"))?;

        let mut sequence = 0u64;
        let mut enqueue = |pq: &mut BinaryHeap<Reverse<Pending>>, node: Node| {
            pq.push(Reverse(Pending {
                frequency: node.frequency(),
                sequence,
                node,
            }));
            sequence += 1;
        };

        let mut pq = BinaryHeap::with_capacity(table.len());
        for (symbol, count) in table.iter() {
            enqueue(&mut pq, Node::leaf(symbol, count));
        }

        loop {
            let Reverse(left) = pq.pop().ok_or(Error::EmptyInput)?;
            let Some(Reverse(right)) = pq.pop() else {
                let tree = Self { root: left.node };
                debug!(
                    symbols = table.len(),
                    depth = tree.depth(),
                    "built huffman tree"
                );
                return Ok(tree);
            };
            enqueue(&mut pq, Node::from_children(left.node, right.node));
        }
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Frequency at the root, equal to the table total.
    pub fn frequency(&self) -> u64 {
        self.root.frequency()
    }

    /// Length of the longest root-to-leaf path. A single leaf has depth 0.
    pub fn depth(&self) -> usize {
        let mut max = 0;
        let mut stack = vec![(&self.root, 0usize)];
        while let Some((node, d)) = stack.pop() {
            match node {
                Node::Leaf { .. } => max = max.max(d),
                Node::Internal { left, right, .. } => {
                    stack.push((right, d + 1));
                    stack.push((left, d + 1));
                }
            }
        }
        max
    }
}
