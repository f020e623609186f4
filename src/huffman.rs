//! Huffman coding of arbitrary text.
//!
//! This is an independent, lossless coder. It can shrink LIMA text (or any
//! other text) further, but the LIMA format itself never depends on it.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap, HashMap};

use bitvec::order::Msb0;
use bitvec::vec::BitVec;
use thiserror::Error;

/// Bit buffer used for encoded text; packs into bytes most significant bit first.
pub type HuffmanBits = BitVec<u8, Msb0>;

/// Reason why text couldn't be Huffman-coded or decoded.
#[derive(Debug, Error, PartialEq)]
pub enum HuffmanError {
	/// There are no symbols to build a tree from.
	#[error("cannot build a Huffman tree for empty text")]
	EmptyInput,
	/// The text holds a character the tree has no code for.
	#[error("character {0:?} has no code in this tree")]
	UnknownSymbol(char),
	/// The bits ran out in the middle of a code.
	#[error("encoded data ends in the middle of a code")]
	TruncatedCode,
}

/// Prefix tree; left edges read as `0`, right edges as `1`.
#[derive(Clone, Debug, PartialEq)]
pub enum HuffmanTree {
	Leaf { symbol: char, freq: usize },
	Branch { freq: usize, left: Box<HuffmanTree>, right: Box<HuffmanTree> },
}

impl HuffmanTree {
	pub fn freq(&self) -> usize {
		match self {
			HuffmanTree::Leaf { freq, .. } | HuffmanTree::Branch { freq, .. } => *freq,
		}
	}

	/// Code of every symbol in the tree, as a bit sequence.
	///
	/// A tree of one symbol gives it the code `0`.
	pub fn codes(&self) -> HashMap<char, HuffmanBits> {
		let mut out = HashMap::new();
		match self {
			HuffmanTree::Leaf { symbol, .. } => {
				let mut code = HuffmanBits::new();
				code.push(false);
				out.insert(*symbol, code);
			},
			branch => collect_codes(branch, &mut HuffmanBits::new(), &mut out),
		}
		out
	}
}

fn collect_codes(node: &HuffmanTree, prefix: &mut HuffmanBits, out: &mut HashMap<char, HuffmanBits>) {
	match node {
		HuffmanTree::Leaf { symbol, .. } => {
			out.insert(*symbol, prefix.clone());
		},
		HuffmanTree::Branch { left, right, .. } => {
			prefix.push(false);
			collect_codes(left, prefix, out);
			prefix.pop();
			prefix.push(true);
			collect_codes(right, prefix, out);
			prefix.pop();
		},
	}
}

/// How often each character occurs in `text`.
pub fn char_frequency(text: &str) -> BTreeMap<char, usize> {
	text.chars().fold(BTreeMap::new(), |mut m, c| {
		*m.entry(c).or_insert(0) += 1;
		m
	})
}

/// Tree waiting in the merge queue. Ordered so the `BinaryHeap` pops the
/// lowest frequency first, and the oldest entry among equal frequencies.
struct Pending {
	seq: usize,
	tree: HuffmanTree,
}

impl PartialEq for Pending {
	fn eq(&self, other: &Self) -> bool {
		self.cmp(other) == Ordering::Equal
	}
}

impl Eq for Pending {}

impl PartialOrd for Pending {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl Ord for Pending {
	fn cmp(&self, other: &Self) -> Ordering {
		(other.tree.freq(), other.seq).cmp(&(self.tree.freq(), self.seq))
	}
}

/// Builds the Huffman tree for `text` by repeatedly merging the two least
/// frequent trees.
pub fn build_tree(text: &str) -> Result<HuffmanTree, HuffmanError> {
	let mut heap = char_frequency(text).into_iter()
		.enumerate()
		.map(|(seq, (symbol, freq))| Pending { seq, tree: HuffmanTree::Leaf { symbol, freq } })
		.collect::<BinaryHeap<_>>();
	let mut seq = heap.len();
	loop {
		match (heap.pop(), heap.pop()) {
			(Some(a), Some(b)) => {
				heap.push(Pending {
					seq,
					tree: HuffmanTree::Branch {
						freq: a.tree.freq() + b.tree.freq(),
						left: Box::new(a.tree),
						right: Box::new(b.tree),
					},
				});
				seq += 1;
			},
			(Some(root), None) => return Ok(root.tree),
			_ => return Err(HuffmanError::EmptyInput),
		}
	}
}

/// Encodes `text` with a tree built from its own character frequencies.
pub fn encode(text: &str) -> Result<(HuffmanBits, HuffmanTree), HuffmanError> {
	let tree = build_tree(text)?;
	let bits = encode_with(text, &tree)?;
	Ok((bits, tree))
}

/// Encodes `text` with an existing tree.
pub fn encode_with(text: &str, tree: &HuffmanTree) -> Result<HuffmanBits, HuffmanError> {
	let codes = tree.codes();
	let mut bits = HuffmanBits::new();
	for c in text.chars() {
		let code = codes.get(&c).ok_or(HuffmanError::UnknownSymbol(c))?;
		bits.extend_from_bitslice(code.as_bitslice());
	}
	Ok(bits)
}

/// Walks `tree` along `bits`, emitting a character at every leaf.
pub fn decode(bits: &HuffmanBits, tree: &HuffmanTree) -> Result<String, HuffmanError> {
	let mut out = String::new();
	if let HuffmanTree::Leaf { symbol, .. } = tree {
		out.extend(std::iter::repeat(*symbol).take(bits.len()));
		return Ok(out);
	}
	let mut node = tree;
	for bit in bits.iter().by_vals() {
		node = match node {
			HuffmanTree::Branch { left, right, .. } => if bit { &**right } else { &**left },
			HuffmanTree::Leaf { .. } => unreachable!("walk restarts at the root after a leaf"),
		};
		if let HuffmanTree::Leaf { symbol, .. } = node {
			out.push(*symbol);
			node = tree;
		}
	}
	if !std::ptr::eq(node, tree) {
		return Err(HuffmanError::TruncatedCode);
	}
	Ok(out)
}
