use std::sync::{Arc, OnceLock};

use crate::error::CellError;
use crate::hash::CellHash;

/// Maximum payload length of a cell, in bits.
pub const MAX_BITS: usize = 1023;
/// Maximum number of child references of a cell.
pub const MAX_REFS: usize = 4;

/// An immutable node of a cell tree.
///
/// A cell holds up to 1023 bits of payload and up to 4 ordered references to
/// other cells. Children are shared through `Arc`, so a tree may reuse a
/// subtree any number of times, but since a cell can only reference cells
/// that already exist the graph is always acyclic.
///
/// The content hash is computed lazily on first access via `hash()`, then
/// cached. Equality between cells is content equality.
pub struct Cell {
    data: Vec<u8>,
    bit_len: usize,
    refs: Vec<Arc<Cell>>,
    exotic: bool,
    level_mask: u8,
    hash: OnceLock<CellHash>,
}

impl Cell {
    /// Creates an ordinary cell.
    ///
    /// `data` must hold exactly `ceil(bit_len / 8)` bytes; bits past
    /// `bit_len` in the last byte are cleared.
    pub fn new(data: Vec<u8>, bit_len: usize, refs: Vec<Arc<Cell>>) -> Result<Self, CellError> {
        Self::with_descriptor(data, bit_len, refs, false, 0)
    }

    /// Creates a cell with explicit exotic flag and level mask.
    ///
    /// The flags are not interpreted; they are carried so that cells read
    /// from the network serialize back to the same bytes.
    pub fn with_descriptor(
        mut data: Vec<u8>,
        bit_len: usize,
        refs: Vec<Arc<Cell>>,
        exotic: bool,
        level_mask: u8,
    ) -> Result<Self, CellError> {
        if bit_len > MAX_BITS {
            return Err(CellError::TooManyBits(bit_len));
        }
        if refs.len() > MAX_REFS {
            return Err(CellError::TooManyRefs(refs.len()));
        }
        if level_mask > 7 {
            return Err(CellError::LevelMask(level_mask));
        }
        let expected = bit_len.div_ceil(8);
        if data.len() != expected {
            return Err(CellError::DataLength {
                bits: bit_len,
                expected,
                got: data.len(),
            });
        }

        let rem = bit_len % 8;
        if rem != 0 {
            if let Some(last) = data.last_mut() {
                *last &= 0xffu8 << (8 - rem);
            }
        }

        Ok(Cell {
            data,
            bit_len,
            refs,
            exotic,
            level_mask,
            hash: OnceLock::new(),
        })
    }

    /// An ordinary cell with no payload and no references.
    pub fn empty() -> Self {
        Cell {
            data: Vec::new(),
            bit_len: 0,
            refs: Vec::new(),
            exotic: false,
            level_mask: 0,
            hash: OnceLock::new(),
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    pub fn refs(&self) -> &[Arc<Cell>] {
        &self.refs
    }

    /// Returns the `index`-th child, if present.
    pub fn reference(&self, index: usize) -> Option<&Arc<Cell>> {
        self.refs.get(index)
    }

    pub fn is_exotic(&self) -> bool {
        self.exotic
    }

    pub fn level_mask(&self) -> u8 {
        self.level_mask
    }

    /// Returns the content hash, computing it if necessary.
    pub fn hash(&self) -> CellHash {
        *self.hash.get_or_init(|| self.compute_hash())
    }

    /// The two descriptor bytes `d1 d2` of the wire representation.
    pub(crate) fn descriptors(&self) -> [u8; 2] {
        let d1 = self.refs.len() as u8 + if self.exotic { 8 } else { 0 } + self.level_mask * 32;
        let d2 = (self.bit_len / 8 + self.bit_len.div_ceil(8)) as u8;
        [d1, d2]
    }

    /// Payload with the completion tag appended when the last byte is partial.
    pub(crate) fn padded_data(&self) -> Vec<u8> {
        let mut out = self.data.clone();
        let rem = self.bit_len % 8;
        if rem != 0 {
            if let Some(last) = out.last_mut() {
                *last |= 0x80 >> rem;
            }
        }
        out
    }

    fn compute_hash(&self) -> CellHash {
        let mut buf = Vec::with_capacity(2 + self.data.len() + 32 * self.refs.len());
        buf.extend_from_slice(&self.descriptors());
        buf.extend_from_slice(&self.padded_data());
        for child in &self.refs {
            buf.extend_from_slice(child.hash().as_bytes());
        }
        CellHash::from_data(&buf)
    }
}

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        self.hash() == other.hash()
    }
}

impl Eq for Cell {}

impl std::fmt::Debug for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cell")
            .field("bits", &self.bit_len)
            .field("data", &hex::encode(&self.data))
            .field("refs", &self.refs.len())
            .field("hash", &self.hash.get())
            .finish()
    }
}
