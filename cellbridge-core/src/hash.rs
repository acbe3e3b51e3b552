use std::fmt;

/// A 32-byte Blake3 digest that identifies a cell by its content.
///
/// Two cells with the same payload, descriptors and children (in the same
/// order) always hash to the same value, which is what deduplication in a
/// [`BagOfCells`](crate::BagOfCells) relies on.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellHash([u8; 32]);

impl CellHash {
    /// Computes the hash of the given data.
    pub fn from_data(data: &[u8]) -> Self {
        CellHash(*blake3::hash(data).as_bytes())
    }

    /// Wraps raw digest bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        CellHash(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for CellHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CellHash({})", self)
    }
}

impl fmt::Display for CellHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}
