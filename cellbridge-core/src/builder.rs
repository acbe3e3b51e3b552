use std::sync::Arc;

use crate::cell::{Cell, MAX_BITS, MAX_REFS};
use crate::error::CellError;

/// Append-only writer producing a [`Cell`].
#[derive(Debug, Default)]
pub struct CellBuilder {
    data: Vec<u8>,
    bit_len: usize,
    refs: Vec<Arc<Cell>>,
}

impl CellBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    pub fn store_bit(&mut self, bit: bool) -> Result<&mut Self, CellError> {
        if self.bit_len >= MAX_BITS {
            return Err(CellError::TooManyBits(self.bit_len + 1));
        }
        if self.bit_len % 8 == 0 {
            self.data.push(0);
        }
        if bit {
            let last = self.data.len() - 1;
            self.data[last] |= 0x80 >> (self.bit_len % 8);
        }
        self.bit_len += 1;
        Ok(self)
    }

    /// Stores the low `bits` bits of `value`, most significant first.
    pub fn store_uint(&mut self, value: u64, bits: usize) -> Result<&mut Self, CellError> {
        if bits > 64 || self.bit_len + bits > MAX_BITS {
            return Err(CellError::TooManyBits(self.bit_len + bits));
        }
        for shift in (0..bits).rev() {
            self.store_bit((value >> shift) & 1 == 1)?;
        }
        Ok(self)
    }

    pub fn store_bytes(&mut self, bytes: &[u8]) -> Result<&mut Self, CellError> {
        if self.bit_len + bytes.len() * 8 > MAX_BITS {
            return Err(CellError::TooManyBits(self.bit_len + bytes.len() * 8));
        }
        if self.bit_len % 8 == 0 {
            self.data.extend_from_slice(bytes);
            self.bit_len += bytes.len() * 8;
            return Ok(self);
        }
        for byte in bytes {
            self.store_uint(u64::from(*byte), 8)?;
        }
        Ok(self)
    }

    pub fn store_ref(&mut self, cell: Arc<Cell>) -> Result<&mut Self, CellError> {
        if self.refs.len() >= MAX_REFS {
            return Err(CellError::TooManyRefs(self.refs.len() + 1));
        }
        self.refs.push(cell);
        Ok(self)
    }

    pub fn build(self) -> Result<Cell, CellError> {
        Cell::new(self.data, self.bit_len, self.refs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_packs_bits_msb_first() {
        let mut b = CellBuilder::new();
        b.store_bit(true).unwrap().store_uint(0b01, 2).unwrap();
        let cell = b.build().unwrap();
        assert_eq!(cell.bit_len(), 3);
        assert_eq!(cell.data(), &[0b1010_0000]);
    }

    #[test]
    fn builder_unaligned_bytes() {
        let mut b = CellBuilder::new();
        b.store_uint(0xf, 4).unwrap().store_bytes(&[0xab]).unwrap();
        let cell = b.build().unwrap();
        assert_eq!(cell.bit_len(), 12);
        assert_eq!(cell.data(), &[0xfa, 0xb0]);
    }

    #[test]
    fn builder_rejects_overflow() {
        let mut b = CellBuilder::new();
        b.store_bytes(&[0u8; 127]).unwrap();
        b.store_uint(0, 7).unwrap();
        assert!(matches!(b.store_bit(true), Err(CellError::TooManyBits(1024))));

        let mut b = CellBuilder::new();
        for _ in 0..4 {
            b.store_ref(Arc::new(Cell::empty())).unwrap();
        }
        assert!(matches!(
            b.store_ref(Arc::new(Cell::empty())),
            Err(CellError::TooManyRefs(5))
        ));
    }
}
