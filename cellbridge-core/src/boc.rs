//! Bag-of-cells wire format.
//!
//! Layout (all integers big-endian unless noted):
//!
//! ```text
//! magic          4 bytes   b5 ee 9c 72
//! flags          1 byte    has_idx | has_crc32c | has_cache_bits | 00 | size(3)
//! off_bytes      1 byte
//! cells          size bytes
//! roots          size bytes
//! absent         size bytes
//! tot_cells_size off_bytes
//! root_list      roots * size bytes
//! index          cells * off_bytes   (only with has_idx)
//! cell_data      tot_cells_size bytes
//! crc32c         4 bytes, little-endian (only with has_crc32c)
//! ```
//!
//! Every cell record is `d1 d2 payload ref*`, where references are cell
//! indices of `size` bytes. A reference must point to a later cell, which
//! rules out cycles at the format level.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose;
use log::debug;

use crate::bag::{BagOfCells, CellId};
use crate::cell::{Cell, MAX_REFS};
use crate::error::CellError;

const BOC_MAGIC: u32 = 0xb5ee_9c72;

const FLAG_HAS_IDX: u8 = 0x80;
const FLAG_HAS_CRC32C: u8 = 0x40;
const FLAG_HAS_CACHE_BITS: u8 = 0x20;
const FLAG_RESERVED: u8 = 0x18;
const SIZE_MASK: u8 = 0x07;

/// Options for writing a bag of cells.
#[derive(Debug, Clone, Copy, Default)]
pub struct BocOptions {
    /// Append a CRC32C checksum of the whole encoding.
    pub crc32c: bool,
}

/// Serializes the tree under `root` with default options.
pub fn serialize(root: &Arc<Cell>) -> Result<Vec<u8>, CellError> {
    BagOfCells::with_root(root).serialize(BocOptions::default())
}

/// Deserializes a bag of cells and returns its root.
pub fn deserialize_root(bytes: &[u8]) -> Result<Arc<Cell>, CellError> {
    BagOfCells::deserialize(bytes)?.root_cell()
}

/// Serializes the tree under `root` and encodes it as standard base64.
pub fn to_base64(root: &Arc<Cell>) -> Result<String, CellError> {
    Ok(general_purpose::STANDARD.encode(serialize(root)?))
}

/// Decodes base64 text and deserializes it to the root cell.
///
/// Both the standard and the URL-safe alphabet are accepted.
pub fn from_base64(text: &str) -> Result<Arc<Cell>, CellError> {
    let text = text.trim();
    let bytes = match general_purpose::STANDARD.decode(text) {
        Ok(bytes) => bytes,
        Err(e) => general_purpose::URL_SAFE.decode(text).map_err(|_| e)?,
    };
    deserialize_root(&bytes)
}

impl BagOfCells {
    /// Encodes the cells reachable from the root.
    ///
    /// The root gets index 0, each distinct cell is written once, and every
    /// reference points forward.
    pub fn serialize(&self, options: BocOptions) -> Result<Vec<u8>, CellError> {
        let order = self.reachable()?;

        let mut position = vec![0u64; self.len()];
        for (pos, id) in order.iter().enumerate() {
            position[id.index()] = pos as u64;
        }

        let cell_count = order.len() as u64;
        let size = bytes_needed(cell_count);

        let mut cell_data = Vec::new();
        for id in &order {
            let cell = self.get(*id).ok_or(CellError::UnknownCell(*id))?;
            let children = self.children(*id).ok_or(CellError::UnknownCell(*id))?;
            cell_data.extend_from_slice(&cell.descriptors());
            cell_data.extend_from_slice(&cell.padded_data());
            for child in children {
                write_uint(&mut cell_data, position[child.index()], size);
            }
        }

        let tot_cells_size = cell_data.len() as u64;
        let off_bytes = bytes_needed(tot_cells_size);

        let mut flags = size as u8;
        if options.crc32c {
            flags |= FLAG_HAS_CRC32C;
        }

        let mut out = Vec::with_capacity(cell_data.len() + 32);
        out.extend_from_slice(&BOC_MAGIC.to_be_bytes());
        out.push(flags);
        out.push(off_bytes as u8);
        write_uint(&mut out, cell_count, size);
        write_uint(&mut out, 1, size);
        write_uint(&mut out, 0, size);
        write_uint(&mut out, tot_cells_size, off_bytes);
        write_uint(&mut out, 0, size);
        out.extend_from_slice(&cell_data);

        if options.crc32c {
            let crc = crc32c(&out);
            out.extend_from_slice(&crc.to_le_bytes());
        }

        debug!("serialized {} cells into {} bytes", cell_count, out.len());
        Ok(out)
    }

    /// Decodes and validates an encoding produced by [`BagOfCells::serialize`]
    /// or any compatible writer.
    pub fn deserialize(bytes: &[u8]) -> Result<Self, CellError> {
        let body = if bytes.len() > 4 && bytes[4] & FLAG_HAS_CRC32C != 0 {
            let (body, tail) = bytes.split_at(bytes.len() - 4);
            let stored = u32::from_le_bytes([tail[0], tail[1], tail[2], tail[3]]);
            let computed = crc32c(body);
            if stored != computed {
                return Err(CellError::Checksum { stored, computed });
            }
            body
        } else {
            bytes
        };

        let mut reader = Reader::new(body);
        let magic = reader.read_uint(4)? as u32;
        if magic != BOC_MAGIC {
            return Err(CellError::BadMagic(magic));
        }

        let flags = reader.read_byte()?;
        if flags & FLAG_RESERVED != 0 {
            return Err(CellError::Header("reserved flag bits set"));
        }
        let size = (flags & SIZE_MASK) as usize;
        if !(1..=4).contains(&size) {
            return Err(CellError::Header("reference size must be 1..=4 bytes"));
        }
        let off_bytes = reader.read_byte()? as usize;
        if !(1..=8).contains(&off_bytes) {
            return Err(CellError::Header("offset size must be 1..=8 bytes"));
        }

        let cell_count = reader.read_uint(size)?;
        let root_count = reader.read_uint(size)?;
        let absent = reader.read_uint(size)?;
        let tot_cells_size = reader.read_uint(off_bytes)?;

        if cell_count == 0 || root_count == 0 {
            return Err(CellError::NoRoot);
        }
        if root_count > 1 {
            return Err(CellError::MultipleRoots(root_count));
        }
        if absent != 0 {
            return Err(CellError::Header("absent cells are not supported"));
        }

        let root_index = reader.read_uint(size)?;
        if root_index >= cell_count {
            return Err(CellError::NoRoot);
        }

        let index = if flags & FLAG_HAS_IDX != 0 {
            let mut entries = Vec::new();
            for _ in 0..cell_count {
                let mut entry = reader.read_uint(off_bytes)?;
                if flags & FLAG_HAS_CACHE_BITS != 0 {
                    entry >>= 1;
                }
                entries.push(entry);
            }
            Some(entries)
        } else {
            None
        };

        let region_start = reader.pos;
        let mut records = Vec::with_capacity((cell_count as usize).min(body.len() / 2));
        for i in 0..cell_count as usize {
            let record = read_record(&mut reader, i, cell_count, size)?;
            if let Some(entries) = &index {
                if entries[i] != (reader.pos - region_start) as u64 {
                    return Err(CellError::IndexMismatch(i));
                }
            }
            records.push(record);
        }

        let actual = (reader.pos - region_start) as u64;
        if actual != tot_cells_size {
            return Err(CellError::SizeMismatch {
                declared: tot_cells_size,
                actual,
            });
        }
        if reader.remaining() != 0 {
            return Err(CellError::TrailingBytes(reader.remaining()));
        }

        // Build bottom-up: references only point forward, so walking the
        // records in reverse always finds the children already in the bag.
        let mut bag = BagOfCells::new();
        let mut ids: Vec<Option<CellId>> = vec![None; records.len()];
        for (i, record) in records.into_iter().enumerate().rev() {
            let children = record
                .refs
                .iter()
                .map(|r| {
                    ids[*r as usize].ok_or(CellError::BadReference {
                        cell: i,
                        target: *r,
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            let id = bag.add_with_descriptor(
                record.data,
                record.bit_len,
                &children,
                record.exotic,
                record.level_mask,
            )?;
            ids[i] = Some(id);
        }

        let root = ids[root_index as usize].ok_or(CellError::NoRoot)?;
        bag.set_root(root)?;

        debug!(
            "deserialized {} cells ({} distinct) from {} bytes",
            cell_count,
            bag.len(),
            bytes.len()
        );
        Ok(bag)
    }
}

struct Record {
    data: Vec<u8>,
    bit_len: usize,
    refs: Vec<u64>,
    exotic: bool,
    level_mask: u8,
}

fn read_record(
    reader: &mut Reader<'_>,
    i: usize,
    cell_count: u64,
    size: usize,
) -> Result<Record, CellError> {
    let d1 = reader.read_byte()?;
    let d2 = reader.read_byte()?;

    if d1 & 0x10 != 0 {
        return Err(CellError::StoredHashes(i));
    }
    let ref_count = (d1 & 0x07) as usize;
    if ref_count > MAX_REFS {
        return Err(CellError::TooManyRefs(ref_count));
    }

    let data_len = (d2 >> 1) as usize + (d2 & 1) as usize;
    let mut data = reader.take(data_len)?.to_vec();
    let bit_len = if d2 & 1 != 0 {
        // The last byte ends with a 1 bit followed by zeros.
        let last = data.last().copied().unwrap_or(0);
        if last == 0 {
            return Err(CellError::CompletionTag(i));
        }
        let tag = last.trailing_zeros() as usize;
        if let Some(byte) = data.last_mut() {
            *byte &= !(1u8 << tag);
        }
        (data_len - 1) * 8 + (7 - tag)
    } else {
        data_len * 8
    };

    let mut refs = Vec::with_capacity(ref_count);
    for _ in 0..ref_count {
        let target = reader.read_uint(size)?;
        if target <= i as u64 || target >= cell_count {
            return Err(CellError::BadReference { cell: i, target });
        }
        refs.push(target);
    }

    Ok(Record {
        data,
        bit_len,
        refs,
        exotic: d1 & 0x08 != 0,
        level_mask: d1 >> 5,
    })
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Reader { bytes, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], CellError> {
        if self.remaining() < n {
            return Err(CellError::Truncated(self.pos));
        }
        let out = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    fn read_byte(&mut self) -> Result<u8, CellError> {
        Ok(self.take(1)?[0])
    }

    fn read_uint(&mut self, n: usize) -> Result<u64, CellError> {
        Ok(self
            .take(n)?
            .iter()
            .fold(0u64, |acc, b| (acc << 8) | u64::from(*b)))
    }
}

fn write_uint(out: &mut Vec<u8>, value: u64, n: usize) {
    out.extend_from_slice(&value.to_be_bytes()[8 - n..]);
}

/// Minimal number of bytes holding `value`, at least one.
fn bytes_needed(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    bits.div_ceil(8).max(1)
}

/// CRC-32C (Castagnoli), reflected polynomial 0x82f63b78.
fn crc32c(data: &[u8]) -> u32 {
    let mut crc = !0u32;
    for byte in data {
        crc ^= u32::from(*byte);
        for _ in 0..8 {
            crc = if crc & 1 != 0 {
                (crc >> 1) ^ 0x82f6_3b78
            } else {
                crc >> 1
            };
        }
    }
    !crc
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(bytes: &[u8], bits: usize) -> Arc<Cell> {
        Arc::new(Cell::new(bytes.to_vec(), bits, vec![]).unwrap())
    }

    #[test]
    fn crc32c_check_value() {
        assert_eq!(crc32c(b"123456789"), 0xe306_9283);
    }

    #[test]
    fn bytes_needed_minimum_one() {
        assert_eq!(bytes_needed(0), 1);
        assert_eq!(bytes_needed(255), 1);
        assert_eq!(bytes_needed(256), 2);
    }

    #[test]
    fn single_empty_cell_layout() {
        let bytes = serialize(&Arc::new(Cell::empty())).unwrap();
        assert_eq!(
            bytes,
            vec![0xb5, 0xee, 0x9c, 0x72, 0x01, 0x01, 0x01, 0x01, 0x00, 0x02, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn partial_byte_cell_layout() {
        let bytes = serialize(&leaf(&[0xa0], 3)).unwrap();
        // header (9) + tot size + root index, then d1 d2 payload
        assert_eq!(&bytes[bytes.len() - 3..], &[0x00, 0x01, 0xb0]);

        let back = deserialize_root(&bytes).unwrap();
        assert_eq!(back.bit_len(), 3);
        assert_eq!(back.data(), &[0xa0]);
    }

    #[test]
    fn root_is_first_and_refs_point_forward() {
        let child = leaf(&[0x11], 8);
        let root = Arc::new(Cell::new(vec![0x22], 8, vec![child]).unwrap());
        let bytes = serialize(&root).unwrap();
        // root record: d1=1 ref, d2=2, payload 0x22, ref -> 1
        let cells = &bytes[bytes.len() - 7..];
        assert_eq!(cells, &[0x01, 0x02, 0x22, 0x01, 0x00, 0x02, 0x11]);
    }

    #[test]
    fn crc_round_trip_and_corruption() {
        let root = leaf(&[0xde, 0xad], 16);
        let bytes = BagOfCells::with_root(&root)
            .serialize(BocOptions { crc32c: true })
            .unwrap();
        assert_eq!(bytes[4] & FLAG_HAS_CRC32C, FLAG_HAS_CRC32C);
        assert_eq!(deserialize_root(&bytes).unwrap(), root);

        let mut corrupted = bytes.clone();
        let n = corrupted.len();
        corrupted[n - 6] ^= 0x01;
        assert!(matches!(
            deserialize_root(&corrupted),
            Err(CellError::Checksum { .. })
        ));
    }

    #[test]
    fn index_is_validated() {
        // Two cells with an index: root (1 ref) then leaf.
        let mut bytes = vec![0xb5, 0xee, 0x9c, 0x72, FLAG_HAS_IDX | 0x01, 0x01];
        bytes.extend_from_slice(&[0x02, 0x01, 0x00, 0x06, 0x00]);
        bytes.extend_from_slice(&[0x03, 0x06]); // end offsets
        bytes.extend_from_slice(&[0x01, 0x00, 0x01, 0x00, 0x02, 0x7f]);
        let bag = BagOfCells::deserialize(&bytes).unwrap();
        assert_eq!(bag.len(), 2);

        bytes[11] = 0x04;
        assert!(matches!(
            BagOfCells::deserialize(&bytes),
            Err(CellError::IndexMismatch(0))
        ));
    }

    #[test]
    fn rejects_back_reference() {
        // Cell 0 references itself.
        let bytes = vec![
            0xb5, 0xee, 0x9c, 0x72, 0x01, 0x01, 0x01, 0x01, 0x00, 0x03, 0x00, 0x01, 0x00, 0x00,
        ];
        assert!(matches!(
            BagOfCells::deserialize(&bytes),
            Err(CellError::BadReference { cell: 0, target: 0 })
        ));
    }

    #[test]
    fn rejects_empty_and_rootless() {
        let no_cells = vec![0xb5, 0xee, 0x9c, 0x72, 0x01, 0x01, 0x00, 0x01, 0x00, 0x00];
        assert!(matches!(
            BagOfCells::deserialize(&no_cells),
            Err(CellError::NoRoot)
        ));

        let no_roots = vec![0xb5, 0xee, 0x9c, 0x72, 0x01, 0x01, 0x01, 0x00, 0x00, 0x02, 0x00, 0x00];
        assert!(matches!(
            BagOfCells::deserialize(&no_roots),
            Err(CellError::NoRoot)
        ));

        let bad_root = vec![
            0xb5, 0xee, 0x9c, 0x72, 0x01, 0x01, 0x01, 0x01, 0x00, 0x02, 0x05, 0x00, 0x00,
        ];
        assert!(matches!(
            BagOfCells::deserialize(&bad_root),
            Err(CellError::NoRoot)
        ));
    }

    #[test]
    fn rejects_size_mismatch_and_trailing_bytes() {
        let mut wrong_size = serialize(&Arc::new(Cell::empty())).unwrap();
        wrong_size[9] = 0x03;
        assert!(matches!(
            BagOfCells::deserialize(&wrong_size),
            Err(CellError::SizeMismatch {
                declared: 3,
                actual: 2
            })
        ));

        let mut trailing = serialize(&Arc::new(Cell::empty())).unwrap();
        trailing.push(0x00);
        assert!(matches!(
            BagOfCells::deserialize(&trailing),
            Err(CellError::TrailingBytes(1))
        ));
    }

    #[test]
    fn rejects_bad_magic_and_truncation() {
        assert!(matches!(
            BagOfCells::deserialize(&[0xde, 0xad, 0xbe, 0xef, 0x01]),
            Err(CellError::BadMagic(0xdead_beef))
        ));
        assert!(matches!(
            BagOfCells::deserialize(&[0xb5, 0xee]),
            Err(CellError::Truncated(0))
        ));

        let mut cut = serialize(&leaf(&[0xaa, 0xbb], 16)).unwrap();
        cut.truncate(cut.len() - 1);
        assert!(matches!(
            BagOfCells::deserialize(&cut),
            Err(CellError::Truncated(offset)) if offset == cut.len() - 1
        ));
    }

    #[test]
    fn rejects_missing_completion_tag() {
        let bytes = vec![
            0xb5, 0xee, 0x9c, 0x72, 0x01, 0x01, 0x01, 0x01, 0x00, 0x03, 0x00, 0x00, 0x01, 0x00,
        ];
        assert!(matches!(
            BagOfCells::deserialize(&bytes),
            Err(CellError::CompletionTag(0))
        ));
    }

    #[test]
    fn base64_round_trip() {
        let root = Arc::new(Cell::new(vec![0x01, 0x02], 16, vec![leaf(&[0x03], 8)]).unwrap());
        let text = to_base64(&root).unwrap();
        assert_eq!(from_base64(&text).unwrap(), root);
        assert!(matches!(from_base64("%%%"), Err(CellError::Base64(_))));
    }

    #[test]
    fn base64_accepts_url_safe_alphabet() {
        let root = leaf(&[0xfb, 0xff, 0xbf], 24);
        let text = to_base64(&root).unwrap();
        assert_eq!(text, "te6ccgEBAQEABQAABvv/vw==");

        assert_eq!(from_base64("te6ccgEBAQEABQAABvv_vw==").unwrap(), root);
        assert!(matches!(
            from_base64("te6ccgEBAQEABQAABvv*vw=="),
            Err(CellError::Base64(_))
        ));
    }
}
