use thiserror::Error;

use crate::bag::CellId;

/// Structural failure while building, importing or (de)serializing cells.
#[derive(Debug, Error)]
pub enum CellError {
    #[error("cell payload of {0} bits exceeds 1023")]
    TooManyBits(usize),
    #[error("cell has {0} references, at most 4 allowed")]
    TooManyRefs(usize),
    #[error("invalid level mask {0}")]
    LevelMask(u8),
    #[error("payload is {got} bytes, expected {expected} for {bits} bits")]
    DataLength {
        bits: usize,
        expected: usize,
        got: usize,
    },
    #[error("unknown cell {0}")]
    UnknownCell(CellId),

    /// Empty bag, zero roots, or a root that does not resolve to a cell.
    #[error("bag of cells has no resolvable root")]
    NoRoot,
    #[error("bag of cells declares {0} roots, exactly one expected")]
    MultipleRoots(u64),
    #[error("bad bag-of-cells magic {0:08x}")]
    BadMagic(u32),
    #[error("invalid bag-of-cells header: {0}")]
    Header(&'static str),
    #[error("bag of cells truncated at offset {0}")]
    Truncated(usize),
    #[error("cell {cell} references {target}, which is not a later cell")]
    BadReference { cell: usize, target: u64 },
    #[error("cell {0} has an invalid completion tag")]
    CompletionTag(usize),
    #[error("cell {0} carries stored hashes, which are not supported")]
    StoredHashes(usize),
    #[error("cell data occupies {actual} bytes, header declares {declared}")]
    SizeMismatch { declared: u64, actual: u64 },
    #[error("index entry for cell {0} does not match its offset")]
    IndexMismatch(usize),
    #[error("crc32c mismatch: stored {stored:08x}, computed {computed:08x}")]
    Checksum { stored: u32, computed: u32 },
    #[error("{0} trailing bytes after bag of cells")]
    TrailingBytes(usize),
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),
}
