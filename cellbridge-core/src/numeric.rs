//! Hex and fixed-width byte transcoding for unbounded integers.

use num_bigint::{BigInt, BigUint, Sign};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NumericError {
    #[error("missing 0x prefix in {0:?}")]
    MissingPrefix(String),
    #[error("no hex digits after 0x prefix")]
    NoDigits,
    #[error("invalid hex digit {digit:?} at position {position}")]
    InvalidDigit { digit: char, position: usize },
    #[error("non-negative integer expected")]
    Negative,
    #[error("integer does not fit into {0} bytes")]
    Overflow(usize),
}

impl NumericError {
    /// True for out-of-range values, false for malformed text.
    pub fn is_range(&self) -> bool {
        matches!(self, NumericError::Negative | NumericError::Overflow(_))
    }
}

/// Parses a `0x`-prefixed hex string into a non-negative integer.
///
/// Every character after the prefix must be a hex digit; partial parses are
/// rejected.
pub fn hex_to_bigint(text: &str) -> Result<BigInt, NumericError> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .ok_or_else(|| NumericError::MissingPrefix(text.to_string()))?;
    if digits.is_empty() {
        return Err(NumericError::NoDigits);
    }
    if let Some((i, digit)) = digits.char_indices().find(|(_, c)| !c.is_ascii_hexdigit()) {
        return Err(NumericError::InvalidDigit {
            digit,
            position: i + 2,
        });
    }

    let magnitude = BigUint::parse_bytes(digits.as_bytes(), 16).ok_or(NumericError::NoDigits)?;
    Ok(BigInt::from(magnitude))
}

/// Exports the big-endian magnitude of `n` into exactly `width` bytes.
pub fn bigint_to_bytes(n: &BigInt, width: usize) -> Result<Vec<u8>, NumericError> {
    let (sign, magnitude) = n.to_bytes_be();
    if sign == Sign::Minus {
        return Err(NumericError::Negative);
    }

    let significant = match magnitude.iter().position(|b| *b != 0) {
        Some(first) => &magnitude[first..],
        None => &[],
    };
    if significant.len() > width {
        return Err(NumericError::Overflow(width));
    }

    let mut out = vec![0u8; width];
    out[width - significant.len()..].copy_from_slice(significant);
    Ok(out)
}

/// Fixed-size variant of [`bigint_to_bytes`].
pub fn bigint_to_array<const N: usize>(n: &BigInt) -> Result<[u8; N], NumericError> {
    let bytes = bigint_to_bytes(n, N)?;
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes);
    Ok(out)
}
