use std::fmt;
use std::str::FromStr;

use num_bigint::BigInt;
use thiserror::Error;

use crate::numeric::{NumericError, bigint_to_array};

#[derive(Debug, Error)]
pub enum AddressError {
    #[error("expected <workchain>:<64 hex digits>, got {0:?}")]
    Format(String),
    #[error("invalid workchain: {0}")]
    Workchain(#[from] std::num::ParseIntError),
    #[error("invalid account id: {0}")]
    AccountId(#[from] hex::FromHexError),
    #[error(transparent)]
    Numeric(#[from] NumericError),
}

/// A standard account address: workchain id plus 256-bit account id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StdAddress {
    pub workchain: i8,
    pub address: [u8; 32],
}

impl StdAddress {
    pub fn new(workchain: i8, address: [u8; 32]) -> Self {
        Self { workchain, address }
    }

    /// Builds an address from an integer account id.
    ///
    /// The id must be non-negative and fit into 32 bytes.
    pub fn from_int(workchain: i8, account: &BigInt) -> Result<Self, AddressError> {
        Ok(Self::new(workchain, bigint_to_array::<32>(account)?))
    }
}

/// Raw form `<workchain>:<hex account id>`.
impl fmt::Display for StdAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.workchain, hex::encode(self.address))
    }
}

impl FromStr for StdAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (workchain, account) = s
            .split_once(':')
            .ok_or_else(|| AddressError::Format(s.to_string()))?;
        if account.len() != 64 {
            return Err(AddressError::Format(s.to_string()));
        }

        let mut address = [0u8; 32];
        hex::decode_to_slice(account, &mut address)?;
        Ok(Self::new(workchain.parse()?, address))
    }
}
