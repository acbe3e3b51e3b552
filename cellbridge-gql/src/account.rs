use std::sync::Arc;

use cellbridge_core::numeric::hex_to_bigint;
use cellbridge_core::{Cell, CellError, NumericError, boc};
use num_bigint::BigInt;
use serde_json::Value;

use crate::error::GqlError;

const INFO_PATH: [&str; 4] = ["data", "blockchain", "account", "info"];

/// Account state as returned by the indexing service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountInfo {
    /// Base64 bag of cells of the account code.
    pub code: String,
    /// Base64 bag of cells of the account data.
    pub data: String,
    /// `0x`-prefixed hex balance.
    pub balance: String,
}

impl AccountInfo {
    /// Extracts the account from a response at `data.blockchain.account.info`.
    ///
    /// Every field is required and must be a string; nothing is defaulted.
    pub fn from_response(response: &Value) -> Result<Self, GqlError> {
        if let Some(errors) = response.get("errors").and_then(Value::as_array) {
            if !errors.is_empty() {
                let messages: Vec<&str> = errors
                    .iter()
                    .map(|e| e.get("message").and_then(Value::as_str).unwrap_or("unknown error"))
                    .collect();
                return Err(GqlError::Remote(messages.join("; ")));
            }
        }

        let mut node = response;
        let mut path = String::new();
        for key in INFO_PATH {
            if !path.is_empty() {
                path.push('.');
            }
            path.push_str(key);
            node = match node.get(key) {
                None | Some(Value::Null) => {
                    return Err(GqlError::Shape {
                        path,
                        reason: "missing",
                    });
                }
                Some(next) => next,
            };
        }
        if !node.is_object() {
            return Err(GqlError::Shape {
                path,
                reason: "expected an object",
            });
        }

        Ok(AccountInfo {
            code: string_field(node, &path, "code")?,
            data: string_field(node, &path, "data")?,
            balance: string_field(node, &path, "balance")?,
        })
    }

    pub fn code_cell(&self) -> Result<Arc<Cell>, CellError> {
        boc::from_base64(&self.code)
    }

    pub fn data_cell(&self) -> Result<Arc<Cell>, CellError> {
        boc::from_base64(&self.data)
    }

    pub fn balance_int(&self) -> Result<BigInt, NumericError> {
        hex_to_bigint(&self.balance)
    }
}

fn string_field(node: &Value, path: &str, key: &str) -> Result<String, GqlError> {
    match node.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(GqlError::Shape {
            path: format!("{}.{}", path, key),
            reason: "expected a string",
        }),
        None => Err(GqlError::Shape {
            path: format!("{}.{}", path, key),
            reason: "missing",
        }),
    }
}
