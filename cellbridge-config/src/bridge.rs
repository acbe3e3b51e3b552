use std::sync::Arc;

use cellbridge_core::{Cell, boc};
use serde_json::{Map, Value};
use tracing::{debug, instrument};

use crate::codec::ConfigCodec;
use crate::error::ConfigError;

/// JSON key under which the codec exchanges parameter `param`.
pub fn param_key(param: i32) -> String {
    format!("p{}", param)
}

/// Converts config parameter cells to JSON and back through a [`ConfigCodec`].
///
/// The bridge only handles keying and buffer lifetime; the meaning of the
/// JSON payload is entirely the codec's business. Buffers returned by the
/// codec are released before each call returns, whichever way it returns.
pub struct ConfigParamBridge<C> {
    codec: C,
}

impl<C: ConfigCodec> ConfigParamBridge<C> {
    pub fn new(codec: C) -> Self {
        Self { codec }
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Decodes the parameter stored in `cell` and returns its JSON value.
    #[instrument(skip(self, cell))]
    pub fn boc_to_json(&self, cell: &Arc<Cell>, param: i32) -> Result<Value, ConfigError> {
        let boc = boc::to_base64(cell)?;
        let buffer = self.codec.boc_to_json(&boc, param)?;
        let reply: Value = serde_json::from_str(buffer.as_str()?)?;

        let key = param_key(param);
        let value = match reply {
            Value::Object(mut map) => map.remove(&key),
            _ => None,
        };
        debug!(found = value.is_some(), "decoded config parameter");
        value.ok_or(ConfigError::MissingKey(key))
    }

    /// Encodes `value` as parameter `param` and returns the resulting cell.
    #[instrument(skip(self, value))]
    pub fn json_to_boc(&self, value: Value, param: i32) -> Result<Arc<Cell>, ConfigError> {
        let mut wrapped = Map::new();
        wrapped.insert(param_key(param), value);
        let json = Value::Object(wrapped).to_string();

        let buffer = self.codec.json_to_boc(&json, param)?;
        let cell = boc::from_base64(buffer.as_str()?)?;
        debug!(hash = %cell.hash(), "encoded config parameter");
        Ok(cell)
    }
}
