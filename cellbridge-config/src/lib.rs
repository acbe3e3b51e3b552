//! Bridge between config parameter cells and their JSON form.
//!
//! The actual conversion is done by an external [`ConfigCodec`]; this crate
//! serializes the cell side, keys the JSON side as `"p<index>"`, and makes
//! sure every buffer the codec hands back is released exactly once.

mod bridge;
mod buffer;
mod codec;
mod command;
mod error;

pub use bridge::{ConfigParamBridge, param_key};
pub use buffer::ExternalBuffer;
pub use codec::ConfigCodec;
pub use command::CommandCodec;
pub use error::{CodecError, ConfigError, ResourceError};
