use crate::buffer::ExternalBuffer;
use crate::error::CodecError;

/// The external converter between config parameter cells and JSON.
///
/// Implementations treat both directions as pure functions of their input:
/// base64 bag-of-cells text in, JSON text out, and back. The returned
/// buffer may be owned by the implementation; callers hold it only for the
/// duration of one conversion.
pub trait ConfigCodec {
    /// Decodes parameter `param` from base64 cells into a JSON object keyed
    /// `"p<param>"`.
    fn boc_to_json(&self, boc: &str, param: i32) -> Result<ExternalBuffer, CodecError>;

    /// Encodes a JSON object keyed `"p<param>"` into base64 cells.
    fn json_to_boc(&self, json: &str, param: i32) -> Result<ExternalBuffer, CodecError>;
}

impl<C: ConfigCodec + ?Sized> ConfigCodec for Box<C> {
    fn boc_to_json(&self, boc: &str, param: i32) -> Result<ExternalBuffer, CodecError> {
        (**self).boc_to_json(boc, param)
    }

    fn json_to_boc(&self, json: &str, param: i32) -> Result<ExternalBuffer, CodecError> {
        (**self).json_to_boc(json, param)
    }
}
