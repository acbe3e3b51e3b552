use cellbridge_core::CellError;
use thiserror::Error;

/// Misuse of an external buffer handle.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResourceError {
    #[error("external buffer already released")]
    AlreadyReleased,
    #[error("external buffer was never acquired")]
    NotAcquired,
}

/// Failure reported by a [`ConfigCodec`](crate::ConfigCodec) implementation.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to run config codec: {0}")]
    Io(#[from] std::io::Error),

    #[error("config codec exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    #[error("config codec produced non-UTF-8 output")]
    Output(#[from] std::string::FromUtf8Error),

    #[error("config codec rejected parameter {param}: {reason}")]
    Rejected { param: i32, reason: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cell error: {0}")]
    Cell(#[from] CellError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config codec reply has no key {0:?}")]
    MissingKey(String),

    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("resource error: {0}")]
    Resource(#[from] ResourceError),
}
