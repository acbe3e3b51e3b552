use cellbridge_config::ConfigError;
use cellbridge_core::{CellError, NumericError};
use cellbridge_gql::GqlError;
use thiserror::Error;

use crate::stack::StackError;

/// Failure classes a caller can branch on without looking at messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed, cyclic or unresolved cell graph.
    Structural,
    /// Invalid hex or JSON text.
    Parse,
    /// Integer out of the target width, or negative where it must not be.
    Range,
    MissingKey,
    Shape,
    Transport,
    Codec,
    Underflow,
    Resource,
    Type,
    UnknownWord,
}

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error(transparent)]
    Stack(#[from] StackError),

    #[error(transparent)]
    Cell(#[from] CellError),

    #[error(transparent)]
    Numeric(#[from] NumericError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("account fetch failed: {0}")]
    Fetch(#[from] GqlError),

    #[error("invalid JSON operand: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown word: {0}")]
    UnknownWord(String),
}

impl BridgeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BridgeError::Stack(StackError::Underflow { .. }) => ErrorKind::Underflow,
            BridgeError::Stack(StackError::TypeMismatch { .. }) => ErrorKind::Type,
            BridgeError::Stack(StackError::OutOfRange { .. }) => ErrorKind::Range,
            BridgeError::Cell(_) => ErrorKind::Structural,
            BridgeError::Numeric(e) if e.is_range() => ErrorKind::Range,
            BridgeError::Numeric(_) => ErrorKind::Parse,
            BridgeError::Config(e) => match e {
                ConfigError::Cell(_) => ErrorKind::Structural,
                ConfigError::Json(_) => ErrorKind::Parse,
                ConfigError::MissingKey(_) => ErrorKind::MissingKey,
                ConfigError::Codec(_) => ErrorKind::Codec,
                ConfigError::Resource(_) => ErrorKind::Resource,
            },
            BridgeError::Fetch(GqlError::Shape { .. }) => ErrorKind::Shape,
            BridgeError::Fetch(_) => ErrorKind::Transport,
            BridgeError::Json(_) => ErrorKind::Parse,
            BridgeError::UnknownWord(_) => ErrorKind::UnknownWord,
        }
    }
}
