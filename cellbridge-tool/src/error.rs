use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error(
        "GraphQL endpoint not set. Pass --endpoint, set CELLBRIDGE_ENDPOINT or configure ~/.config/cellbridge/config.toml"
    )]
    EndpointNotFound,

    #[error(
        "no config codec. Pass --codec, set CELLBRIDGE_CODEC or add [codec] program to the config file"
    )]
    CodecNotConfigured,

    #[error("Cell error: {0}")]
    Cell(#[from] cellbridge_core::CellError),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid address: {0}")]
    Address(#[from] cellbridge_core::AddressError),

    #[error("Unexpected result on stack: {0}")]
    Result(String),
}
