use std::path::{Path, PathBuf};

use cellbridge_config::{CodecError, CommandCodec, ConfigCodec, ExternalBuffer};
use serde::Deserialize;
use tracing::warn;

use crate::error::ToolError;

pub const ENDPOINT_ENV: &str = "CELLBRIDGE_ENDPOINT";
pub const CODEC_ENV: &str = "CELLBRIDGE_CODEC";

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    pub endpoint: Option<String>,
    #[serde(default)]
    pub codec: CodecConfig,
}

#[derive(Debug, Deserialize, Default)]
pub struct CodecConfig {
    pub program: Option<PathBuf>,
    #[serde(default)]
    pub args: Vec<String>,
}

fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("cellbridge").join("config.toml"))
}

/// Loads the config file.
///
/// An explicit path must exist and parse. The default location is optional
/// and falls back to an empty config when missing or unreadable.
pub fn load_config(explicit: Option<&Path>) -> Result<Config, ToolError> {
    if let Some(path) = explicit {
        let content = std::fs::read_to_string(path)?;
        return Ok(toml::from_str(&content)?);
    }

    let Some(path) = config_path() else {
        return Ok(Config::default());
    };
    let Ok(content) = std::fs::read_to_string(&path) else {
        return Ok(Config::default());
    };

    match toml::from_str(&content) {
        Ok(config) => Ok(config),
        Err(e) => {
            warn!(path = %path.display(), "ignoring unreadable config file: {}", e);
            Ok(Config::default())
        }
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Endpoint precedence: command line, then environment, then config file.
pub fn resolve_endpoint(cli: Option<String>, config: &Config) -> Result<String, ToolError> {
    pick_endpoint(cli, env_value(ENDPOINT_ENV), config)
}

fn pick_endpoint(
    cli: Option<String>,
    env: Option<String>,
    config: &Config,
) -> Result<String, ToolError> {
    cli.filter(|v| !v.is_empty())
        .or(env)
        .or_else(|| config.endpoint.clone().filter(|v| !v.is_empty()))
        .ok_or(ToolError::EndpointNotFound)
}

/// Codec program precedence: command line, then environment, then config file.
///
/// Extra arguments from the config file only apply to the program named there.
/// Without any program every conversion fails with a hint on how to set one.
pub fn resolve_codec(cli: Option<PathBuf>, config: &Config) -> Box<dyn ConfigCodec> {
    match pick_codec(cli, env_value(CODEC_ENV).map(PathBuf::from), config) {
        Some(codec) => Box::new(codec),
        None => Box::new(Unconfigured),
    }
}

struct Unconfigured;

impl Unconfigured {
    fn reject(param: i32) -> CodecError {
        CodecError::Rejected {
            param,
            reason: ToolError::CodecNotConfigured.to_string(),
        }
    }
}

impl ConfigCodec for Unconfigured {
    fn boc_to_json(&self, _boc: &str, param: i32) -> Result<ExternalBuffer, CodecError> {
        Err(Self::reject(param))
    }

    fn json_to_boc(&self, _json: &str, param: i32) -> Result<ExternalBuffer, CodecError> {
        Err(Self::reject(param))
    }
}

fn pick_codec(cli: Option<PathBuf>, env: Option<PathBuf>, config: &Config) -> Option<CommandCodec> {
    if let Some(program) = cli.or(env) {
        return Some(CommandCodec::new(program));
    }
    let program = config.codec.program.clone()?;
    Some(CommandCodec::with_args(program, config.codec.args.clone()))
}
