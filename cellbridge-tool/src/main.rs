mod config;
mod error;
mod output;

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use cellbridge_core::{StdAddress, boc};
use cellbridge_gql::GqlClient;
use cellbridge_stack::{Bridge, OperandStack, StackValue, VecStack};
use clap::{ArgAction, Parser, Subcommand};
use num_bigint::{BigInt, Sign};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::{load_config, resolve_codec, resolve_endpoint};
use crate::error::ToolError;
use crate::output::render_account;

#[derive(Parser)]
#[command(name = "cellbridge", version)]
#[command(about = "Config parameter and account state tools for bags of cells", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to the config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Config codec program
    #[arg(long, global = true)]
    codec: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode a config parameter from base64 cells to JSON
    CfgToJson {
        /// Config parameter index
        #[arg(short, long, allow_negative_numbers = true)]
        param: i32,

        /// Input file, or - for stdin
        input: Option<PathBuf>,
    },

    /// Encode a config parameter from JSON to base64 cells
    JsonToCfg {
        /// Config parameter index
        #[arg(short, long, allow_negative_numbers = true)]
        param: i32,

        /// Input file, or - for stdin
        input: Option<PathBuf>,
    },

    /// Fetch code, data and balance of an account
    Account {
        /// Raw address, <workchain>:<64 hex digits>
        address: String,

        /// GraphQL endpoint URL
        #[arg(long)]
        endpoint: Option<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(2)
        }
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let bridge = Bridge::new(resolve_codec(cli.codec, &config), GqlClient::new());
    let mut stack = VecStack::new();

    match cli.command {
        Command::CfgToJson { param, input } => {
            let cell = boc::from_base64(&read_input(input.as_deref())?)?;
            stack.push(StackValue::Cell(cell));
            stack.push(StackValue::from(param));
            bridge.execute("cfg_boc_to_json", &mut stack)?;
            println!("{}", stack.pop_string()?);
        }
        Command::JsonToCfg { param, input } => {
            stack.push(StackValue::String(read_input(input.as_deref())?));
            stack.push(StackValue::from(param));
            bridge.execute("json_to_cfg_boc", &mut stack)?;
            println!("{}", boc::to_base64(&stack.pop_cell()?)?);
        }
        Command::Account { address, endpoint } => {
            let endpoint = resolve_endpoint(endpoint, &config)?;
            let parsed: StdAddress = address.parse()?;
            push_account_operands(&mut stack, &parsed, endpoint);
            info!(%address, "fetching account");
            bridge.execute("fetch_account", &mut stack)?;
            print!("{}", render_account(&stack.pop()?)?);
        }
    }

    Ok(())
}

/// Pushes `( wc addr url )` for `fetch_account`.
fn push_account_operands(stack: &mut VecStack, address: &StdAddress, endpoint: String) {
    stack.push(StackValue::from(i32::from(address.workchain)));
    stack.push(StackValue::Int(BigInt::from_bytes_be(Sign::Plus, &address.address)));
    stack.push(StackValue::String(endpoint));
}

/// Reads the whole input, from stdin when `path` is absent or `-`.
fn read_input(path: Option<&Path>) -> Result<String, ToolError> {
    match path {
        Some(p) if p != Path::new("-") => Ok(std::fs::read_to_string(p)?),
        _ => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}
