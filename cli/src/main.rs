//! ChainActions CLI: stream user actions from EVM contracts and Solana programs.
//!
//! # Commands
//! ```text
//! chainactions evm        --config <file.yaml>
//! chainactions solana     --config <file.yaml>
//! chainactions classify   <topic0>
//! chainactions signatures [--json]
//! ```

use anyhow::{Context, Result};
use chainactions_observability::{init_tracing, LogConfig};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cmd_inspect;
mod cmd_run;
mod config;
mod sink;

use config::AppConfig;

#[derive(Parser)]
#[command(
    name = "chainactions",
    about = "Classify on-chain events into user actions and print them as JSON lines",
    long_about = "
ChainActions CLI: watch an EVM token contract or a Solana program and emit one
JSON line per transfer, mint, burn or account update.

ENVIRONMENT VARIABLES (override the config file):
  CHAINACTIONS_NETWORK             ethereum | arbitrum | solana
  CHAINACTIONS_FILTER_ADDRESS      EVM contract whose logs are tracked
  CHAINACTIONS_TOKEN_SYMBOL        Token symbol attached to EVM actions
  CHAINACTIONS_TOKEN_DECIMALS      Token decimals attached to EVM actions
  CHAINACTIONS_EVM_WS_URL          EVM websocket endpoint
  CHAINACTIONS_SOLANA_WS_URL       Solana websocket endpoint
  CHAINACTIONS_SOLANA_PROGRAM_ID   Program whose accounts are watched
",
    version
)]
struct Cli {
    /// Log level, overrides the config file (trace | debug | info | warn | error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Emit JSON structured logs on stderr
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stream actions from an EVM contract's logs
    Evm {
        /// YAML config file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Stream account updates of a Solana program
    Solana {
        /// YAML config file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Classify a single event signature word (topic0)
    Classify {
        /// 0x-prefixed 32-byte hex word
        topic0: String,
    },

    /// List the known event signatures
    Signatures {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    fn log_config(&self, base: LogConfig) -> LogConfig {
        LogConfig {
            level: self.log_level.clone().unwrap_or(base.level),
            json: self.json_logs || base.json,
            ..base
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Evm { config } => {
            let config = AppConfig::load(config.as_deref())?;
            init_tracing(&cli.log_config(config.log.clone())).context("installing log subscriber")?;
            cmd_run::evm(config).await
        }

        Commands::Solana { config } => {
            let config = AppConfig::load(config.as_deref())?;
            init_tracing(&cli.log_config(config.log.clone())).context("installing log subscriber")?;
            cmd_run::solana(config).await
        }

        Commands::Classify { topic0 } => {
            init_tracing(&cli.log_config(LogConfig::default())).context("installing log subscriber")?;
            cmd_inspect::classify(topic0)
        }

        Commands::Signatures { json } => cmd_inspect::signatures(*json),
    }
}
