//! counterdash CLI: inspect and exercise the counter dashboard core.
//!
//! # Commands
//! ```text
//! counterdash normalize <addr>
//! counterdash equals    <a> <b>
//! counterdash decode    <json> [--strict]
//! counterdash reason    <json>
//! counterdash history   --file <events.json> [--ownership <events.json>] [--config <yaml>] [--json]
//! counterdash demo      [--config <yaml>]
//! counterdash selector  <name>
//! counterdash info
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use counterdash_client::DashboardConfig;
use counterdash_observability::{init_tracing, LogConfig};
use std::path::{Path, PathBuf};

mod cmd_decode;
mod cmd_demo;
mod cmd_history;

#[derive(Parser)]
#[command(
    name = "counterdash",
    about = "Counter dashboard core: address normalization, value decoding, event history",
    long_about = "
counterdash: the logic behind a Starknet counter dashboard, on the command line.
Values are given as JSON; anything that is not valid JSON is taken as a string.

ENVIRONMENT VARIABLES:
  RUST_LOG    Log filter, overrides --verbose and the config's log level
",
    version
)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Canonical 64-digit hex form of an address
    Normalize {
        /// Address as hex string, decimal string or JSON integer
        address: String,
    },

    /// Compare two addresses after normalization
    Equals { a: String, b: String },

    /// Decode a contract value for display
    Decode {
        /// JSON value, e.g. '{"low": 3, "high": 9}'
        value: String,
        /// Full-precision decode that fails instead of degrading
        #[arg(long)]
        strict: bool,
    },

    /// Decode a CounterChanged reason
    Reason {
        /// JSON value, e.g. '{"variant": {"Reset": {}}}'
        value: String,
    },

    /// Render a CounterChanged history from a JSON file
    History {
        /// CounterChanged events: an array, or an object with an "events" array
        #[arg(short, long)]
        file: PathBuf,
        /// OwnershipTransferred events, same format
        #[arg(long)]
        ownership: Option<PathBuf>,
        /// Dashboard config (display caps)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Scripted session against an in-memory counter contract
    Demo {
        /// Dashboard config
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Starknet selector of an event or function name
    Selector { name: String },

    /// Show version and capabilities
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut log = LogConfig::default();
    if cli.verbose {
        log.level = "debug".into();
    }
    log.json = cli.log_json;

    match cli.command {
        Commands::Normalize { address } => {
            init_tracing(&log);
            cmd_decode::normalize(&address)
        }

        Commands::Equals { a, b } => {
            init_tracing(&log);
            cmd_decode::equals(&a, &b)
        }

        Commands::Decode { value, strict } => {
            init_tracing(&log);
            cmd_decode::decode(&value, strict)
        }

        Commands::Reason { value } => {
            init_tracing(&log);
            cmd_decode::reason(&value)
        }

        Commands::History { file, ownership, config, json } => {
            init_tracing(&log);
            let config = load_config(config.as_deref())?;
            cmd_history::run(&file, ownership.as_deref(), &config, json)
        }

        Commands::Demo { config } => {
            let config = load_config(config.as_deref())?;
            let mut log = if cli.verbose || cli.log_json { log } else { config.log.clone() };
            log.json |= cli.log_json;
            init_tracing(&log);
            cmd_demo::run(config).await
        }

        Commands::Selector { name } => {
            println!("{}", counterdash_core::sn_keccak(&name));
            Ok(())
        }

        Commands::Info => cmd_info(),
    }
}

fn load_config(path: Option<&Path>) -> Result<DashboardConfig> {
    match path {
        Some(p) => DashboardConfig::load(p)
            .with_context(|| format!("loading config {}", p.display())),
        None => Ok(DashboardConfig::default()),
    }
}

fn cmd_info() -> Result<()> {
    let config = DashboardConfig::default();
    println!("counterdash v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Capabilities:");
    println!("  ✓ Address normalization    (integer, hex, decimal → 64-digit hex)");
    println!("  ✓ Display value decoding   (felts, u256 limbs, wrappers, big numbers)");
    println!("  ✓ Strict value decoding    (full 256-bit precision)");
    println!("  ✓ Change reason decoding   (Cairo enum wrappers, keys, strings)");
    println!("  ✓ Event history rendering  (CounterChanged, OwnershipTransferred)");
    println!("  ✓ Receipt-driven refresh   (timeout + cancellation)");
    println!();
    println!("Contract:                    {}", config.contract);
    println!("Reset fee:                   {} {} (base units)", config.reset_fee, config.fee_token);
    println!(
        "Display caps:                {} counter changes, {} ownership transfers",
        config.display.counter_changes, config.display.ownership_transfers
    );
    Ok(())
}
