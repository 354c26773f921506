//! Command-line interface for the BobCoin ledger
//!
//! Invokes token and escrow functions against local state files and
//! converts between decimal and raw unit amounts.

use anyhow::Result;
use bob_cli::commands;
use bob_cli::CliConfig;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "bob")]
#[command(about = "BobCoin - token ledger and milestone escrow", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file path
    #[arg(short, long, global = true, default_value = ".bob/config.toml")]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Invoke a ledger or escrow function, e.g. `invoke Mint alice 10`
    Invoke {
        /// Function name
        function: String,

        /// Positional arguments
        args: Vec<String>,
    },

    /// Convert a decimal amount to raw units
    Parse {
        /// Decimal amount, e.g. 12.5
        amount: String,
    },

    /// Convert raw units to a decimal amount
    Format {
        /// Raw unscaled integer
        units: String,
    },

    /// Check the total supply against the sum of balances
    Audit,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = CliConfig::resolve(&cli.config)?;

    let log_level = if cli.verbose {
        "debug".to_string()
    } else {
        config.log_level.clone()
    };
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Invoke { function, args } => {
            print_json(&commands::invoke(&config, &function, args)?)?;
        }
        Commands::Parse { amount } => {
            println!("{}", commands::parse(&amount)?);
        }
        Commands::Format { units } => {
            println!("{}", commands::format(&units)?);
        }
        Commands::Audit => {
            let audit = commands::audit(&config)?;
            print_json(&audit)?;
            if !audit.consistent {
                anyhow::bail!("total supply does not match the sum of balances");
            }
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
