//! Multisignature registration CLI
//!
//! A command-line interface for exercising the registration engine.

use clap::{Parser, Subcommand};
use multisig_ledger::cli::{self, AppState};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "multisig")]
#[command(author = "Darshan")]
#[command(version = "0.1.0")]
#[command(about = "Multisignature account registration engine", long_about = None)]
struct Cli {
    /// Data directory for snapshots
    #[arg(short, long, default_value = ".multisig_data")]
    data_dir: PathBuf,

    /// Engine configuration file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate key pairs
    Keygen {
        /// Number of key pairs
        #[arg(short, long, default_value = "1")]
        count: u32,
    },

    /// Validate a keysgroup
    Validate {
        /// Sender public key (hex)
        #[arg(short, long)]
        sender: String,

        /// Required signatures
        #[arg(short, long)]
        min: u8,

        /// Pending lifetime in hours
        #[arg(short, long, default_value = "24")]
        lifetime: u8,

        /// Members, e.g. "+<key1>,+<key2>"
        #[arg(short, long, value_delimiter = ',')]
        keys: Vec<String>,
    },

    /// Run a registration end to end and save the result
    Demo {
        /// Keysgroup size
        #[arg(short, long, default_value = "2")]
        members: u8,

        /// Required signatures
        #[arg(long, default_value = "2")]
        min: u8,
    },

    /// Show accounts and pending registrations
    Status,

    /// Remove expired registrations
    Sweep,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = cli::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Keygen { count } => {
            cli::cmd_keygen(count)?;
        }

        Commands::Validate {
            sender,
            min,
            lifetime,
            keys,
        } => {
            cli::cmd_validate(&config, &sender, min, lifetime, &keys)?;
        }

        Commands::Demo { members, min } => {
            let state = AppState::new(cli.data_dir, config)?;
            cli::cmd_demo(&state, members, min)?;
        }

        Commands::Status => {
            let state = AppState::new(cli.data_dir, config)?;
            cli::cmd_status(&state)?;
        }

        Commands::Sweep => {
            let state = AppState::new(cli.data_dir, config)?;
            cli::cmd_sweep(&state)?;
        }
    }

    Ok(())
}
