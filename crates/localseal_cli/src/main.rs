//! LocalSeal CLI
//!
//! Command-line tools for encrypting files with the local protection key.
//!
//! # Commands
//!
//! - `encrypt` - Encrypt a file
//! - `decrypt` - Decrypt a file
//! - `status` - Show which keys are present and the tier they were made under

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// LocalSeal command-line encryption tools.
#[derive(Parser)]
#[command(name = "localseal")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding the vault and settings files
    #[arg(global = true, short, long, default_value = ".localseal")]
    state_dir: PathBuf,

    /// Host platform level (overrides LOCALSEAL_PLATFORM_LEVEL)
    #[arg(global = true, short, long)]
    platform_level: Option<u32>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt a file
    Encrypt {
        /// File to encrypt
        input: PathBuf,

        /// Where to write the encrypted stream
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Decrypt a file
    Decrypt {
        /// Encrypted file
        input: PathBuf,

        /// Where to write the plaintext
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Show key status without generating anything
    Status {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Encrypt { input, output } => {
            let codec = commands::state::open(&cli.state_dir, cli.platform_level)?;
            commands::encrypt::run(&codec, &input, &output)?;
        }
        Commands::Decrypt { input, output } => {
            let codec = commands::state::open(&cli.state_dir, cli.platform_level)?;
            commands::decrypt::run(&codec, &input, &output)?;
        }
        Commands::Status { format } => {
            let codec = commands::state::open(&cli.state_dir, cli.platform_level)?;
            commands::status::run(codec.keys(), &format)?;
        }
        Commands::Version => {
            println!("LocalSeal CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("LocalSeal Core v{}", localseal_core::VERSION);
        }
    }

    Ok(())
}
