use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Validates that a key version is at least 1
fn validate_key_version(s: &str) -> Result<u32, String> {
    let value: u32 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;

    if value == 0 {
        return Err("Key version must be at least 1".to_string());
    }
    Ok(value)
}

#[derive(Parser)]
#[command(name = "sharevault")]
#[command(about = "Store credentials split into secret shares across independent storage nodes")]
pub struct Cli {
    /// Settings file with the node list and sharing key
    #[arg(short, long, env = "SHAREVAULT_CONFIG", default_value = "sharevault.toml")]
    pub config: PathBuf,

    /// Log node calls and skipped records
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a sharing key to paste into the settings file
    Keygen {
        /// Version recorded in every share produced with this key
        #[arg(long, default_value_t = 1, value_parser = validate_key_version)]
        key_version: u32,
    },
    /// Store a credential; the password is read from stdin
    Add {
        #[arg(short, long)]
        service: String,

        #[arg(short, long)]
        username: String,
    },
    /// Print every recoverable credential
    List {
        /// Only credentials for this service (exact match)
        #[arg(short, long)]
        service: Option<String>,
    },
}
