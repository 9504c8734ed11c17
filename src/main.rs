use std::io::{self, BufRead};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use zeroize::Zeroizing;

use sharevault::cli::{Cli, Commands};
use sharevault::commands::{
    add_credential, format_credential, generate_key, list_credentials, open_vault, report_warnings,
};

/// Read a password securely from stdin (hidden input when TTY available)
fn read_password() -> Result<Zeroizing<String>> {
    if atty::is(atty::Stream::Stdin) {
        eprintln!("Enter password:");
        rpassword::read_password()
            .map(Zeroizing::new)
            .context("Failed to read password from stdin")
    } else {
        // Non-interactive mode (piped input) - read one line
        let stdin = io::stdin();
        let mut handle = stdin.lock();
        let mut password = Zeroizing::new(String::new());
        handle
            .read_line(&mut password)
            .context("Failed to read password from stdin")?;
        Ok(Zeroizing::new(
            password.trim_end_matches(['\r', '\n']).to_string(),
        ))
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "sharevault=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Keygen { key_version } => {
            let phrase = generate_key(key_version)?;
            println!("[key]");
            println!("version = {key_version}");
            println!("mnemonic = \"{}\"", phrase.as_str());
        }
        Commands::Add { service, username } => {
            let vault = open_vault(&cli.config)?;
            let password = read_password()?;
            let record_id = add_credential(&vault, &service, &username, &password).await?;
            println!("{record_id}");
        }
        Commands::List { service } => {
            let vault = open_vault(&cli.config)?;
            let report = list_credentials(&vault, service.as_deref()).await;

            for warning in report_warnings(&report) {
                eprintln!("warning: {warning}");
            }
            for credential in &report.credentials {
                println!("{}", format_credential(credential).as_str());
            }
        }
    }

    Ok(())
}
