//! kych command-line front end.
//!
//! ```bash
//! # Dump a keychain with its password and export certs/keys
//! kych --file login.keychain --password hunter2
//!
//! # Same, with the 24-byte wrapping key recovered earlier
//! kych --file login.keychain --key 000102030405060708090a0b0c0d0e0f1011121314151617
//!
//! # System keychain via its unlock file
//! kych --file System.keychain --unlock-file /var/db/SystemKey
//! ```

mod der;
mod export;
mod matching;
mod report;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser};
use kych::{Credential, Keychain};

/// Forensic reader for legacy macOS keychain files.
#[derive(Parser)]
#[command(name = "kych")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Keychain file (*.keychain).
    #[arg(short, long)]
    file: PathBuf,

    #[command(flatten)]
    credential: CredentialArgs,

    /// Directory for exported certificates and keys.
    #[arg(short, long, default_value = "exported")]
    output: PathBuf,

    /// Print the dump as JSON instead of the field report.
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct CredentialArgs {
    /// Keychain password.
    #[arg(short, long)]
    password: Option<String>,

    /// Database wrapping key (48 hex digits).
    #[arg(short, long)]
    key: Option<String>,

    /// System keychain unlock file (e.g. /var/db/SystemKey).
    #[arg(short, long)]
    unlock_file: Option<PathBuf>,
}

impl CredentialArgs {
    fn resolve(self) -> Result<Credential> {
        if let Some(password) = self.password {
            return Ok(Credential::Password(password));
        }
        if let Some(key) = self.key {
            let bytes = hex::decode(key.trim()).context("wrapping key is not valid hex")?;
            let key: [u8; 24] = bytes
                .as_slice()
                .try_into()
                .map_err(|_| anyhow!("wrapping key must be 24 bytes, got {}", bytes.len()))?;
            return Ok(Credential::WrappingKey(key));
        }
        let path = self
            .unlock_file
            .expect("clap enforces exactly one credential");
        let data = fs::read(&path)
            .with_context(|| format!("failed to read unlock file {}", path.display()))?;
        Ok(Credential::UnlockFile(data))
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let credential = cli.credential.resolve()?;

    let keychain = Keychain::open(&cli.file)?;
    let dump = keychain.dump(&credential)?;

    if cli.json {
        serde_json::to_writer_pretty(std::io::stdout().lock(), &dump)?;
        println!();
    } else {
        report::print(&dump);
    }

    let exported = export::write(&cli.output, &dump)?;
    if !exported.certificates.is_empty() || !exported.keys.is_empty() {
        println!(
            "[+] Exported {} certificate(s) and {} key(s) under {}",
            exported.certificates.len(),
            exported.keys.len(),
            cli.output.display()
        );
        let pairs = matching::associate(&cli.output, &exported)?;
        for (cert, key) in &pairs {
            println!(
                "[+] Matched {} <-> {}",
                cert.file_name().unwrap_or_default().to_string_lossy(),
                key.file_name().unwrap_or_default().to_string_lossy()
            );
        }
    }

    Ok(())
}
