//! totem: convert NFC figure tag dumps between hardware and plaintext form.
//!
//! Commands:
//!   decrypt -k keys.bin -i dump.bin -o plain.bin [--force]
//!   encrypt -k keys.bin -i plain.bin -o dump.bin [--appdata donor.bin]
//!
//! Dump files are 520..=540 bytes. The plaintext form keeps the canonical
//! field order in its first 520 bytes; in both forms the trailing bytes past
//! the mapped span are copied from the input verbatim; they are not part of
//! the authenticated record.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::arithmetic_side_effects))]

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use totem_tag_core::{
    load_keys, pack, to_wire, unpack, APP_DATA_END, APP_DATA_OFFSET, INTERNAL_SIZE, TAG_FILE_SIZE,
};

#[derive(Parser, Debug)]
#[command(name = "totem", version, about = "NFC figure tag dump converter")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decrypt a hardware dump into its verified plaintext form
    Decrypt {
        /// Master key file (two 64-byte records, user-data record first)
        #[arg(long, short = 'k', env = "TOTEM_KEYS")]
        keys: PathBuf,
        /// Hardware dump to read
        #[arg(long, short = 'i')]
        input: PathBuf,
        /// Plaintext dump to write
        #[arg(long, short = 'o')]
        output: PathBuf,
        /// Write the output even when the signatures do not verify
        #[arg(long)]
        force: bool,
    },
    /// Encrypt a plaintext dump back into the hardware form
    Encrypt {
        /// Master key file (two 64-byte records, user-data record first)
        #[arg(long, short = 'k', env = "TOTEM_KEYS")]
        keys: PathBuf,
        /// Plaintext dump to read
        #[arg(long, short = 'i')]
        input: PathBuf,
        /// Hardware dump to write
        #[arg(long, short = 'o')]
        output: PathBuf,
        /// Merge the app-data region from another plaintext dump first
        #[arg(long)]
        appdata: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    match Cli::parse().command {
        Commands::Decrypt {
            keys,
            input,
            output,
            force,
        } => decrypt(&keys, &input, &output, force),
        Commands::Encrypt {
            keys,
            input,
            output,
            appdata,
        } => encrypt(&keys, &input, &output, appdata.as_deref()),
    }
}

/// Read a dump file and enforce the minimum size.
fn read_dump(path: &Path) -> Result<Vec<u8>> {
    let dump = fs::read(path).with_context(|| format!("reading dump {}", path.display()))?;
    if dump.len() < INTERNAL_SIZE {
        bail!(
            "dump {} is {} bytes, need at least {INTERNAL_SIZE}",
            path.display(),
            dump.len()
        );
    }
    if dump.len() != TAG_FILE_SIZE {
        warn!(
            "dump {} is {} bytes, expected {TAG_FILE_SIZE}; trailing bytes pass through as-is",
            path.display(),
            dump.len()
        );
    }
    Ok(dump)
}

fn decrypt(keys: &Path, input: &Path, output: &Path, force: bool) -> Result<()> {
    let keys = load_keys(keys)?;
    let dump = read_dump(input)?;

    let outcome = unpack(&keys, &dump)?;
    if !outcome.verified {
        warn!("tag signatures did NOT verify; the decrypted content is untrusted");
        if !force {
            bail!("signature verification failed (use --force to write the output anyway)");
        }
    }

    let mut out = outcome.plain.to_vec();
    out.extend_from_slice(&dump[INTERNAL_SIZE..]);
    fs::write(output, &out).with_context(|| format!("writing {}", output.display()))?;
    Ok(())
}

fn encrypt(keys: &Path, input: &Path, output: &Path, appdata: Option<&Path>) -> Result<()> {
    let keys = load_keys(keys)?;
    let dump = read_dump(input)?;

    let mut plain: [u8; INTERNAL_SIZE] = dump[..INTERNAL_SIZE]
        .try_into()
        .expect("read_dump guarantees at least the canonical size");
    if let Some(donor_path) = appdata {
        let donor = read_dump(donor_path)?;
        merge_app_data(&mut plain, &donor);
    }

    let cipher_buf = pack(&keys, &plain);
    let mut out = dump;
    to_wire(&cipher_buf, &mut out)?;
    fs::write(output, &out).with_context(|| format!("writing {}", output.display()))?;
    Ok(())
}

/// Copy the owner-writable app-data region from a donor plaintext dump.
/// The donor's signatures are irrelevant: packing re-signs everything.
fn merge_app_data(plain: &mut [u8; INTERNAL_SIZE], donor: &[u8]) {
    plain[APP_DATA_OFFSET..APP_DATA_END].copy_from_slice(&donor[APP_DATA_OFFSET..APP_DATA_END]);
}
