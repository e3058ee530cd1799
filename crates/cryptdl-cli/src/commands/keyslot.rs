//! Add-key command

use super::{read_passphrase, Session};
use anyhow::{Context, Result};
use cryptdl::consts::CRYPT_ANY_SLOT;
use std::io;
use std::path::PathBuf;

/// Arguments for the add-key command
#[derive(Debug, Clone)]
pub struct AddKeyArgs {
    pub device: String,
    pub keyslot: Option<i32>,
    pub passphrase_file: Option<PathBuf>,
    pub new_passphrase_file: Option<PathBuf>,
}

pub fn add(session: &Session, args: AddKeyArgs) -> Result<()> {
    let mut stdin = io::stdin().lock();
    let current = read_passphrase(args.passphrase_file.as_deref(), &mut stdin)?;
    let new = read_passphrase(args.new_passphrase_file.as_deref(), &mut stdin)?;

    let device = session.load(&args.device)?;
    let keyslot = device
        .keyslot_add_by_passphrase(args.keyslot.unwrap_or(CRYPT_ANY_SLOT), &current, &new)
        .with_context(|| format!("Failed to add a keyslot to {}", args.device))?;
    println!("{}: passphrase added to keyslot {}", args.device, keyslot);
    Ok(())
}
