//! Open and close commands - device-mapper activation

use super::{read_passphrase, Session};
use anyhow::{Context, Result};
use cryptdl::consts::{CRYPT_ACTIVATE_READONLY, CRYPT_ANY_SLOT};
use cryptdl::Device;
use std::io;
use std::path::PathBuf;

/// Arguments for the open command
#[derive(Debug, Clone)]
pub struct OpenArgs {
    pub device: String,
    pub name: String,
    pub keyslot: Option<i32>,
    pub readonly: bool,
    pub passphrase_file: Option<PathBuf>,
}

impl OpenArgs {
    fn flags(&self) -> u32 {
        if self.readonly {
            CRYPT_ACTIVATE_READONLY
        } else {
            0
        }
    }
}

pub fn open(session: &Session, args: OpenArgs) -> Result<()> {
    let passphrase = read_passphrase(args.passphrase_file.as_deref(), &mut io::stdin().lock())?;
    let device = session.load(&args.device)?;
    let keyslot = device
        .activate_by_passphrase(
            Some(&args.name),
            args.keyslot.unwrap_or(CRYPT_ANY_SLOT),
            &passphrase,
            args.flags(),
        )
        .with_context(|| format!("Failed to activate {} as {}", args.device, args.name))?;
    println!("/dev/mapper/{} opened with keyslot {}", args.name, keyslot);
    Ok(())
}

pub fn close(session: &Session, name: &str) -> Result<()> {
    let device = Device::init_by_name_with(session.bindings()?, name)
        .with_context(|| format!("No active mapping named {}", name))?;
    device
        .deactivate(name)
        .with_context(|| format!("Failed to deactivate {}", name))?;
    println!("/dev/mapper/{} closed", name);
    Ok(())
}
