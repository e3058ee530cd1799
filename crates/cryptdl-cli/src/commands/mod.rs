pub mod activate;
pub mod format;
pub mod info;
pub mod keyslot;
pub mod probe;
pub mod token;

use anyhow::{Context, Result};
use cryptdl::consts::CRYPT_DEBUG_ALL;
use cryptdl::{Bindings, Device, TracingLog};
use std::fs;
use std::io::BufRead;
use std::path::Path;
use std::sync::Arc;

/// Settings shared by every command
#[derive(Debug, Clone, Copy, Default)]
pub struct Session {
    /// Turn on libcryptsetup's own debug output
    pub native_debug: bool,
}

impl Session {
    /// Process bindings, opened on first use
    pub fn bindings(&self) -> Result<Arc<Bindings>> {
        let bindings = cryptdl::ensure_ready().context("libcryptsetup is not available")?;
        if self.native_debug {
            bindings.set_debug_level(CRYPT_DEBUG_ALL);
        }
        Ok(bindings)
    }

    /// Context for `path` with its header loaded. Native messages go to
    /// `tracing` under the `libcryptsetup` target.
    pub fn load(&self, path: &str) -> Result<Device> {
        let mut device = Device::init_with(self.bindings()?, path)
            .with_context(|| format!("Failed to open device: {}", path))?;
        device.set_log_hook(TracingLog);
        device
            .load(None)
            .with_context(|| format!("No supported header found on {}", path))?;
        Ok(device)
    }
}

/// Read a passphrase from `file`, or else the next line of `input`.
///
/// One trailing newline is dropped; everything else is kept byte for byte.
pub fn read_passphrase(file: Option<&Path>, input: &mut impl BufRead) -> Result<Vec<u8>> {
    let mut passphrase = match file {
        Some(path) => {
            fs::read(path).with_context(|| format!("Failed to read passphrase file: {}", path.display()))?
        }
        None => {
            let mut line = Vec::new();
            input.read_until(b'\n', &mut line).context("Failed to read passphrase from stdin")?;
            line
        }
    };
    if passphrase.last() == Some(&b'\n') {
        passphrase.pop();
    }
    anyhow::ensure!(!passphrase.is_empty(), "Passphrase is empty");
    Ok(passphrase)
}
