//! Format command - write a new header from a TOML parameter file

use super::{read_passphrase, Session};
use anyhow::{bail, Context, Result};
use cryptdl::consts::CRYPT_ANY_SLOT;
use cryptdl::{DeviceType, GenericParams, Luks1, Luks2, Plain};
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Arguments for the format command
#[derive(Debug, Clone)]
pub struct FormatArgs {
    pub device: String,
    pub params: PathBuf,
    pub passphrase_file: Option<PathBuf>,
}

/// Contents of a `--params` file
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FormatFile {
    pub volume: GenericParams,
    pub plain: Option<Plain>,
    pub luks1: Option<Luks1>,
    pub luks2: Option<Luks2>,
}

impl FormatFile {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read parameter file: {}", path.display()))?;
        let file: FormatFile = toml::from_str(&content)
            .with_context(|| format!("Invalid parameter file: {}", path.display()))?;
        file.device_type()?;
        file.volume
            .native_key_size()
            .with_context(|| format!("Invalid [volume] in {}", path.display()))?;
        Ok(file)
    }

    /// The single device type section present in the file
    pub fn device_type(&self) -> Result<&dyn DeviceType> {
        let mut present: Vec<&dyn DeviceType> = Vec::new();
        if let Some(plain) = &self.plain {
            present.push(plain);
        }
        if let Some(luks1) = &self.luks1 {
            present.push(luks1);
        }
        if let Some(luks2) = &self.luks2 {
            present.push(luks2);
        }
        match present.as_slice() {
            [only] => Ok(*only),
            [] => bail!("Parameter file needs one of [plain], [luks1] or [luks2]"),
            _ => bail!("Parameter file may only contain one of [plain], [luks1] or [luks2]"),
        }
    }

    fn needs_keyslot(&self) -> bool {
        self.plain.is_none()
    }
}

pub fn run(session: &Session, args: FormatArgs) -> Result<()> {
    // Validate the parameters before touching the library or the device.
    let file = FormatFile::load(&args.params)?;
    let device_type = file.device_type()?;

    let passphrase = if file.needs_keyslot() {
        let mut stdin = io::stdin().lock();
        Some(read_passphrase(args.passphrase_file.as_deref(), &mut stdin)?)
    } else {
        None
    };

    let device = cryptdl::Device::init_with(session.bindings()?, &args.device)
        .with_context(|| format!("Failed to open device: {}", args.device))?;
    device
        .format(device_type, &file.volume)
        .with_context(|| format!("Failed to format {}", args.device))?;
    tracing::info!(device = %args.device, device_type = device_type.name(), "formatted");

    if let Some(passphrase) = passphrase {
        let keyslot = device
            .keyslot_add_by_volume_key(CRYPT_ANY_SLOT, file.volume.volume_key.as_deref(), &passphrase)
            .context("Failed to add the first keyslot")?;
        println!("{}: {} formatted, passphrase in keyslot {}", args.device, device_type.name(), keyslot);
    } else {
        println!("{}: {} formatted", args.device, device_type.name());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn params_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_luks2_file() {
        let file = params_file(
            r#"
[volume]
cipher = "aes"
cipher_mode = "xts-plain64"
volume_key_size = 64

[luks2]
label = "data"

[luks2.pbkdf]
type = "argon2id"
hash = "sha256"
time_ms = 2000
"#,
        );
        let parsed = FormatFile::load(file.path()).unwrap();
        assert_eq!(parsed.device_type().unwrap().name(), "LUKS2");
        assert!(parsed.needs_keyslot());
        assert_eq!(parsed.luks2.unwrap().label.as_deref(), Some("data"));
    }

    #[test]
    fn test_plain_file_has_no_keyslot() {
        let file = params_file(
            r#"
[volume]
cipher = "aes"
cipher_mode = "cbc-essiv:sha256"
volume_key_size = 32

[plain]
hash = "sha256"
"#,
        );
        let parsed = FormatFile::load(file.path()).unwrap();
        assert_eq!(parsed.device_type().unwrap().name(), "PLAIN");
        assert!(!parsed.needs_keyslot());
    }

    #[test]
    fn test_missing_type_section() {
        let file = params_file(
            "[volume]\ncipher = \"aes\"\ncipher_mode = \"xts-plain64\"\nvolume_key_size = 64\n",
        );
        let err = FormatFile::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("needs one of"));
    }

    #[test]
    fn test_two_type_sections() {
        let file = params_file(
            "[volume]\ncipher = \"aes\"\ncipher_mode = \"xts-plain64\"\nvolume_key_size = 64\n[luks1]\n[luks2]\n",
        );
        assert!(FormatFile::load(file.path()).is_err());
    }

    #[test]
    fn test_short_volume_key_rejected() {
        let file = params_file(
            "[volume]\ncipher = \"aes\"\ncipher_mode = \"xts-plain64\"\nvolume_key_size = 64\nvolume_key = [9, 9, 9, 9]\n[luks2]\n",
        );
        let err = FormatFile::load(file.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("volume_key is 4 bytes but volume_key_size is 64"));
    }

    #[test]
    fn test_unknown_section_rejected() {
        let file = params_file("[volume]\ncipher = \"aes\"\ncipher_mode = \"x\"\nvolume_key_size = 1\n[luks3]\n");
        assert!(FormatFile::load(file.path()).is_err());
    }
}
