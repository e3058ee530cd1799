//! Device types and the parameters passed to `crypt_format` and `crypt_load`

pub mod luks1;
pub mod luks2;
pub mod native;
pub mod plain;

pub use luks1::Luks1;
pub use luks2::{IntegrityParams, Luks2, PbkdfType};
pub use plain::Plain;

use crate::error::{CryptError, CryptResult};
use crate::marshal::DeallocationPlan;
use serde::{Deserialize, Serialize};
use std::ffi::c_void;

/// A device type libcryptsetup can format or load.
///
/// `to_native` encodes the type-specific parameter struct into `plan` and
/// returns its address. Every buffer reachable from that address belongs to
/// the plan and is valid only until the plan runs.
pub trait DeviceType {
    /// Type name understood by libcryptsetup, e.g. `"LUKS2"`
    fn name(&self) -> &str;

    fn to_native(&self, plan: &mut DeallocationPlan<'_>) -> CryptResult<*mut c_void>;
}

/// Parameters shared by every device type when formatting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenericParams {
    pub cipher: String,
    pub cipher_mode: String,
    #[serde(default)]
    pub uuid: Option<String>,
    /// Generated by libcryptsetup when absent
    #[serde(default)]
    pub volume_key: Option<Vec<u8>>,
    pub volume_key_size: usize,
}

impl GenericParams {
    pub fn new(cipher: impl Into<String>, cipher_mode: impl Into<String>, volume_key_size: usize) -> Self {
        Self {
            cipher: cipher.into(),
            cipher_mode: cipher_mode.into(),
            uuid: None,
            volume_key: None,
            volume_key_size,
        }
    }

    /// Key length to pass alongside the encoded `volume_key`.
    ///
    /// A supplied key must be exactly `volume_key_size` bytes; without one,
    /// libcryptsetup generates a key of `volume_key_size`.
    pub fn native_key_size(&self) -> CryptResult<usize> {
        match &self.volume_key {
            Some(key) if key.len() != self.volume_key_size => Err(CryptError::InvalidParams {
                reason: format!(
                    "volume_key is {} bytes but volume_key_size is {}",
                    key.len(),
                    self.volume_key_size
                ),
            }),
            Some(key) => Ok(key.len()),
            None => Ok(self.volume_key_size),
        }
    }
}

impl Default for GenericParams {
    fn default() -> Self {
        Self::new("aes", "xts-plain64", 64)
    }
}

/// LUKS2 keyring token parameters
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TokenParamsLuks2Keyring {
    pub key_description: String,
}

/// Encode an empty string as null, anything else as text.
pub(crate) fn text_or_null(
    plan: &mut DeallocationPlan<'_>,
    text: Option<&str>,
) -> CryptResult<*const std::ffi::c_char> {
    plan.optional_text(text.filter(|text| !text.is_empty()))
}
