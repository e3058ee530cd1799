//! Header-less dm-crypt mapping

use super::native::CryptParamsPlainRaw;
use super::DeviceType;
use crate::consts::CRYPT_PLAIN;
use crate::error::CryptResult;
use crate::marshal::DeallocationPlan;
use serde::{Deserialize, Serialize};
use std::ffi::c_void;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Plain {
    /// Password hash applied to the passphrase
    pub hash: String,
    /// Data offset in 512-byte sectors
    pub offset: u64,
    /// IV offset in 512-byte sectors
    pub skip: u64,
    /// Mapping size in sectors, 0 for the whole device
    pub size: u64,
    pub sector_size: u32,
}

impl Plain {
    pub fn new(hash: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            ..Self::default()
        }
    }
}

impl DeviceType for Plain {
    fn name(&self) -> &str {
        CRYPT_PLAIN
    }

    fn to_native(&self, plan: &mut DeallocationPlan<'_>) -> CryptResult<*mut c_void> {
        let raw = CryptParamsPlainRaw {
            hash: plan.text(&self.hash)?,
            offset: self.offset,
            skip: self.skip,
            size: self.size,
            sector_size: self.sector_size,
        };
        Ok(plan.value(raw)?.cast())
    }
}
