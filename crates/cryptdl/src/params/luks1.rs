//! LUKS1 on-disk format

use super::native::CryptParamsLuks1Raw;
use super::{text_or_null, DeviceType};
use crate::abi::to_size;
use crate::consts::CRYPT_LUKS1;
use crate::error::CryptResult;
use crate::marshal::DeallocationPlan;
use serde::{Deserialize, Serialize};
use std::ffi::c_void;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Luks1 {
    pub hash: String,
    /// Data alignment in 512-byte sectors, 0 for the library default
    pub data_alignment: usize,
    /// Separate device holding the encrypted data
    pub data_device: Option<String>,
}

impl Default for Luks1 {
    fn default() -> Self {
        Self {
            hash: "sha256".to_string(),
            data_alignment: 0,
            data_device: None,
        }
    }
}

impl DeviceType for Luks1 {
    fn name(&self) -> &str {
        CRYPT_LUKS1
    }

    fn to_native(&self, plan: &mut DeallocationPlan<'_>) -> CryptResult<*mut c_void> {
        let raw = CryptParamsLuks1Raw {
            hash: plan.text(&self.hash)?,
            data_alignment: to_size(self.data_alignment),
            data_device: text_or_null(plan, self.data_device.as_deref())?,
        };
        Ok(plan.value(raw)?.cast())
    }
}
