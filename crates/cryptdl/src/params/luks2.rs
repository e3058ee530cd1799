//! LUKS2 on-disk format, with optional PBKDF and dm-integrity settings
//!
//! The parameter tree is encoded depth first into one plan: the PBKDF and
//! integrity structs are allocated before the top-level struct that points at
//! them.

use super::native::{CryptParamsIntegrityRaw, CryptParamsLuks2Raw, CryptPbkdfTypeRaw};
use super::{text_or_null, DeviceType};
use crate::abi::{to_size, CUint};
use crate::consts::CRYPT_LUKS2;
use crate::error::CryptResult;
use crate::marshal::DeallocationPlan;
use serde::{Deserialize, Serialize};
use std::ffi::c_void;
use std::ptr;

/// Key derivation settings for new keyslots
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PbkdfType {
    /// One of the `CRYPT_KDF_*` names
    #[serde(rename = "type")]
    pub kind: String,
    pub hash: String,
    pub time_ms: u32,
    pub iterations: u32,
    pub max_memory_kb: u32,
    pub parallel_threads: u32,
    /// `CRYPT_PBKDF_*` flags
    pub flags: u32,
}

impl PbkdfType {
    fn encode(&self, plan: &mut DeallocationPlan<'_>) -> CryptResult<*const CryptPbkdfTypeRaw> {
        let raw = CryptPbkdfTypeRaw {
            type_: text_or_null(plan, Some(&self.kind))?,
            hash: text_or_null(plan, Some(&self.hash))?,
            time_ms: self.time_ms,
            iterations: self.iterations,
            max_memory_kb: self.max_memory_kb,
            parallel_threads: self.parallel_threads,
            flags: self.flags,
        };
        Ok(plan.value(raw)?.cast_const())
    }
}

/// dm-integrity settings for authenticated encryption
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IntegrityParams {
    pub journal_size: u64,
    pub journal_watermark: u32,
    pub journal_commit_time: u32,
    pub interleave_sectors: u32,
    pub tag_size: u32,
    pub sector_size: u32,
    pub buffer_sectors: u32,
    pub integrity: Option<String>,
    pub integrity_key_size: u32,
    pub journal_integrity: Option<String>,
    pub journal_integrity_key: Option<Vec<u8>>,
    pub journal_crypt: Option<String>,
    pub journal_crypt_key: Option<Vec<u8>>,
}

impl IntegrityParams {
    fn encode(&self, plan: &mut DeallocationPlan<'_>) -> CryptResult<*const CryptParamsIntegrityRaw> {
        let journal_integrity_key = self.journal_integrity_key.as_deref().unwrap_or_default();
        let journal_crypt_key = self.journal_crypt_key.as_deref().unwrap_or_default();
        let raw = CryptParamsIntegrityRaw {
            journal_size: self.journal_size,
            journal_watermark: self.journal_watermark as CUint,
            journal_commit_time: self.journal_commit_time as CUint,
            interleave_sectors: self.interleave_sectors,
            tag_size: self.tag_size,
            sector_size: self.sector_size,
            buffer_sectors: self.buffer_sectors,
            integrity: text_or_null(plan, self.integrity.as_deref())?,
            integrity_key_size: self.integrity_key_size,
            journal_integrity: text_or_null(plan, self.journal_integrity.as_deref())?,
            journal_integrity_key: plan.secret(journal_integrity_key)?,
            journal_integrity_key_size: journal_integrity_key.len() as u32,
            journal_crypt: text_or_null(plan, self.journal_crypt.as_deref())?,
            journal_crypt_key: plan.secret(journal_crypt_key)?,
            journal_crypt_key_size: journal_crypt_key.len() as u32,
        };
        Ok(plan.value(raw)?.cast_const())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Luks2 {
    pub pbkdf: Option<PbkdfType>,
    /// Integrity algorithm, e.g. `"hmac(sha256)"`
    pub integrity: Option<String>,
    pub integrity_params: Option<IntegrityParams>,
    pub data_alignment: usize,
    pub data_device: Option<String>,
    pub sector_size: u32,
    pub label: Option<String>,
    pub subsystem: Option<String>,
}

impl DeviceType for Luks2 {
    fn name(&self) -> &str {
        CRYPT_LUKS2
    }

    fn to_native(&self, plan: &mut DeallocationPlan<'_>) -> CryptResult<*mut c_void> {
        let pbkdf = match &self.pbkdf {
            Some(pbkdf) => pbkdf.encode(plan)?,
            None => ptr::null(),
        };
        let integrity_params = match &self.integrity_params {
            Some(params) => params.encode(plan)?,
            None => ptr::null(),
        };
        let raw = CryptParamsLuks2Raw {
            pbkdf,
            integrity_params,
            integrity: text_or_null(plan, self.integrity.as_deref())?,
            data_alignment: to_size(self.data_alignment),
            data_device: text_or_null(plan, self.data_device.as_deref())?,
            sector_size: self.sector_size,
            label: text_or_null(plan, self.label.as_deref())?,
            subsystem: text_or_null(plan, self.subsystem.as_deref())?,
        };
        Ok(plan.value(raw)?.cast())
    }
}
