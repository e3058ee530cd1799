//! Constants from `libcryptsetup.h`

use crate::abi::CInt;

// Device types
pub const CRYPT_PLAIN: &str = "PLAIN";
pub const CRYPT_LUKS1: &str = "LUKS1";
pub const CRYPT_LUKS2: &str = "LUKS2";
pub const CRYPT_LOOPAES: &str = "LOOPAES";
pub const CRYPT_VERITY: &str = "VERITY";
pub const CRYPT_TCRYPT: &str = "TCRYPT";
pub const CRYPT_INTEGRITY: &str = "INTEGRITY";

// Key derivation functions
pub const CRYPT_KDF_PBKDF2: &str = "pbkdf2";
pub const CRYPT_KDF_ARGON2I: &str = "argon2i";
pub const CRYPT_KDF_ARGON2ID: &str = "argon2id";

/// Iteration time set by `crypt_set_iteration_time()`, compatibility only
pub const CRYPT_PBKDF_ITER_TIME_SET: u32 = 0x1;
/// Never run benchmarks; use preset values or defaults
pub const CRYPT_PBKDF_NO_BENCHMARK: u32 = 0x2;

/// Try every keyslot
pub const CRYPT_ANY_SLOT: CInt = -1;
/// Try every token
pub const CRYPT_ANY_TOKEN: CInt = -1;

// Activation flags
pub const CRYPT_ACTIVATE_READONLY: u32 = 0x1;
pub const CRYPT_ACTIVATE_NO_UUID: u32 = 0x2;
pub const CRYPT_ACTIVATE_SHARED: u32 = 0x4;
pub const CRYPT_ACTIVATE_ALLOW_DISCARDS: u32 = 0x8;
pub const CRYPT_ACTIVATE_PRIVATE: u32 = 0x10;
pub const CRYPT_ACTIVATE_CORRUPTED: u32 = 0x20;
pub const CRYPT_ACTIVATE_SAME_CPU_CRYPT: u32 = 0x40;
pub const CRYPT_ACTIVATE_SUBMIT_FROM_CRYPT_CPUS: u32 = 0x80;
pub const CRYPT_ACTIVATE_IGNORE_CORRUPTION: u32 = 0x100;
pub const CRYPT_ACTIVATE_RESTART_ON_CORRUPTION: u32 = 0x200;
pub const CRYPT_ACTIVATE_IGNORE_ZERO_BLOCKS: u32 = 0x400;
pub const CRYPT_ACTIVATE_KEYRING_KEY: u32 = 0x800;
pub const CRYPT_ACTIVATE_NO_JOURNAL: u32 = 0x1000;
pub const CRYPT_ACTIVATE_RECOVERY: u32 = 0x2000;
pub const CRYPT_ACTIVATE_IGNORE_PERSISTENT: u32 = 0x4000;

// Deactivation flags
pub const CRYPT_DEACTIVATE_DEFERRED: u32 = 0x1;
pub const CRYPT_DEACTIVATE_FORCE: u32 = 0x2;

// Debug levels for `crypt_set_debug_level`
pub const CRYPT_DEBUG_ALL: CInt = -1;
pub const CRYPT_DEBUG_NONE: CInt = 0;

// Log levels passed to the log callback
pub const CRYPT_LOG_NORMAL: CInt = 0;
pub const CRYPT_LOG_ERROR: CInt = 1;
pub const CRYPT_LOG_VERBOSE: CInt = 2;
pub const CRYPT_LOG_DEBUG: CInt = -1;

/// Create a keyslot whose volume key is not bound to the current segment
pub const CRYPT_VOLUME_KEY_NO_SEGMENT: u32 = 0x1;

// Wipe patterns
pub const CRYPT_WIPE_ZERO: CInt = 0;
pub const CRYPT_WIPE_RANDOM: CInt = 1;
pub const CRYPT_WIPE_ENCRYPTED_ZERO: CInt = 2;
pub const CRYPT_WIPE_SPECIAL: CInt = 3;

/// Bypass direct I/O when wiping
pub const CRYPT_WIPE_NO_DIRECT_IO: u32 = 0x1;

// Token states returned by `crypt_token_status`
pub const CRYPT_TOKEN_INVALID: CInt = 0;
pub const CRYPT_TOKEN_INACTIVE: CInt = 1;
pub const CRYPT_TOKEN_INTERNAL: CInt = 2;
pub const CRYPT_TOKEN_INTERNAL_UNKNOWN: CInt = 3;
pub const CRYPT_TOKEN_EXTERNAL: CInt = 4;
pub const CRYPT_TOKEN_EXTERNAL_UNKNOWN: CInt = 5;

/// State of a LUKS2 token slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenInfo {
    Invalid,
    /// Empty slot
    Inactive,
    /// Builtin token with a driver
    Internal,
    /// Reserved builtin name without a driver
    InternalUnknown,
    /// User-defined token with a loaded plugin
    External,
    /// User-defined token whose plugin is missing
    ExternalUnknown,
    /// A status this crate does not know about
    Unknown(i32),
}

impl TokenInfo {
    pub fn from_raw(raw: CInt) -> Self {
        match raw {
            CRYPT_TOKEN_INVALID => TokenInfo::Invalid,
            CRYPT_TOKEN_INACTIVE => TokenInfo::Inactive,
            CRYPT_TOKEN_INTERNAL => TokenInfo::Internal,
            CRYPT_TOKEN_INTERNAL_UNKNOWN => TokenInfo::InternalUnknown,
            CRYPT_TOKEN_EXTERNAL => TokenInfo::External,
            CRYPT_TOKEN_EXTERNAL_UNKNOWN => TokenInfo::ExternalUnknown,
            other => TokenInfo::Unknown(other),
        }
    }

    /// Whether the slot holds a token
    pub fn is_active(&self) -> bool {
        !matches!(self, TokenInfo::Invalid | TokenInfo::Inactive)
    }
}
