//! Shared test utilities
//!
//! An in-process stand-in for libcryptsetup and the C allocator, built from
//! Rust `extern "C"` functions. Each device context is a boxed [`FakeDevice`]
//! behind the opaque pointer. It keeps just enough state (type, keyslots,
//! tokens, active mapping) to exercise every facade operation.

#![allow(dead_code)]

use cryptdl::abi::{from_size, to_size, CInt, CSizeT};
use cryptdl::dl::crypt::{CryptDevice, LogCallback, ProgressCallback};
use cryptdl::params::native::{CryptParamsPlainRaw, TokenParamsLuks2KeyringRaw};
use cryptdl::{Bindings, CryptLibrary, CryptSymbols, LibcSymbols, MemoryGateway, OptionalCryptSymbols};
use std::alloc::{alloc, dealloc, Layout};
use std::cell::Cell;
use std::collections::BTreeSet;
use std::ffi::{c_char, c_void, CStr, CString};
use std::ptr;
use std::sync::Arc;

// Re-export testing utilities
pub use pretty_assertions::{assert_eq, assert_ne};

pub const EPERM: CInt = -1;
pub const ENOENT: CInt = -2;
pub const EINTR: CInt = -4;
pub const ENODEV: CInt = -19;
pub const EINVAL: CInt = -22;

/// Passphrase of keyslot 0 on a pre-formatted image
pub const PASSPHRASE: &[u8] = b"correct horse";
/// Volume key of a pre-formatted image
pub const VOLUME_KEY: [u8; 32] = [0x5a; 32];
/// UUID of a pre-formatted image
pub const UUID: &str = "0b9e5c3e-6f0b-4e48-8bd6-7c1f3e2d9a10";

/// Image path with an existing LUKS2 header
pub const LUKS2_IMAGE: &str = "/images/luks2.img";
/// Image path with no header
pub const BLANK_IMAGE: &str = "/images/blank.img";
/// Path `crypt_init` rejects with -ENOENT
pub const MISSING_IMAGE: &str = "/missing/disk.img";
/// Path `crypt_init` accepts without producing a context
pub const HOLLOW_IMAGE: &str = "/hollow/disk.img";
/// Mapping name `crypt_init_by_name` accepts
pub const ACTIVE_NAME: &str = "cryptdata";

const TOKEN_SLOTS: usize = 32;

thread_local! {
    static FREES: Cell<usize> = const { Cell::new(0) };
    static DEBUG_LEVEL: Cell<CInt> = const { Cell::new(0) };
    static EXTERNAL_TOKENS: Cell<bool> = const { Cell::new(true) };
    static FORMAT_KEY_SIZE: Cell<Option<usize>> = const { Cell::new(None) };
}

/// `crypt_free` calls made on this thread
pub fn frees() -> usize {
    FREES.with(Cell::get)
}

/// `volume_key_size` of the last `crypt_format` call on this thread
pub fn format_key_size() -> Option<usize> {
    FORMAT_KEY_SIZE.with(Cell::get)
}

/// Last level passed to `crypt_set_debug_level` on this thread
pub fn debug_level() -> CInt {
    DEBUG_LEVEL.with(Cell::get)
}

struct Token {
    json: CString,
    keyring: Option<CString>,
}

pub struct FakeDevice {
    path: CString,
    on_disk: Option<&'static CStr>,
    device_type: Option<&'static CStr>,
    uuid: Option<CString>,
    volume_key: Vec<u8>,
    keyslots: Vec<Option<Vec<u8>>>,
    tokens: Vec<Option<Token>>,
    assignments: BTreeSet<(CInt, CInt)>,
    active: Option<String>,
    dump: CString,
    log: Option<(LogCallback, *mut c_void)>,
}

impl FakeDevice {
    fn new(path: &CStr) -> Self {
        let mut device = Self {
            path: path.to_owned(),
            on_disk: None,
            device_type: None,
            uuid: None,
            volume_key: Vec::new(),
            keyslots: vec![None; 8],
            tokens: (0..TOKEN_SLOTS).map(|_| None).collect(),
            assignments: BTreeSet::new(),
            active: None,
            dump: CString::default(),
            log: None,
        };
        if path.to_bytes() == LUKS2_IMAGE.as_bytes() {
            device.on_disk = Some(c"LUKS2");
            device.uuid = CString::new(UUID).ok();
            device.volume_key = VOLUME_KEY.to_vec();
            device.keyslots[0] = Some(PASSPHRASE.to_vec());
        }
        device
    }

    fn log(&self, level: CInt, message: &CStr) {
        if let Some((callback, usrptr)) = self.log {
            unsafe { callback(level, message.as_ptr(), usrptr) };
        }
    }

    fn add_keyslot(&mut self, keyslot: CInt, passphrase: Vec<u8>) -> CInt {
        let index = if keyslot < 0 {
            match self.keyslots.iter().position(Option::is_none) {
                Some(index) => index,
                None => return EINVAL,
            }
        } else {
            keyslot as usize
        };
        match self.keyslots.get_mut(index) {
            Some(slot) if slot.is_none() => {
                *slot = Some(passphrase);
                index as CInt
            }
            _ => EINVAL,
        }
    }

    fn find_keyslot(&self, keyslot: CInt, passphrase: &[u8]) -> Option<CInt> {
        self.keyslots
            .iter()
            .enumerate()
            .filter(|(index, _)| keyslot < 0 || *index as CInt == keyslot)
            .find(|(_, slot)| slot.as_deref() == Some(passphrase))
            .map(|(index, _)| index as CInt)
    }

    fn token(&self, token: CInt) -> Option<&Token> {
        usize::try_from(token)
            .ok()
            .and_then(|index| self.tokens.get(index))
            .and_then(Option::as_ref)
    }

    fn store_token(&mut self, token: CInt, value: Token) -> CInt {
        let index = if token < 0 {
            match self.tokens.iter().position(Option::is_none) {
                Some(index) => index,
                None => return EINVAL,
            }
        } else {
            token as usize
        };
        match self.tokens.get_mut(index) {
            Some(slot) => {
                *slot = Some(value);
                index as CInt
            }
            None => EINVAL,
        }
    }
}

unsafe fn device<'a>(cd: *mut CryptDevice) -> &'a mut FakeDevice {
    &mut *cd.cast::<FakeDevice>()
}

unsafe fn bytes<'a>(ptr: *const c_char, len: CSizeT) -> &'a [u8] {
    if ptr.is_null() {
        &[]
    } else {
        std::slice::from_raw_parts(ptr.cast::<u8>(), from_size(len))
    }
}

unsafe fn text<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        None
    } else {
        CStr::from_ptr(ptr).to_str().ok()
    }
}

// ============================================================================
// Allocator
// ============================================================================

const HEADER: usize = 16;

unsafe extern "C" fn fake_malloc(size: CSizeT) -> *mut c_void {
    let total = from_size(size) + HEADER;
    let Ok(layout) = Layout::from_size_align(total, HEADER) else {
        return ptr::null_mut();
    };
    let base = alloc(layout);
    if base.is_null() {
        return ptr::null_mut();
    }
    base.cast::<usize>().write(total);
    base.add(HEADER).cast()
}

unsafe extern "C" fn fake_free(ptr: *mut c_void) {
    if ptr.is_null() {
        return;
    }
    let base = ptr.cast::<u8>().sub(HEADER);
    let total = base.cast::<usize>().read();
    dealloc(base, Layout::from_size_align_unchecked(total, HEADER));
}

unsafe extern "C" fn fake_memcpy(dst: *mut c_void, src: *const c_void, n: CSizeT) -> *mut c_void {
    ptr::copy_nonoverlapping(src.cast::<u8>(), dst.cast::<u8>(), from_size(n));
    dst
}

unsafe extern "C" fn fake_strlen(s: *const c_char) -> CSizeT {
    to_size(CStr::from_ptr(s).to_bytes().len())
}

unsafe extern "C" fn fake_strncpy(dst: *mut c_char, src: *const c_char, n: CSizeT) -> *mut c_char {
    let n = from_size(n);
    let mut i = 0;
    while i < n && *src.add(i) != 0 {
        *dst.add(i) = *src.add(i);
        i += 1;
    }
    while i < n {
        *dst.add(i) = 0;
        i += 1;
    }
    dst
}

pub fn fake_libc() -> LibcSymbols {
    LibcSymbols {
        malloc: fake_malloc,
        free: fake_free,
        memcpy: fake_memcpy,
        strlen: fake_strlen,
        strncpy: fake_strncpy,
    }
}

// ============================================================================
// libcryptsetup
// ============================================================================

unsafe extern "C" fn fake_init(cd: *mut *mut CryptDevice, path: *const c_char) -> CInt {
    let path = CStr::from_ptr(path);
    if path.to_bytes().starts_with(b"/missing") {
        return ENOENT;
    }
    if path.to_bytes() == HOLLOW_IMAGE.as_bytes() {
        return 0;
    }
    *cd = Box::into_raw(Box::new(FakeDevice::new(path))).cast();
    0
}

unsafe extern "C" fn fake_init_by_name(cd: *mut *mut CryptDevice, name: *const c_char) -> CInt {
    if text(name) != Some(ACTIVE_NAME) {
        return ENODEV;
    }
    let mut fake = FakeDevice::new(&CString::new(LUKS2_IMAGE).unwrap_or_default());
    fake.device_type = fake.on_disk;
    fake.active = Some(ACTIVE_NAME.to_string());
    *cd = Box::into_raw(Box::new(fake)).cast();
    0
}

unsafe extern "C" fn fake_crypt_free(cd: *mut CryptDevice) {
    if cd.is_null() {
        return;
    }
    FREES.with(|frees| frees.set(frees.get() + 1));
    drop(Box::from_raw(cd.cast::<FakeDevice>()));
}

unsafe extern "C" fn fake_dump(cd: *mut CryptDevice) -> CInt {
    let dev = device(cd);
    match dev.device_type {
        Some(_) => {
            dev.log(0, c"LUKS header information\n");
            0
        }
        None => EINVAL,
    }
}

unsafe extern "C" fn fake_get_type(cd: *mut CryptDevice) -> *const c_char {
    device(cd).device_type.map_or(ptr::null(), CStr::as_ptr)
}

#[allow(clippy::too_many_arguments)]
unsafe extern "C" fn fake_format(
    cd: *mut CryptDevice,
    type_: *const c_char,
    cipher: *const c_char,
    cipher_mode: *const c_char,
    uuid: *const c_char,
    volume_key: *const c_char,
    volume_key_size: CSizeT,
    params: *mut c_void,
) -> CInt {
    let dev = device(cd);
    FORMAT_KEY_SIZE.with(|size| size.set(Some(from_size(volume_key_size))));
    if !matches!(text(cipher), Some("aes" | "serpent" | "twofish")) || text(cipher_mode).is_none() {
        return EINVAL;
    }
    let device_type: &'static CStr = match text(type_) {
        Some("PLAIN") => {
            if params.is_null() || (*params.cast::<CryptParamsPlainRaw>()).hash.is_null() {
                return EINVAL;
            }
            c"PLAIN"
        }
        Some("LUKS1") => c"LUKS1",
        Some("LUKS2") => c"LUKS2",
        _ => return EINVAL,
    };
    dev.device_type = Some(device_type);
    dev.on_disk = (device_type != c"PLAIN").then_some(device_type);
    dev.uuid = match text(uuid) {
        Some(uuid) => CString::new(uuid).ok(),
        None if device_type == c"PLAIN" => None,
        None => CString::new(UUID).ok(),
    };
    dev.volume_key = if volume_key.is_null() {
        vec![0x42; from_size(volume_key_size)]
    } else {
        bytes(volume_key, volume_key_size).to_vec()
    };
    0
}

#[allow(clippy::too_many_arguments)]
unsafe extern "C" fn fake_wipe(
    _cd: *mut CryptDevice,
    dev_path: *const c_char,
    pattern: CInt,
    offset: u64,
    length: u64,
    _wipe_block_size: CSizeT,
    _flags: u32,
    progress: Option<ProgressCallback>,
    usrptr: *mut c_void,
) -> CInt {
    if text(dev_path).is_none() || !(0..=3).contains(&pattern) {
        return EINVAL;
    }
    if let Some(progress) = progress {
        for step in 0..=4u64 {
            if progress(length, offset + length * step / 4, usrptr) != 0 {
                return EINTR;
            }
        }
    }
    0
}

unsafe extern "C" fn fake_resize(cd: *mut CryptDevice, name: *const c_char, _new_size: u64) -> CInt {
    match (&device(cd).active, text(name)) {
        (Some(active), Some(name)) if active == name => 0,
        _ => ENODEV,
    }
}

unsafe extern "C" fn fake_load(cd: *mut CryptDevice, requested: *const c_char, _params: *mut c_void) -> CInt {
    let dev = device(cd);
    let Some(on_disk) = dev.on_disk else {
        dev.log(1, c"Device is not a valid LUKS device.\n");
        return EINVAL;
    };
    if !requested.is_null() && CStr::from_ptr(requested) != on_disk {
        return EINVAL;
    }
    dev.device_type = Some(on_disk);
    0
}

unsafe extern "C" fn fake_keyslot_add_by_volume_key(
    cd: *mut CryptDevice,
    keyslot: CInt,
    volume_key: *const c_char,
    volume_key_size: CSizeT,
    passphrase: *const c_char,
    passphrase_size: CSizeT,
) -> CInt {
    let dev = device(cd);
    if dev.device_type.is_none() {
        return EINVAL;
    }
    if !volume_key.is_null() && bytes(volume_key, volume_key_size) != dev.volume_key.as_slice() {
        return EPERM;
    }
    dev.add_keyslot(keyslot, bytes(passphrase, passphrase_size).to_vec())
}

unsafe extern "C" fn fake_keyslot_add_by_passphrase(
    cd: *mut CryptDevice,
    keyslot: CInt,
    passphrase: *const c_char,
    passphrase_size: CSizeT,
    new_passphrase: *const c_char,
    new_passphrase_size: CSizeT,
) -> CInt {
    let dev = device(cd);
    if dev.find_keyslot(-1, bytes(passphrase, passphrase_size)).is_none() {
        return EPERM;
    }
    dev.add_keyslot(keyslot, bytes(new_passphrase, new_passphrase_size).to_vec())
}

unsafe extern "C" fn fake_keyslot_change_by_passphrase(
    cd: *mut CryptDevice,
    keyslot_old: CInt,
    keyslot_new: CInt,
    passphrase: *const c_char,
    passphrase_size: CSizeT,
    new_passphrase: *const c_char,
    new_passphrase_size: CSizeT,
) -> CInt {
    let dev = device(cd);
    let Some(old) = dev.find_keyslot(keyslot_old, bytes(passphrase, passphrase_size)) else {
        return EPERM;
    };
    dev.keyslots[old as usize] = None;
    let target = if keyslot_new < 0 { old } else { keyslot_new };
    dev.add_keyslot(target, bytes(new_passphrase, new_passphrase_size).to_vec())
}

unsafe extern "C" fn fake_activate_by_passphrase(
    cd: *mut CryptDevice,
    name: *const c_char,
    keyslot: CInt,
    passphrase: *const c_char,
    passphrase_size: CSizeT,
    _flags: u32,
) -> CInt {
    let dev = device(cd);
    match dev.find_keyslot(keyslot, bytes(passphrase, passphrase_size)) {
        Some(slot) => {
            if let Some(name) = text(name) {
                dev.active = Some(name.to_string());
            }
            slot
        }
        None => {
            dev.log(1, c"No key available with this passphrase.\n");
            EPERM
        }
    }
}

unsafe extern "C" fn fake_activate_by_token(
    cd: *mut CryptDevice,
    name: *const c_char,
    token: CInt,
    _usrptr: *mut c_void,
    _flags: u32,
) -> CInt {
    let dev = device(cd);
    let found = if token < 0 {
        dev.tokens.iter().any(Option::is_some)
    } else {
        dev.token(token).is_some()
    };
    if !found {
        return ENOENT;
    }
    if let Some(name) = text(name) {
        dev.active = Some(name.to_string());
    }
    0
}

unsafe extern "C" fn fake_activate_by_volume_key(
    cd: *mut CryptDevice,
    name: *const c_char,
    volume_key: *const c_char,
    volume_key_size: CSizeT,
    _flags: u32,
) -> CInt {
    let dev = device(cd);
    if bytes(volume_key, volume_key_size) != dev.volume_key.as_slice() {
        return EPERM;
    }
    if let Some(name) = text(name) {
        dev.active = Some(name.to_string());
    }
    0
}

unsafe extern "C" fn fake_deactivate(cd: *mut CryptDevice, name: *const c_char) -> CInt {
    let dev = device(cd);
    match (&dev.active, text(name)) {
        (Some(active), Some(name)) if active == name => {
            dev.active = None;
            0
        }
        _ => ENODEV,
    }
}

unsafe extern "C" fn fake_set_debug_level(level: CInt) {
    DEBUG_LEVEL.with(|debug| debug.set(level));
}

unsafe extern "C" fn fake_get_volume_key_size(cd: *mut CryptDevice) -> CInt {
    match device(cd).volume_key.len() {
        0 => EINVAL,
        len => len as CInt,
    }
}

unsafe extern "C" fn fake_volume_key_get(
    cd: *mut CryptDevice,
    keyslot: CInt,
    volume_key: *mut c_char,
    volume_key_size: *mut CSizeT,
    passphrase: *const c_char,
    passphrase_size: CSizeT,
) -> CInt {
    let dev = device(cd);
    if from_size(*volume_key_size) < dev.volume_key.len() || volume_key.is_null() {
        return EINVAL;
    }
    let Some(slot) = dev.find_keyslot(keyslot, bytes(passphrase, passphrase_size)) else {
        return EPERM;
    };
    ptr::copy_nonoverlapping(dev.volume_key.as_ptr(), volume_key.cast::<u8>(), dev.volume_key.len());
    *volume_key_size = to_size(dev.volume_key.len());
    slot
}

unsafe extern "C" fn fake_get_device_name(cd: *mut CryptDevice) -> *const c_char {
    device(cd).path.as_ptr()
}

unsafe extern "C" fn fake_get_uuid(cd: *mut CryptDevice) -> *const c_char {
    device(cd).uuid.as_deref().map_or(ptr::null(), CStr::as_ptr)
}

unsafe extern "C" fn fake_token_json_get(cd: *mut CryptDevice, token: CInt, json: *mut *const c_char) -> CInt {
    match device(cd).token(token) {
        Some(found) => {
            *json = found.json.as_ptr();
            token
        }
        None => ENOENT,
    }
}

unsafe extern "C" fn fake_token_json_set(cd: *mut CryptDevice, token: CInt, json: *const c_char) -> CInt {
    let dev = device(cd);
    if json.is_null() {
        return match usize::try_from(token).ok().and_then(|index| dev.tokens.get_mut(index)) {
            Some(slot) if slot.is_some() => {
                *slot = None;
                token
            }
            _ => ENOENT,
        };
    }
    let json = CStr::from_ptr(json);
    if !json.to_bytes().starts_with(b"{") {
        return EINVAL;
    }
    dev.store_token(
        token,
        Token {
            json: json.to_owned(),
            keyring: None,
        },
    )
}

unsafe extern "C" fn fake_token_luks2_keyring_get(
    cd: *mut CryptDevice,
    token: CInt,
    params: *mut TokenParamsLuks2KeyringRaw,
) -> CInt {
    match device(cd).token(token).and_then(|found| found.keyring.as_ref()) {
        Some(description) => {
            (*params).key_description = description.as_ptr();
            token
        }
        None => EINVAL,
    }
}

unsafe extern "C" fn fake_token_luks2_keyring_set(
    cd: *mut CryptDevice,
    token: CInt,
    params: *const TokenParamsLuks2KeyringRaw,
) -> CInt {
    let Some(description) = text((*params).key_description) else {
        return EINVAL;
    };
    let json = format!(
        r#"{{"type":"luks2-keyring","keyslots":[],"key_description":"{}"}}"#,
        description
    );
    let (Ok(json), Ok(keyring)) = (CString::new(json), CString::new(description)) else {
        return EINVAL;
    };
    device(cd).store_token(
        token,
        Token {
            json,
            keyring: Some(keyring),
        },
    )
}

unsafe extern "C" fn fake_token_assign_keyslot(cd: *mut CryptDevice, token: CInt, keyslot: CInt) -> CInt {
    let dev = device(cd);
    if token < 0 {
        let ids: Vec<CInt> = (0..TOKEN_SLOTS as CInt).filter(|id| dev.token(*id).is_some()).collect();
        dev.assignments.extend(ids.into_iter().map(|id| (id, keyslot)));
        return token;
    }
    if dev.token(token).is_none() {
        return EINVAL;
    }
    dev.assignments.insert((token, keyslot));
    token
}

unsafe extern "C" fn fake_token_unassign_keyslot(cd: *mut CryptDevice, token: CInt, keyslot: CInt) -> CInt {
    let dev = device(cd);
    if token < 0 {
        dev.assignments.retain(|(_, slot)| *slot != keyslot);
        return token;
    }
    if dev.token(token).is_none() {
        return EINVAL;
    }
    dev.assignments.remove(&(token, keyslot));
    token
}

unsafe extern "C" fn fake_token_is_assigned(cd: *mut CryptDevice, token: CInt, keyslot: CInt) -> CInt {
    let dev = device(cd);
    if dev.token(token).is_none() {
        return EINVAL;
    }
    if dev.assignments.contains(&(token, keyslot)) {
        0
    } else {
        ENOENT
    }
}

unsafe extern "C" fn fake_token_status(cd: *mut CryptDevice, token: CInt, type_: *mut *const c_char) -> CInt {
    let dev = device(cd);
    if usize::try_from(token).map_or(true, |index| index >= TOKEN_SLOTS) {
        return 0;
    }
    match dev.token(token) {
        None => 1,
        Some(found) if found.keyring.is_some() => {
            if !type_.is_null() {
                *type_ = c"luks2-keyring".as_ptr();
            }
            2
        }
        Some(_) => {
            if !type_.is_null() {
                *type_ = c"user".as_ptr();
            }
            5
        }
    }
}

unsafe extern "C" fn fake_set_log_callback(cd: *mut CryptDevice, log: Option<LogCallback>, usrptr: *mut c_void) {
    device(cd).log = log.map(|callback| (callback, usrptr));
}

unsafe extern "C" fn fake_dump_json(cd: *mut CryptDevice, json: *mut *const c_char, _flags: u32) -> CInt {
    let dev = device(cd);
    let Some(device_type) = dev.device_type else {
        return EINVAL;
    };
    let dump = format!(r#"{{"type":"{}"}}"#, device_type.to_string_lossy());
    let Ok(dump) = CString::new(dump) else {
        return EINVAL;
    };
    dev.dump = dump;
    *json = dev.dump.as_ptr();
    0
}

#[allow(clippy::too_many_arguments)]
unsafe extern "C" fn fake_activate_by_token_pin(
    cd: *mut CryptDevice,
    name: *const c_char,
    _type: *const c_char,
    token: CInt,
    pin: *const c_char,
    pin_size: CSizeT,
    _usrptr: *mut c_void,
    _flags: u32,
) -> CInt {
    if bytes(pin, pin_size) != b"1234" {
        return EPERM;
    }
    fake_activate_by_token(cd, name, token, ptr::null_mut(), 0)
}

unsafe extern "C" fn fake_token_max(type_: *const c_char) -> CInt {
    match text(type_) {
        Some("LUKS2") => TOKEN_SLOTS as CInt,
        _ => EINVAL,
    }
}

unsafe extern "C" fn fake_token_external_disable() {
    EXTERNAL_TOKENS.with(|enabled| enabled.set(false));
}

unsafe extern "C" fn fake_token_external_path() -> *const c_char {
    if EXTERNAL_TOKENS.with(Cell::get) {
        c"/usr/lib/cryptsetup".as_ptr()
    } else {
        ptr::null()
    }
}

pub fn fake_crypt() -> CryptSymbols {
    CryptSymbols {
        crypt_init: fake_init,
        crypt_init_by_name: fake_init_by_name,
        crypt_free: fake_crypt_free,
        crypt_dump: fake_dump,
        crypt_get_type: fake_get_type,
        crypt_format: fake_format,
        crypt_wipe: fake_wipe,
        crypt_resize: fake_resize,
        crypt_load: fake_load,
        crypt_keyslot_add_by_volume_key: fake_keyslot_add_by_volume_key,
        crypt_keyslot_add_by_passphrase: fake_keyslot_add_by_passphrase,
        crypt_keyslot_change_by_passphrase: fake_keyslot_change_by_passphrase,
        crypt_activate_by_passphrase: fake_activate_by_passphrase,
        crypt_activate_by_token: fake_activate_by_token,
        crypt_activate_by_volume_key: fake_activate_by_volume_key,
        crypt_deactivate: fake_deactivate,
        crypt_set_debug_level: fake_set_debug_level,
        crypt_get_volume_key_size: fake_get_volume_key_size,
        crypt_volume_key_get: fake_volume_key_get,
        crypt_get_device_name: fake_get_device_name,
        crypt_get_uuid: fake_get_uuid,
        crypt_token_json_get: fake_token_json_get,
        crypt_token_json_set: fake_token_json_set,
        crypt_token_luks2_keyring_get: fake_token_luks2_keyring_get,
        crypt_token_luks2_keyring_set: fake_token_luks2_keyring_set,
        crypt_token_assign_keyslot: fake_token_assign_keyslot,
        crypt_token_unassign_keyslot: fake_token_unassign_keyslot,
        crypt_token_is_assigned: fake_token_is_assigned,
        crypt_token_status: fake_token_status,
        crypt_set_log_callback: fake_set_log_callback,
    }
}

pub fn fake_optional() -> OptionalCryptSymbols {
    OptionalCryptSymbols {
        crypt_dump_json: Some(fake_dump_json),
        crypt_activate_by_token_pin: Some(fake_activate_by_token_pin),
        crypt_token_max: Some(fake_token_max),
        crypt_token_external_disable: Some(fake_token_external_disable),
        crypt_token_external_path: Some(fake_token_external_path),
    }
}

/// Bindings backed by the fake library, as a libcryptsetup 2.4+ would be
pub fn fake_bindings() -> Arc<Bindings> {
    build(fake_optional())
}

/// Bindings backed by the fake library, as a libcryptsetup 2.3 would be
pub fn legacy_bindings() -> Arc<Bindings> {
    build(OptionalCryptSymbols::default())
}

/// Unshared fake bindings, for callers that wrap them themselves
pub fn fake_library() -> Bindings {
    assemble(fake_optional())
}

fn build(optional: OptionalCryptSymbols) -> Arc<Bindings> {
    Arc::new(assemble(optional))
}

fn assemble(optional: OptionalCryptSymbols) -> Bindings {
    // Safety: the fakes implement the C contracts they stand in for.
    let (crypt, memory) = unsafe {
        (
            CryptLibrary::from_symbols(fake_crypt(), optional),
            MemoryGateway::from_symbols(fake_libc()),
        )
    };
    Bindings::from_parts(crypt, memory)
}
