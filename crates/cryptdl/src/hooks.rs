//! Host callbacks invoked from libcryptsetup
//!
//! Native code receives a trampoline plus a `usrptr` pointing at the hook.
//! Trampolines never unwind into C: a panicking hook is caught, logged, and
//! treated as a request to stop.

use crate::abi::CInt;
use crate::consts::{CRYPT_LOG_DEBUG, CRYPT_LOG_ERROR, CRYPT_LOG_NORMAL, CRYPT_LOG_VERBOSE};
use crate::dl::crypt::{LogCallback, ProgressCallback};
use std::ffi::{c_char, c_void, CStr};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::ptr::NonNull;

/// Severity of a native log message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogLevel {
    Normal,
    Error,
    Verbose,
    Debug,
    Other(i32),
}

impl LogLevel {
    pub fn from_raw(raw: CInt) -> Self {
        match raw {
            CRYPT_LOG_NORMAL => LogLevel::Normal,
            CRYPT_LOG_ERROR => LogLevel::Error,
            CRYPT_LOG_VERBOSE => LogLevel::Verbose,
            CRYPT_LOG_DEBUG => LogLevel::Debug,
            other => LogLevel::Other(other),
        }
    }
}

/// Receiver for messages libcryptsetup logs about one device
pub trait LogHook: Send {
    fn log(&mut self, level: LogLevel, message: &str);
}

impl<F> LogHook for F
where
    F: FnMut(LogLevel, &str) + Send,
{
    fn log(&mut self, level: LogLevel, message: &str) {
        self(level, message)
    }
}

/// Forwards native messages to `tracing` under the `libcryptsetup` target
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLog;

impl LogHook for TracingLog {
    fn log(&mut self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Error => tracing::error!(target: "libcryptsetup", "{}", message),
            LogLevel::Normal => tracing::info!(target: "libcryptsetup", "{}", message),
            LogLevel::Verbose => tracing::debug!(target: "libcryptsetup", "{}", message),
            LogLevel::Debug | LogLevel::Other(_) => {
                tracing::trace!(target: "libcryptsetup", "{}", message)
            }
        }
    }
}

/// Progress of a long-running operation such as `wipe`.
///
/// Returns `false` to abort.
pub trait ProgressHook {
    fn progress(&mut self, size: u64, offset: u64) -> bool;
}

impl<F> ProgressHook for F
where
    F: FnMut(u64, u64) -> bool,
{
    fn progress(&mut self, size: u64, offset: u64) -> bool {
        self(size, offset)
    }
}

/// Installed log hook, owned through a raw pointer so native code may reach
/// it while the device is only shared-borrowed.
pub(crate) struct LogHookSlot {
    hook: NonNull<Box<dyn LogHook>>,
}

impl LogHookSlot {
    pub(crate) fn new(hook: Box<dyn LogHook>) -> Self {
        let hook = NonNull::from(Box::leak(Box::new(hook)));
        Self { hook }
    }

    /// `usrptr` for [`log_trampoline`]. Valid while the slot is alive.
    pub(crate) fn usrptr(&self) -> *mut c_void {
        self.hook.as_ptr().cast()
    }
}

impl Drop for LogHookSlot {
    fn drop(&mut self) {
        // Safety: created by Box::leak in new and dropped once here.
        drop(unsafe { Box::from_raw(self.hook.as_ptr()) });
    }
}

pub(crate) fn log_trampoline() -> LogCallback {
    log_trampoline_impl
}

pub(crate) fn progress_trampoline() -> ProgressCallback {
    progress_trampoline_impl
}

/// `usrptr` for [`progress_trampoline`]. Valid while `hook` is borrowed.
pub(crate) fn progress_usrptr(hook: &mut &mut dyn ProgressHook) -> *mut c_void {
    (hook as *mut &mut dyn ProgressHook).cast()
}

unsafe extern "C" fn log_trampoline_impl(level: CInt, msg: *const c_char, usrptr: *mut c_void) {
    if usrptr.is_null() || msg.is_null() {
        return;
    }
    let hook = &mut *usrptr.cast::<Box<dyn LogHook>>();
    let message = CStr::from_ptr(msg).to_string_lossy();
    let result = catch_unwind(AssertUnwindSafe(|| {
        hook.log(LogLevel::from_raw(level), message.trim_end_matches('\n'))
    }));
    if result.is_err() {
        tracing::error!("log hook panicked; message dropped");
    }
}

unsafe extern "C" fn progress_trampoline_impl(size: u64, offset: u64, usrptr: *mut c_void) -> CInt {
    if usrptr.is_null() {
        return 0;
    }
    let hook = &mut *usrptr.cast::<&mut dyn ProgressHook>();
    match catch_unwind(AssertUnwindSafe(|| hook.progress(size, offset))) {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(_) => {
            tracing::error!(size, offset, "progress hook panicked; aborting operation");
            1
        }
    }
}
