//! macOS backend.
//!
//! Naming uses the single-argument `pthread_setname_np` (self-only on
//! Darwin) and `pthread_getname_np`; thread ids come from
//! `pthread_threadid_np`. Affinity cannot be expressed through the pthread
//! attribute API here, and process-wide enumeration would require mach task
//! ports, which this backend does not bind.

use std::ffi::CStr;

use log::error;

use crate::error::{Result, RtError};
use crate::thread::Tid;

/// Darwin stores up to 64 bytes of thread name, including the terminator.
pub const MAX_THREAD_NAME_LEN: usize = 63;

/// No creation-time ceiling on requested stack sizes.
pub const STACK_SIZE_MAX: Option<usize> = None;

/// Kernel id of the calling thread.
pub fn gettid() -> Tid {
    let mut tid: u64 = 0;
    // SAFETY: tid points to writable u64 storage; the handle is our own.
    unsafe { libc::pthread_threadid_np(libc::pthread_self(), &mut tid) };
    tid
}

/// Applies `name` to the calling thread. Best-effort; Darwin only allows a
/// thread to name itself, which is exactly the contract here.
pub fn set_native_name(name: &CStr) {
    // SAFETY: name is valid and within the 64-byte Darwin limit.
    let _ = unsafe { libc::pthread_setname_np(name.as_ptr()) };
}

/// Reads the calling thread's name into `buf`, truncated to fit. Returns the
/// number of bytes written; 0 means the thread has no name.
pub fn get_native_name(buf: &mut [u8]) -> usize {
    let mut raw = [0u8; MAX_THREAD_NAME_LEN + 1];
    // SAFETY: raw is writable storage of the advertised length.
    unsafe {
        libc::pthread_getname_np(libc::pthread_self(), raw.as_mut_ptr().cast(), raw.len())
    };
    let len = raw.iter().position(|&b| b == 0).unwrap_or(MAX_THREAD_NAME_LEN);
    let cnt = len.min(buf.len());
    buf[..cnt].copy_from_slice(&raw[..cnt]);
    cnt
}

/// Thread affinity is not settable through pthread attributes on Darwin.
pub fn apply_affinity(_attr: &mut libc::pthread_attr_t, _cpus: &[u32], name: &str) -> Result<()> {
    error!("create({name}): thread affinity is not supported on this platform");
    Err(RtError::Error)
}

/// Enumeration requires mach task ports, which this backend does not bind.
pub fn list_threads(_tids: &mut [Tid]) -> Result<usize> {
    Err(RtError::Unsupported)
}

/// See [`list_threads`].
pub fn thread_name_by_id(_tid: Tid, _buf: &mut [u8]) -> Result<usize> {
    Err(RtError::Unsupported)
}
