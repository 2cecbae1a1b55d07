//! Linux backend.
//!
//! Naming goes through `prctl(PR_GET_NAME)` / `pthread_setname_np` (prctl is
//! favored for reads so the same code works on musl). Thread enumeration
//! reads `/proc/self/task`, and remote name lookup parses the comm field of
//! `/proc/self/task/<tid>/stat`. Affinity uses the glibc-only
//! `pthread_attr_setaffinity_np`.

use std::ffi::CStr;
use std::fs;

use log::error;

use crate::error::{Result, RtError};
use crate::thread::Tid;

/// Thread names are limited to 16 bytes on Linux, including the terminator.
pub const MAX_THREAD_NAME_LEN: usize = 15;

/// Linux imposes no creation-time ceiling on requested stack sizes.
pub const STACK_SIZE_MAX: Option<usize> = None;

/// Kernel id of the calling thread.
pub fn gettid() -> Tid {
    // SAFETY: gettid has no arguments and cannot fail.
    (unsafe { libc::syscall(libc::SYS_gettid) }) as Tid
}

/// Applies `name` to the calling thread. The caller has already truncated it
/// to `MAX_THREAD_NAME_LEN`, so ERANGE cannot occur; any residual failure is
/// deliberately ignored, naming is best-effort.
pub fn set_native_name(name: &CStr) {
    // SAFETY: name is a valid nul-terminated string no longer than the
    // 16-byte limit pthread_setname_np enforces.
    let _ = unsafe { libc::pthread_setname_np(libc::pthread_self(), name.as_ptr()) };
}

/// Reads the calling thread's name into `buf`, truncated to fit. Returns the
/// number of bytes written; 0 means the thread has no name.
pub fn get_native_name(buf: &mut [u8]) -> usize {
    let mut raw = [0u8; MAX_THREAD_NAME_LEN + 1];
    // SAFETY: raw is a writable buffer of the 16 bytes PR_GET_NAME requires.
    unsafe {
        libc::prctl(
            libc::PR_GET_NAME,
            raw.as_mut_ptr() as libc::c_ulong,
            0 as libc::c_ulong,
            0 as libc::c_ulong,
            0 as libc::c_ulong,
        )
    };
    let len = raw.iter().position(|&b| b == 0).unwrap_or(MAX_THREAD_NAME_LEN);
    let cnt = len.min(buf.len());
    buf[..cnt].copy_from_slice(&raw[..cnt]);
    cnt
}

/// Translates `cpus` into a `cpu_set_t` on the attribute object. Fails if any
/// CPU id is outside the fixed-size native mask.
#[cfg(target_env = "gnu")]
pub fn apply_affinity(attr: &mut libc::pthread_attr_t, cpus: &[u32], name: &str) -> Result<()> {
    // SAFETY: an all-zero cpu_set_t is the empty set, same as CPU_ZERO.
    let mut cpuset: libc::cpu_set_t = unsafe { std::mem::zeroed() };
    for &cpu in cpus {
        if cpu as usize >= libc::CPU_SETSIZE as usize {
            error!("create({name}): CPU id {cpu} out of range when setting affinity");
            return Err(RtError::Error);
        }
        // SAFETY: cpu is below CPU_SETSIZE, so the bit index is in bounds.
        unsafe { libc::CPU_SET(cpu as usize, &mut cpuset) };
    }
    // SAFETY: attr is an initialized attribute object and cpuset is a fully
    // initialized mask of the size passed.
    let rc = unsafe {
        libc::pthread_attr_setaffinity_np(attr, size_of::<libc::cpu_set_t>(), &cpuset)
    };
    if rc != 0 {
        error!("create({name}): pthread_attr_setaffinity_np failed with error {rc}");
        return Err(RtError::Error);
    }
    Ok(())
}

/// Affinity needs `pthread_attr_setaffinity_np`, a glibc extension.
#[cfg(not(target_env = "gnu"))]
pub fn apply_affinity(_attr: &mut libc::pthread_attr_t, _cpus: &[u32], name: &str) -> Result<()> {
    error!("create({name}): thread affinity is not supported on this libc");
    Err(RtError::Error)
}

/// Enumerates live kernel thread ids of this process from `/proc/self/task`.
///
/// The directory is a transient snapshot; entries may be gone by the time the
/// caller looks at them. Returns the true count even when it exceeds the
/// capacity of `tids`.
pub fn list_threads(tids: &mut [Tid]) -> Result<usize> {
    let dir = fs::read_dir("/proc/self/task").map_err(|e| {
        error!("list_threads: cannot open /proc/self/task: {e}");
        RtError::Error
    })?;
    let mut n = 0;
    for entry in dir {
        let entry = entry.map_err(|e| {
            error!("list_threads: cannot read /proc/self/task: {e}");
            RtError::Error
        })?;
        let name = entry.file_name();
        let tid: Tid = match name.to_str().and_then(|s| s.parse().ok()) {
            Some(tid) => tid,
            None => {
                error!("list_threads: unexpected entry {name:?} in /proc/self/task");
                return Err(RtError::Error);
            }
        };
        if n < tids.len() {
            tids[n] = tid;
        }
        n += 1;
    }
    Ok(n)
}

/// Resolves the name of an arbitrary thread of this process by reading the
/// comm field of its stat file. The comm value sits between the first `(`
/// and the last `)`; the name itself may contain parentheses.
///
/// Returns the number of bytes written into `buf` (silently truncated to
/// fit), or `NotFound` when the task directory is already gone.
pub fn thread_name_by_id(tid: Tid, buf: &mut [u8]) -> Result<usize> {
    let path = format!("/proc/self/task/{tid}/stat");
    let data = match fs::read(&path) {
        Ok(data) => data,
        // The thread exited between enumeration and lookup. Expected.
        Err(_) => return Err(RtError::NotFound),
    };
    let open = data.iter().position(|&b| b == b'(');
    let close = data.iter().rposition(|&b| b == b')');
    let (Some(open), Some(close)) = (open, close) else {
        return Ok(0);
    };
    if close <= open {
        return Ok(0);
    }
    let comm = &data[open + 1..close];
    let cnt = comm.len().min(buf.len());
    buf[..cnt].copy_from_slice(&comm[..cnt]);
    Ok(cnt)
}
