//! Naming service for the calling thread.
//!
//! Platform name limits are tight and inconsistent (15 bytes on Linux, 63 on
//! Darwin), so overlong names are silently truncated rather than rejected.
//! Reads always produce something: when the platform reports no name, the
//! decimal thread id stands in.

use std::ffi::CString;

use crate::sys;
use crate::thread;

/// Names the calling thread, truncating silently at the platform limit.
/// Never fails; on platforms without a naming facility this is a no-op.
pub fn set_name(name: &str) {
    let clean = match name.find('\0') {
        Some(i) => &name[..i],
        None => name,
    };
    let bytes = &clean.as_bytes()[..clean.len().min(sys::MAX_THREAD_NAME_LEN)];
    // Interior nuls were stripped above, so the conversion cannot fail.
    if let Ok(cname) = CString::new(bytes) {
        sys::set_native_name(&cname);
    }
}

/// Writes the calling thread's name into `buf`, truncated to fit, and
/// returns the number of bytes written.
///
/// Falls back to the decimal form of [`thread::gettid`] when the platform
/// cannot report a name or the name is empty. Always succeeds.
pub fn get_name(buf: &mut [u8]) -> usize {
    let mut native = [0u8; sys::MAX_THREAD_NAME_LEN + 1];
    let len = sys::get_native_name(&mut native);
    if len > 0 {
        let cnt = len.min(buf.len());
        buf[..cnt].copy_from_slice(&native[..cnt]);
        return cnt;
    }

    let tid = thread::gettid().to_string();
    let cnt = tid.len().min(buf.len());
    buf[..cnt].copy_from_slice(&tid.as_bytes()[..cnt]);
    cnt
}
