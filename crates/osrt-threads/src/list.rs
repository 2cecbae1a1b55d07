//! Thread enumeration and remote introspection.
//!
//! Both operations read transient OS state without any lock: a listed id may
//! be gone before the caller looks at it, and a lookup may land on a thread
//! that exited after enumeration. Callers must treat [`RtError::NotFound`]
//! after a successful listing as a normal outcome, never a defect.

use log::error;

use crate::error::{Result, RtError};
use crate::sys;
use crate::thread::Tid;

/// Enumerates the live kernel thread ids of the calling process.
///
/// Writes at most `tids.len()` identifiers but returns the true total count,
/// so a caller seeing `count > tids.len()` can retry with a larger buffer.
/// An empty capacity is a valid way to query the count alone.
pub fn list_threads(tids: &mut [Tid]) -> Result<usize> {
    let count = sys::list_threads(tids)?;
    if count == 0 {
        // The calling thread is alive, so an empty enumeration means the
        // facility itself is broken.
        error!("list_threads: enumeration reported no live threads");
        return Err(RtError::Error);
    }
    Ok(count)
}

/// Resolves the name of an arbitrary thread of this process by id and writes
/// it into `buf`, returning the number of bytes written.
///
/// Returns `NotFound` when the id no longer refers to a live thread,
/// including ids recycled or vanished between enumeration and lookup.
/// `NotEnoughSpace` is reserved for platforms that can only report the name
/// as a whole into a sufficiently large buffer.
pub fn get_name_of(tid: Tid, buf: &mut [u8]) -> Result<usize> {
    sys::thread_name_by_id(tid, buf)
}

#[cfg(test)]
#[cfg(target_os = "linux")]
mod tests {
    use super::*;
    use crate::thread;

    #[test]
    fn zero_capacity_reports_true_count() {
        let count = list_threads(&mut []).expect("list failed");
        assert!(count >= 1, "the calling thread must be listed");
    }

    #[test]
    fn listing_includes_the_calling_thread() {
        let count = list_threads(&mut []).expect("count failed");
        let mut tids = vec![0; count + 8];
        let count = list_threads(&mut tids).expect("list failed");
        let seen = count.min(tids.len());
        assert!(tids[..seen].contains(&thread::gettid()));
    }

    #[test]
    fn listed_identifiers_are_distinct() {
        let count = list_threads(&mut []).expect("count failed");
        let mut tids = vec![0; count + 8];
        let count = list_threads(&mut tids).expect("list failed");
        let seen = count.min(tids.len());
        let mut sorted = tids[..seen].to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), seen);
    }

    #[test]
    fn unknown_identifier_reports_not_found() {
        let mut buf = [0u8; 32];
        assert_eq!(get_name_of(u64::MAX, &mut buf), Err(RtError::NotFound));
    }
}
