//! Process-wide enumeration and remote name lookup.
//!
//! Enumeration reads racy OS state, so these tests only assert properties
//! that hold regardless of concurrently starting or exiting test threads.

#![cfg(target_os = "linux")]

use std::ffi::c_void;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use osrt_threads::{RtError, ThreadAttr, create, get_name_of, gettid, list_threads};

#[test]
fn count_query_then_full_listing() {
    let count = list_threads(&mut []).expect("count query failed");
    assert!(count >= 1);

    let mut tids = vec![0u64; count + 16];
    let count = list_threads(&mut tids).expect("listing failed");
    let seen = count.min(tids.len());
    assert!(tids[..seen].contains(&gettid()), "caller missing from listing");
}

#[test]
fn truncated_listing_still_reports_true_count() {
    // Capacity 0 is the truncation edge case: nothing is written, yet the
    // true count comes back so the caller can size a retry buffer.
    let total = list_threads(&mut []).expect("count query failed");
    let mut one = [0u64; 1];
    let reported = list_threads(&mut one).expect("truncated listing failed");
    assert!(total >= 1 && reported >= 1);
    assert_ne!(one[0], 0, "first slot must still be filled");
}

/// Shared state between the prober thread and the test body.
struct Probe {
    tid: AtomicU64,
    release: AtomicBool,
}

fn publish_tid_and_wait(arg: *mut c_void) -> usize {
    // SAFETY: the test keeps the Probe alive until after the join.
    let probe = unsafe { &*arg.cast::<Probe>() };
    probe.tid.store(gettid(), Ordering::SeqCst);
    while !probe.release.load(Ordering::SeqCst) {
        std::thread::yield_now();
    }
    0
}

#[test]
fn live_thread_name_resolves_by_id() {
    let probe = Probe {
        tid: AtomicU64::new(0),
        release: AtomicBool::new(false),
    };
    let thread = create(
        "prober",
        &ThreadAttr::new(),
        publish_tid_and_wait,
        (&probe as *const Probe).cast_mut().cast(),
    )
    .expect("create failed");

    let mut tid = 0;
    while tid == 0 {
        std::thread::yield_now();
        tid = probe.tid.load(Ordering::SeqCst);
    }

    let mut buf = [0u8; 32];
    let len = get_name_of(tid, &mut buf).expect("lookup failed while thread is alive");
    assert_eq!(&buf[..len], b"prober");

    probe.release.store(true, Ordering::SeqCst);
    thread.join().expect("join failed");
}

#[test]
fn identifier_that_never_existed_is_not_found() {
    let mut buf = [0u8; 32];
    assert_eq!(get_name_of(u64::MAX, &mut buf), Err(RtError::NotFound));
}
