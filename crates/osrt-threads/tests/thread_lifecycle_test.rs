//! End-to-end lifecycle: create, trampoline naming, run, join.

use std::ffi::c_void;
use std::sync::atomic::{AtomicU32, Ordering};

use osrt_threads::{ThreadAttr, create, get_name, gettid};

fn increment(arg: *mut c_void) -> usize {
    // SAFETY: the test passes a pointer to an AtomicU32 it keeps alive
    // across the join.
    let counter = unsafe { &*arg.cast::<AtomicU32>() };
    counter.fetch_add(1, Ordering::SeqCst);
    0
}

fn report_own_name(arg: *mut c_void) -> usize {
    let mut buf = [0u8; 64];
    let len = get_name(&mut buf);
    // SAFETY: arg points to the expected-name slice the creator keeps alive.
    let expected = unsafe { &*arg.cast::<&[u8]>() };
    usize::from(&buf[..len] == *expected)
}

fn name_matches_tid(_arg: *mut c_void) -> usize {
    let mut buf = [0u8; 64];
    let len = get_name(&mut buf);
    let Ok(text) = std::str::from_utf8(&buf[..len]) else {
        return 0;
    };
    usize::from(text.parse::<u64>() == Ok(gettid()))
}

#[test]
fn worker_scenario_increments_counter_exactly_once() {
    let counter = AtomicU32::new(0);
    let thread = create(
        "worker",
        &ThreadAttr::new(),
        increment,
        (&counter as *const AtomicU32).cast_mut().cast(),
    )
    .expect("create failed");
    assert_eq!(thread.join(), Ok(0));
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[test]
fn trampoline_applies_requested_name_before_routine_runs() {
    let expected: &[u8] = b"lifecycle";
    let thread = create(
        "lifecycle",
        &ThreadAttr::new(),
        report_own_name,
        (&expected as *const &[u8]).cast_mut().cast(),
    )
    .expect("create failed");
    assert_eq!(thread.join(), Ok(1), "thread observed a different name");
}

#[test]
fn empty_name_falls_back_to_decimal_thread_id() {
    let thread = create("", &ThreadAttr::new(), name_matches_tid, std::ptr::null_mut())
        .expect("create failed");
    assert_eq!(thread.join(), Ok(1), "fallback name did not match the tid");
}

#[test]
fn many_workers_join_with_their_own_results() {
    fn echo(arg: *mut c_void) -> usize {
        arg as usize
    }

    let threads: Vec<_> = (0..8u32)
        .map(|i| {
            create("many", &ThreadAttr::new(), echo, i as usize as *mut c_void)
                .expect("create failed")
        })
        .collect();
    for (i, thread) in threads.into_iter().enumerate() {
        assert_eq!(thread.join(), Ok(i as u32));
    }
}
