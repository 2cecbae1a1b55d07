//! Per-thread LIFO stack of cleanup handlers.
//!
//! Each thread owns a singly linked stack of records hung off one
//! process-wide TLS key. The key is created lazily, exactly once, and never
//! deleted; its destructor unwinds whatever records a terminating thread
//! left behind, most recent first, so registered finalizers fire even when
//! the application never pops them.
//!
//! The stack is mutated only by its owning thread, so no locking is
//! involved anywhere except the one-time key creation gate.

use std::ffi::c_void;
use std::ptr;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Once;

use crate::error::{Result, RtError};

/// Finalizer registered with [`cleanup_push`].
pub type CleanupRoutine = fn(arg: *mut c_void);

/// One registered finalizer. Lives exclusively on the owning thread's stack
/// and is destroyed immediately after invocation.
struct CleanupRecord {
    routine: CleanupRoutine,
    arg: *mut c_void,
    prev: *mut CleanupRecord,
}

static KEY_ONCE: Once = Once::new();
static CLEANUP_KEY: AtomicUsize = AtomicUsize::new(0);

/// Returns the process-wide cleanup key, creating it on first use.
fn key() -> libc::pthread_key_t {
    KEY_ONCE.call_once(|| {
        let mut key: libc::pthread_key_t = 0;
        // SAFETY: key points to writable storage and unwind_stack matches
        // the destructor signature.
        let rc = unsafe { libc::pthread_key_create(&mut key, Some(unwind_stack)) };
        debug_assert_eq!(rc, 0);
        CLEANUP_KEY.store(key as usize, Ordering::Release);
    });
    CLEANUP_KEY.load(Ordering::Acquire) as libc::pthread_key_t
}

/// Invokes and releases every record in the chain, most recent first.
fn run_records(mut node: *mut CleanupRecord) {
    while !node.is_null() {
        // SAFETY: node was leaked by cleanup_push and belongs exclusively to
        // the calling thread; nothing else can free it.
        let record = unsafe { Box::from_raw(node) };
        (record.routine)(record.arg);
        node = record.prev;
    }
}

/// Exit-time hook the runtime invokes for each terminating thread that still
/// has records associated. The TLS value is already detached from the key by
/// the time this runs.
unsafe extern "C" fn unwind_stack(head: *mut c_void) {
    run_records(head.cast::<CleanupRecord>());
}

/// Registers `routine(arg)` to run at the next executing pop or at thread
/// exit, ahead of everything registered earlier.
///
/// Returns `OutOfResources` if the record cannot be associated with the
/// thread, leaving the stack unchanged. `Unsupported` is reserved for
/// execution contexts that are not tracked threads; the shipped backends run
/// everything on full threads, so they never produce it.
pub fn cleanup_push(routine: CleanupRoutine, arg: *mut c_void) -> Result<()> {
    let key = key();
    // SAFETY: key was created by key(); getspecific reads only the calling
    // thread's slot.
    let prev = unsafe { libc::pthread_getspecific(key) }.cast::<CleanupRecord>();
    let record = Box::into_raw(Box::new(CleanupRecord { routine, arg, prev }));
    // SAFETY: record is valid and ownership moves into this thread's slot.
    let rc = unsafe { libc::pthread_setspecific(key, record.cast()) };
    if rc != 0 {
        // Association failed, so the stack head is still `prev` and the new
        // record is ours to release.
        // SAFETY: record came from Box::into_raw above and was never linked.
        drop(unsafe { Box::from_raw(record) });
        return Err(RtError::OutOfResources);
    }
    Ok(())
}

/// Detaches the most recently pushed record, invoking it first when
/// `execute` is set. Popping an empty stack is a no-op returning `Ok`.
pub fn cleanup_pop(execute: bool) -> Result<()> {
    let key = key();
    // SAFETY: key was created by key(); getspecific reads only the calling
    // thread's slot.
    let head = unsafe { libc::pthread_getspecific(key) }.cast::<CleanupRecord>();
    if head.is_null() {
        return Ok(());
    }
    // SAFETY: head is the record this thread pushed; it stays valid until
    // released below.
    let prev = unsafe { (*head).prev };
    // SAFETY: storing the predecessor detaches head from the stack.
    let rc = unsafe { libc::pthread_setspecific(key, prev.cast()) };
    if rc != 0 {
        return Err(RtError::OutOfResources);
    }
    // SAFETY: head came from Box::into_raw in cleanup_push and is detached.
    let record = unsafe { Box::from_raw(head) };
    if execute {
        (record.routine)(record.arg);
    }
    Ok(())
}

/// Idempotent process-lifecycle hook: makes sure the cleanup key exists.
pub fn process_init(_reason: u32) {
    let _ = key();
}

/// Idempotent process-lifecycle hook: drains the calling thread's remaining
/// records (LIFO, each exactly once) and clears its association. The key
/// itself stays alive for the rest of the process.
pub fn process_fini(_reason: u32) {
    let key = key();
    // SAFETY: key was created by key(); getspecific reads only the calling
    // thread's slot.
    let head = unsafe { libc::pthread_getspecific(key) }.cast::<CleanupRecord>();
    if !head.is_null() {
        // Clear the slot first so the key destructor cannot run these
        // records a second time.
        // SAFETY: the records are consumed by run_records below.
        let _ = unsafe { libc::pthread_setspecific(key, ptr::null_mut()) };
        run_records(head);
    }
}
