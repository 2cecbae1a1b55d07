//! Thread creation, identity, and join.
//!
//! Implements the lifecycle: configure, spawn, run, join. A new thread goes
//! through a hidden trampoline that applies its name, runs the user routine,
//! and releases the context bundle the creator handed over.
//!
//! ## Ownership
//!
//! The [`ThreadContext`] is allocated by the creator and moved to the spawned
//! thread at the moment the native spawn succeeds (`Box::into_raw` across the
//! FFI boundary, `Box::from_raw` in the trampoline). On spawn failure the
//! handoff never happened and the creator reclaims and releases it. Exactly
//! one releaser exists for any given context.
//!
//! ## Validation policy
//!
//! A `Default` scheduling class with a nonzero priority fails hard, while an
//! explicit class with an out-of-range priority degrades to the ambient
//! priority for that policy with a warning. The asymmetry is deliberate and
//! load-bearing for existing callers; do not unify the two paths.

use std::ffi::{CString, c_void};
use std::mem::MaybeUninit;
use std::ptr;

use log::{error, warn};

use crate::attr::{SchedClass, ThreadAttr};
use crate::error::{Result, RtError};
use crate::name;
use crate::sys;

/// Lightweight kernel thread identifier, normalized to 64 bits across
/// backends. Comparable for equality only; its representation is unrelated
/// to [`Thread`] handle equality.
pub type Tid = u64;

/// Entry routine for a new thread. The return value is reported to the
/// joiner truncated to its low 32 bits.
pub type ThreadRoutine = fn(arg: *mut c_void) -> usize;

/// Handle to a still-joinable thread.
///
/// Valid from successful creation until joined. Join consumes the handle, so
/// a second join of the same thread is unrepresentable.
#[derive(Debug)]
pub struct Thread {
    handle: libc::pthread_t,
}

// SAFETY: the handle is an opaque identifier; every operation on it goes
// through pthread functions that are safe to call from any thread.
unsafe impl Send for Thread {}
// SAFETY: shared references only permit equality checks, which do not touch
// the target thread's state.
unsafe impl Sync for Thread {}

impl PartialEq for Thread {
    fn eq(&self, other: &Self) -> bool {
        // SAFETY: pthread_equal only inspects the handle values.
        unsafe { libc::pthread_equal(self.handle, other.handle) != 0 }
    }
}

impl Eq for Thread {}

impl Thread {
    /// Blocks until the target thread terminates and returns the low 32 bits
    /// of the value its entry routine returned.
    ///
    /// There is no timeout or cancellation; callers needing bounded waits
    /// must arrange them at a higher level.
    pub fn join(self) -> Result<u32> {
        let mut result: *mut c_void = ptr::null_mut();
        // SAFETY: the handle came from a successful pthread_create, and join
        // consumes `self`, so no second join can race this one.
        let rc = unsafe { libc::pthread_join(self.handle, &mut result) };
        if rc != 0 {
            error!(
                "join(0x{:x}): pthread_join failed with error {rc}",
                self.handle as usize
            );
            return Err(RtError::Error);
        }
        Ok(result as usize as u32)
    }
}

/// Handle of the calling thread.
pub fn current() -> Thread {
    Thread {
        // SAFETY: pthread_self always succeeds.
        handle: unsafe { libc::pthread_self() },
    }
}

/// Kernel id of the calling thread. Distinct in representation from the
/// handle returned by [`current`].
pub fn gettid() -> Tid {
    sys::gettid()
}

/// Identifier derived from a handle's representation. Unlike [`gettid`] this
/// does not require running on the thread in question, but the value is only
/// meaningful for equality against other values from this function.
pub fn tid_for_thread(thread: &Thread) -> Tid {
    thread.handle as usize as Tid
}

/// Context bundle handed from creator to spawned thread.
struct ThreadContext {
    name: CString,
    routine: ThreadRoutine,
    arg: *mut c_void,
}

/// Hidden entry point the OS invokes. Applies the thread name, runs the user
/// routine, releases the context, and reports the routine's return value.
extern "C" fn thread_trampoline(raw: *mut c_void) -> *mut c_void {
    // SAFETY: raw is the context the creator leaked at spawn time; ownership
    // transfers to this thread exactly once, here.
    let ctx = unsafe { Box::from_raw(raw.cast::<ThreadContext>()) };
    if let Ok(requested) = ctx.name.to_str() {
        name::set_name(requested);
    }
    let result = (ctx.routine)(ctx.arg);
    drop(ctx);
    result as *mut c_void
}

// The libc crate's Linux bindings omit pthread_attr_setscope and the scope
// constants even though glibc and musl both export them; bind the symbol
// directly there and use libc's own bindings elsewhere.
#[cfg(target_os = "linux")]
const PTHREAD_SCOPE_SYSTEM: libc::c_int = 0;
#[cfg(target_os = "linux")]
unsafe extern "C" {
    fn pthread_attr_setscope(attr: *mut libc::pthread_attr_t, scope: libc::c_int) -> libc::c_int;
}
#[cfg(not(target_os = "linux"))]
use libc::{PTHREAD_SCOPE_SYSTEM, pthread_attr_setscope};

/// Native attribute object with guaranteed destruction on every exit path.
struct NativeAttr(libc::pthread_attr_t);

impl NativeAttr {
    fn init() -> Result<Self> {
        let mut attr = MaybeUninit::<libc::pthread_attr_t>::uninit();
        // SAFETY: attr points to writable storage for a pthread_attr_t.
        if unsafe { libc::pthread_attr_init(attr.as_mut_ptr()) } != 0 {
            return Err(RtError::Error);
        }
        // SAFETY: pthread_attr_init succeeded, so the value is initialized.
        Ok(Self(unsafe { attr.assume_init() }))
    }

    fn raw(&mut self) -> &mut libc::pthread_attr_t {
        &mut self.0
    }
}

impl Drop for NativeAttr {
    fn drop(&mut self) {
        // SAFETY: self.0 was initialized by pthread_attr_init.
        unsafe { libc::pthread_attr_destroy(&mut self.0) };
    }
}

/// Signal-mask critical section around the native spawn. Blocks delivery of
/// every signal except SIGXCPU (reserved for stack dumps) so nothing is
/// delivered to a thread that has not finished initializing, and restores
/// the creator's previous mask on drop regardless of the spawn outcome.
struct SignalMaskGuard {
    old: libc::sigset_t,
}

impl SignalMaskGuard {
    fn block_for_spawn() -> Self {
        let mut set = MaybeUninit::<libc::sigset_t>::uninit();
        let mut old = MaybeUninit::<libc::sigset_t>::uninit();
        // SAFETY: set and old point to writable sigset_t storage.
        unsafe {
            libc::sigfillset(set.as_mut_ptr());
            libc::sigdelset(set.as_mut_ptr(), libc::SIGXCPU);
            libc::pthread_sigmask(libc::SIG_BLOCK, set.as_ptr(), old.as_mut_ptr());
        }
        Self {
            // SAFETY: pthread_sigmask stored the previous mask in old.
            old: unsafe { old.assume_init() },
        }
    }
}

impl Drop for SignalMaskGuard {
    fn drop(&mut self) {
        // SAFETY: self.old is the mask saved when the guard was created.
        unsafe { libc::pthread_sigmask(libc::SIG_SETMASK, &self.old, ptr::null_mut()) };
    }
}

/// Picks the effective priority for a policy: the requested value when it
/// lies within the policy's valid range, otherwise the ambient priority the
/// creating thread already resolves to, with a warning. Soft fallback by
/// contract; see the module docs.
fn resolve_priority(name: &str, policy: i32, requested: i32, min: i32, max: i32, ambient: i32) -> i32 {
    if requested >= min && requested <= max {
        requested
    } else {
        warn!(
            "create({name}): requested thread priority {requested} invalid for policy {policy}, falling back to default {ambient}"
        );
        ambient
    }
}

/// Creates a joinable thread named `name` running `routine(arg)`.
///
/// Configuration happens in a fixed order: stack ceiling check, stack floor
/// raise, scheduling class/priority translation, affinity translation,
/// context allocation, then the native spawn inside a signal-mask critical
/// section. The name is applied by the new thread itself, truncated to the
/// platform limit.
///
/// `arg` is passed through untouched; the routine is responsible for
/// whatever it points to. The returned handle must be joined exactly once.
pub fn create(name: &str, attr: &ThreadAttr, routine: ThreadRoutine, arg: *mut c_void) -> Result<Thread> {
    if attr.validate().is_err() {
        error!(
            "create({name}): schedClass DEFAULT but priority {} != 0 is unsupported",
            attr.sched_priority
        );
        return Err(RtError::Error);
    }

    let mut stack_size = attr.stack_size as usize;
    if let Some(limit) = sys::STACK_SIZE_MAX {
        if stack_size > limit {
            error!("create({name}): requested stack size {stack_size} exceeds maximum size {limit}");
            return Err(RtError::Error);
        }
    }

    let mut pattr = NativeAttr::init()?;

    // SAFETY: pattr holds an initialized attribute object.
    unsafe {
        if pthread_attr_setscope(pattr.raw(), PTHREAD_SCOPE_SYSTEM) != 0 {
            return Err(RtError::Error);
        }
        if libc::pthread_attr_setdetachstate(pattr.raw(), libc::PTHREAD_CREATE_JOINABLE) != 0 {
            return Err(RtError::Error);
        }
    }

    if stack_size != 0 {
        if stack_size < libc::PTHREAD_STACK_MIN {
            stack_size = libc::PTHREAD_STACK_MIN;
        }
        // SAFETY: pattr holds an initialized attribute object.
        let rc = unsafe { libc::pthread_attr_setstacksize(pattr.raw(), stack_size) };
        if rc != 0 {
            error!("create({name}): pthread_attr_setstacksize({stack_size}) failed with error {rc}");
            return Err(RtError::Error);
        }
    }

    if attr.sched_class != SchedClass::Default {
        let mut ambient_policy = 0i32;
        let mut param = MaybeUninit::<libc::sched_param>::uninit();
        // SAFETY: both out-pointers refer to writable storage; the handle is
        // our own.
        let rc = unsafe {
            libc::pthread_getschedparam(libc::pthread_self(), &mut ambient_policy, param.as_mut_ptr())
        };
        if rc != 0 {
            error!("create({name}): pthread_getschedparam(self) failed with error {rc}");
            return Err(RtError::Error);
        }
        // SAFETY: pthread_getschedparam succeeded, so param is initialized.
        let mut param = unsafe { param.assume_init() };

        let policy = match attr.sched_class {
            SchedClass::Realtime => libc::SCHED_FIFO,
            SchedClass::Timeshare => libc::SCHED_OTHER,
            SchedClass::Default => ambient_policy,
        };
        // SAFETY: pattr holds an initialized attribute object.
        let rc = unsafe { libc::pthread_attr_setschedpolicy(pattr.raw(), policy) };
        if rc != 0 {
            error!("create({name}): pthread_attr_setschedpolicy({policy}) failed with error {rc}");
            return Err(RtError::Error);
        }

        // SAFETY: sched_get_priority_{min,max} only inspect the policy value.
        let (min, max) = unsafe {
            (
                libc::sched_get_priority_min(policy),
                libc::sched_get_priority_max(policy),
            )
        };
        param.sched_priority =
            resolve_priority(name, policy, attr.sched_priority, min, max, param.sched_priority);

        // SAFETY: pattr holds an initialized attribute object; param is a
        // fully initialized sched_param.
        let rc = unsafe { libc::pthread_attr_setschedparam(pattr.raw(), &param) };
        if rc != 0 {
            error!(
                "create({name}): pthread_attr_setschedparam(priority = {}) failed with error {rc}",
                attr.sched_priority
            );
            return Err(RtError::Error);
        }
        // SAFETY: pattr holds an initialized attribute object.
        let rc = unsafe { libc::pthread_attr_setinheritsched(pattr.raw(), libc::PTHREAD_EXPLICIT_SCHED) };
        if rc != 0 {
            error!("create({name}): pthread_attr_setinheritsched(EXPLICIT) failed with error {rc}");
            return Err(RtError::Error);
        }
    }

    if !attr.affinity.is_empty() {
        sys::apply_affinity(pattr.raw(), &attr.affinity, name)?;
    }

    // Copy of the requested name, stopped at the first interior nul.
    let requested = match name.find('\0') {
        Some(i) => &name[..i],
        None => name,
    };
    let owned_name = CString::new(requested).map_err(|_| RtError::Error)?;

    let ctx = Box::new(ThreadContext {
        name: owned_name,
        routine,
        arg,
    });
    let ctx_raw = Box::into_raw(ctx);

    // SAFETY: an all-zero pthread_t is only a placeholder; pthread_create
    // overwrites it before it is ever read.
    let mut handle: libc::pthread_t = unsafe { std::mem::zeroed() };
    let create_ret;
    {
        let _mask = SignalMaskGuard::block_for_spawn();
        // SAFETY: pattr holds an initialized attribute object, the trampoline
        // matches the required signature, and ctx_raw stays valid until the
        // new thread takes ownership of it.
        create_ret = unsafe {
            libc::pthread_create(&mut handle, pattr.raw(), thread_trampoline, ctx_raw.cast())
        };
    }

    if create_ret != 0 {
        // The handoff never happened; the context is still ours to release.
        // SAFETY: ctx_raw came from Box::into_raw above and no thread was
        // spawned to consume it.
        drop(unsafe { Box::from_raw(ctx_raw) });
        error!("create({name}): pthread_create failed with error {create_ret}");
        return Err(RtError::Error);
    }

    Ok(Thread { handle })
}
