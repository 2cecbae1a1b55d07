//! # osrt-threads
//!
//! Portable thread lifecycle and introspection layer over native OS threads.
//!
//! Normalizes the platform-specific parts of kernel-thread management behind
//! one contract:
//!
//! - creation with a portable attribute model (scheduling class, priority,
//!   CPU affinity, stack size)
//! - thread naming under tight and inconsistent platform limits
//! - a per-thread LIFO stack of cleanup handlers that unwinds at pop time or
//!   thread exit
//! - enumeration of the live threads of the process, including name lookup
//!   for an arbitrary thread by id
//! - identity, equality, and one-shot blocking join
//!
//! Platform differences live in one backend module per target OS, selected
//! at build time. Shared logic never branches on the OS at runtime.

pub mod attr;
pub mod cleanup;
pub mod error;
pub mod list;
pub mod name;
mod sys;
pub mod thread;

pub use attr::{SchedClass, ThreadAttr};
pub use cleanup::{CleanupRoutine, cleanup_pop, cleanup_push, process_fini, process_init};
pub use error::{Result, RtError};
pub use list::{get_name_of, list_threads};
pub use name::{get_name, set_name};
pub use thread::{Thread, ThreadRoutine, Tid, create, current, gettid, tid_for_thread};

/// Maximum thread name length, in bytes, supported by the current platform
/// (excluding any terminator the platform may require).
pub const MAX_THREAD_NAME_LEN: usize = sys::MAX_THREAD_NAME_LEN;
