//! Per-OS backends behind a common capability contract.
//!
//! Exactly one backend module is compiled in, selected by `target_os`. Each
//! backend exports the same surface, so shared logic never branches on the
//! platform at runtime:
//!
//! - `MAX_THREAD_NAME_LEN` — longest thread name the platform stores, in
//!   bytes, excluding the terminator
//! - `STACK_SIZE_MAX` — hard ceiling on requested stack sizes, if the
//!   platform has one
//! - `gettid()` — kernel id of the calling thread, widened to [`Tid`]
//! - `set_native_name` / `get_native_name` — naming for the calling thread
//! - `apply_affinity` — translate a CPU-id set into the native mask on a
//!   thread attribute object
//! - `list_threads` / `thread_name_by_id` — process-wide enumeration and
//!   remote name lookup
//!
//! [`Tid`]: crate::thread::Tid

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "linux")]
pub use linux::*;

#[cfg(target_os = "macos")]
mod macos;
#[cfg(target_os = "macos")]
pub use macos::*;

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
compile_error!("no thread backend for this target OS");
