//! Thread attribute descriptor.
//!
//! Caller-owned, transient configuration for [`crate::thread::create`].
//! The descriptor is portable; translation to native scheduling policies,
//! priority ranges, and affinity masks happens at creation time.

use crate::error::{Result, RtError};

/// Portable scheduling class, mapped to a native policy at creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchedClass {
    /// Inherit the ambient scheduling of the creating thread. No policy or
    /// priority call is made at all.
    #[default]
    Default,
    /// FIFO-like realtime policy (`SCHED_FIFO` on POSIX backends).
    Realtime,
    /// Regular timesharing policy (`SCHED_OTHER` on POSIX backends).
    Timeshare,
}

/// Thread creation attributes.
///
/// Immutable by convention: build one, hand it to `create`, drop it. The
/// default value requests ambient scheduling, no affinity restriction, and
/// the platform's default stack size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadAttr {
    /// Scheduling class for the new thread.
    pub sched_class: SchedClass,
    /// Priority within the class. Must be 0 when `sched_class` is
    /// [`SchedClass::Default`].
    pub sched_priority: i32,
    /// CPU ids the thread may run on. Empty means unrestricted. Duplicates
    /// are permitted but redundant; order is irrelevant.
    pub affinity: Vec<u32>,
    /// Requested stack size in bytes. 0 selects the platform default.
    pub stack_size: u32,
}

impl Default for ThreadAttr {
    fn default() -> Self {
        Self {
            sched_class: SchedClass::Default,
            sched_priority: 0,
            affinity: Vec::new(),
            stack_size: 0,
        }
    }
}

impl ThreadAttr {
    /// Returns the default attribute descriptor. Never fails.
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks the class/priority invariant: callers that leave the class at
    /// `Default` must not request a priority.
    ///
    /// This is the hard half of the validation policy; an in-class but
    /// out-of-range priority is handled leniently at creation time instead.
    pub(crate) fn validate(&self) -> Result<()> {
        if self.sched_class == SchedClass::Default && self.sched_priority != 0 {
            return Err(RtError::Error);
        }
        Ok(())
    }
}
