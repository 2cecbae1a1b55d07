//! Shared return-code taxonomy.
//!
//! Every fallible operation in this layer translates the underlying native
//! failure into one of these values after reporting the native detail to the
//! diagnostic sink. Success is `Ok(_)`; there is no `Ok` variant here.

use thiserror::Error;

/// Outcome taxonomy shared by all fallible operations in this layer.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RtError {
    /// Generic OS-level failure. The native error code has already been
    /// reported to the diagnostic sink.
    #[error("operation failed")]
    Error,

    /// Allocation or resource-association failure. The operation left its
    /// target state unchanged.
    #[error("out of resources")]
    OutOfResources,

    /// The target identifier does not currently refer to a live thread.
    /// A benign outcome for enumeration consumers: threads exit between
    /// listing and lookup.
    #[error("thread not found")]
    NotFound,

    /// The destination buffer is too small for a result the platform can
    /// only report as a whole.
    #[error("not enough space")]
    NotEnoughSpace,

    /// The feature is unavailable on the current platform or execution
    /// context.
    #[error("not supported")]
    Unsupported,
}

/// Result alias used throughout the crate.
pub type Result<T> = core::result::Result<T, RtError>;
