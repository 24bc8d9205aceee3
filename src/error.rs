//! Canonical error and result types for the crate.
//!
//! Each layer reports its own error enum; this module aggregates them into
//! the single `HashframeError` surface callers can hold when they drive more
//! than one layer at once.

use thiserror::Error;

use crate::{access::AccessError, codec::CodecError, murmur3::HashError, tracker::TrackerError};

/// Top-level error type exposed by `hashframe`.
#[derive(Debug, Error)]
pub enum HashframeError {
    /// An accessor read crossed its buffer bound.
    #[error(transparent)]
    Access(#[from] AccessError),

    /// A hash call was given an invalid range.
    #[error(transparent)]
    Hash(#[from] HashError),

    /// A decode or encode call failed.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Collision bookkeeping rejected a frame or sample.
    #[error(transparent)]
    Tracker(#[from] TrackerError),
}

/// Canonical result alias used by `hashframe` public APIs.
pub type Result<T> = std::result::Result<T, HashframeError>;
