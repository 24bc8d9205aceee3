//! Collision bookkeeping around the hash generator boundary.
//!
//! This module is a client of the hashing contract, not part of it: it
//! supplies `(bytes, seed)` per sample, receives a 32-bit hash back, and owns
//! all sample storage and collision statistics. [`CollisionCollector`] builds
//! result frames on the producing side; [`ResultLedger`] matches incoming
//! result frames to outstanding requests on the consuming side.

use std::collections::HashMap;

use dashmap::DashMap;
use thiserror::Error;

use crate::{
    access::{DirectAccess, NativeAccess, ranges_equal},
    frame::{Collision, GeneratorKind, HashRequest, HashResult},
    murmur3::{HashCodeGenerator, HashError, Murmur3},
};

/// Errors raised by collision bookkeeping.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// A result frame referenced a request id with no registered state.
    #[error("unknown request id {0}")]
    UnknownRequestId(i32),

    /// A request id was registered twice without completing.
    #[error("request id {0} is already registered")]
    DuplicateRequest(i32),

    /// A sample index was observed before the sample was added.
    #[error("unknown sample index {0}")]
    UnknownSample(usize),

    /// The underlying hash call failed.
    #[error(transparent)]
    Hash(#[from] HashError),
}

/// Boundary contract the collector drives: one hash per sample buffer.
pub trait SampleHasher: Send + Sync {
    /// Wire identifier of this generator.
    fn id(&self) -> u8;

    /// Hash one whole sample buffer.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the underlying generator rejects the buffer.
    fn hash_sample(&self, bytes: &[u8]) -> Result<i32, HashError>;
}

/// Baseline 31-based polynomial hash (generator id 0).
#[derive(Clone, Copy, Debug, Default)]
pub struct PolynomialHasher;

impl SampleHasher for PolynomialHasher {
    fn id(&self) -> u8 { GeneratorKind::Polynomial.id() }

    fn hash_sample(&self, bytes: &[u8]) -> Result<i32, HashError> {
        let mut hash = 1_i32;
        for &byte in bytes {
            #[expect(clippy::cast_possible_wrap, reason = "Bytes fold in signed.")]
            let signed = byte as i8;
            hash = hash.wrapping_mul(31).wrapping_add(i32::from(signed));
        }
        Ok(hash)
    }
}

/// Murmur3-backed sample hasher (generator id 1).
#[derive(Clone, Copy, Debug)]
pub struct MurmurHasher<A> {
    generator: Murmur3<A>,
    seed: i32,
}

impl<A: NativeAccess> MurmurHasher<A> {
    /// Hash samples with `generator` and a fixed `seed`.
    pub const fn new(generator: Murmur3<A>, seed: i32) -> Self { Self { generator, seed } }
}

impl Default for MurmurHasher<DirectAccess> {
    fn default() -> Self { Self::new(Murmur3::default(), 0) }
}

impl<A: NativeAccess> SampleHasher for MurmurHasher<A> {
    fn id(&self) -> u8 { GeneratorKind::Murmur3.id() }

    fn hash_sample(&self, bytes: &[u8]) -> Result<i32, HashError> {
        self.generator.hash_bytes(bytes, 0, bytes.len(), self.seed)
    }
}

/// Per-request collision statistics over a set of sample buffers.
///
/// The nested bucket map groups sample indices by hash, then by generator id,
/// so one collector can serve several generators over the same samples.
/// Duplicate buffer content is not a collision; only distinct content mapping
/// to the same hash is counted.
#[derive(Debug, Default)]
pub struct CollisionCollector {
    samples: Vec<Vec<u8>>,
    buckets: HashMap<i32, HashMap<u8, Vec<usize>>>,
}

impl CollisionCollector {
    /// Create a collector expecting `num_samples` buffers.
    #[must_use]
    pub fn with_capacity(num_samples: usize) -> Self {
        Self {
            samples: Vec::with_capacity(num_samples),
            buckets: HashMap::with_capacity(num_samples),
        }
    }

    /// Store a sample buffer, returning its index.
    pub fn add_sample(&mut self, bytes: Vec<u8>) -> usize {
        self.samples.push(bytes);
        self.samples.len() - 1
    }

    /// The stored sample at `index`, if any.
    #[must_use]
    pub fn sample(&self, index: usize) -> Option<&[u8]> {
        self.samples.get(index).map(Vec::as_slice)
    }

    /// Hash the sample at `index` with `hasher` and fold any collision into
    /// `result`.
    ///
    /// The first distinct sample seen for a hash is remembered; the second
    /// appends `Collision{hash, count: 2}` to `result`, and each further one
    /// increments that collision in place.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::UnknownSample`] for an index with no stored
    /// sample, or a [`TrackerError::Hash`] if the generator rejects it.
    pub fn observe(
        &mut self,
        index: usize,
        hasher: &dyn SampleHasher,
        result: &mut HashResult,
    ) -> Result<(), TrackerError> {
        let bytes = self
            .samples
            .get(index)
            .ok_or(TrackerError::UnknownSample(index))?;
        let hash = hasher.hash_sample(bytes)?;
        #[cfg(feature = "metrics")]
        crate::metrics::inc_hashes(hasher.id());

        let seen = self
            .buckets
            .entry(hash)
            .or_default()
            .entry(hasher.id())
            .or_default();
        if seen.is_empty() {
            // First distinct sample for this (hash, generator) pair.
            seen.push(index);
            return Ok(());
        }
        for &previous in seen.iter() {
            let earlier = &self.samples[previous];
            if ranges_equal(earlier, 0, earlier.len(), bytes, 0, bytes.len()) {
                // Same content, same hash: not a collision.
                return Ok(());
            }
        }
        if let Some(collision) = result.collision_mut(hash) {
            collision.increment();
        } else {
            result.push_collision(Collision::new(hash));
        }
        tracing::debug!(hash, generator = hasher.id(), "hash collision recorded");
        #[cfg(feature = "metrics")]
        crate::metrics::inc_collisions(hasher.id());
        Ok(())
    }
}

/// A request whose final result frame has arrived.
#[derive(Clone, Debug)]
pub struct CompletedRequest {
    /// The request as originally registered.
    pub request: HashRequest,
    /// All result frames received for it, in arrival order.
    pub results: Vec<HashResult>,
}

#[derive(Debug)]
struct Pending {
    request: HashRequest,
    results: Vec<HashResult>,
}

/// Consumer-side bookkeeping of outstanding request ids.
///
/// Concurrent result streams may feed one ledger; entries live from
/// [`ResultLedger::register`] until the frame flagged `last_packet` arrives,
/// at which point all state for the id is discarded.
#[derive(Debug, Default)]
pub struct ResultLedger {
    pending: DashMap<i32, Pending>,
}

impl ResultLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Record an outstanding request.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::DuplicateRequest`] if the id is already
    /// outstanding.
    pub fn register(&self, request: HashRequest) -> Result<(), TrackerError> {
        match self.pending.entry(request.id) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                Err(TrackerError::DuplicateRequest(request.id))
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(Pending {
                    request,
                    results: Vec::new(),
                });
                tracing::debug!(id = request.id, "request registered");
                Ok(())
            }
        }
    }

    /// Fold one decoded result frame into its request's state.
    ///
    /// Returns the completed request once its `last_packet` frame arrives.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::UnknownRequestId`] if no registered request
    /// matches the frame; the frame is not swallowed silently.
    pub fn accept(&self, result: HashResult) -> Result<Option<CompletedRequest>, TrackerError> {
        let id = result.request_id();
        let last = result.last_packet();
        {
            let mut entry = self
                .pending
                .get_mut(&id)
                .ok_or(TrackerError::UnknownRequestId(id))?;
            entry.results.push(result);
        }
        if !last {
            return Ok(None);
        }
        let (_, pending) = self
            .pending
            .remove(&id)
            .ok_or(TrackerError::UnknownRequestId(id))?;
        tracing::debug!(id, frames = pending.results.len(), "request complete");
        Ok(Some(CompletedRequest {
            request: pending.request,
            results: pending.results,
        }))
    }

    /// Number of requests still awaiting their final frame.
    #[must_use]
    pub fn outstanding(&self) -> usize { self.pending.len() }
}
