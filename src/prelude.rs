//! Optional convenience imports for common `hashframe` workflows.
//!
//! This module is intentionally small and focused on high-frequency types.
//! Prefer importing specialised APIs directly from their owning modules.

pub use crate::{
    access::{ByteOrder, DirectAccess, NativeAccess, SafeAccess},
    codec::{RequestDecoder, RequestEncoder, ResponseDecoder, ResponseEncoder},
    error::{HashframeError, Result},
    frame::{Collision, GeneratorKind, HashRequest, HashResult},
    murmur3::{HashCodeGenerator, Murmur3, safe_hash},
    tracker::{CollisionCollector, ResultLedger, SampleHasher},
};
