#![doc(html_root_url = "https://docs.rs/hashframe/latest")]
//! Public API for the `hashframe` library.
//!
//! This crate provides the building blocks of the hashcode wire protocol:
//! resumable request/response codecs over fragmented byte streams, a
//! byte-order-aware MurmurHash3 (x86, 32-bit) generator with interchangeable
//! accessor strategies, and the collision bookkeeping that consumes it.

pub mod access;
pub mod codec;
pub mod error;
pub mod frame;
#[cfg(feature = "metrics")]
pub mod metrics;
pub mod murmur3;
pub mod prelude;
pub mod tracker;

pub use access::{
    AccessError,
    ByteOrder,
    DirectAccess,
    IdentityTranslator,
    NativeAccess,
    SafeAccess,
    TranslatingAccess,
    ValueTranslator,
    ranges_equal,
};
pub use codec::{CodecError, RequestDecoder, RequestEncoder, ResponseDecoder, ResponseEncoder};
pub use error::{HashframeError, Result};
pub use frame::{Collision, GeneratorKind, HashRequest, HashResult};
pub use murmur3::{HashCodeGenerator, HashError, Murmur3, safe_hash};
pub use tracker::{
    CollisionCollector,
    CompletedRequest,
    MurmurHasher,
    PolynomialHasher,
    ResultLedger,
    SampleHasher,
    TrackerError,
};
