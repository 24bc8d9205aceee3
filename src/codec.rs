//! Resumable decoders and encoders for the hashcode wire protocol.
//!
//! All multi-byte integers travel in network byte order. Each decoder is an
//! explicit state machine that consumes a field only once enough bytes are
//! buffered; with fewer bytes it returns without consuming anything, and the
//! state tag plus any already-read fields survive for the next call. One
//! decoder instance serves exactly one ordered byte stream.
//!
//! The decoders implement [`tokio_util::codec::Decoder`], so they compose
//! with `FramedRead` on the transport side; `decode_all` drains every
//! fully-buffered frame in a single invocation for callers that manage the
//! buffer themselves.

use std::io;

use bytes::{Buf, BufMut, BytesMut};
use thiserror::Error;
use tokio_util::codec::{Decoder, Encoder};

use crate::frame::{Collision, HashRequest, HashResult};

/// Upper bound on the collision capacity reserved ahead of data arrival.
///
/// The declared count still bounds the decode loop; this only stops a hostile
/// count from forcing a huge allocation before any collision bytes exist.
const MAX_PREALLOCATED_COLLISIONS: usize = 1024;

/// Errors reported synchronously by the decode and encode paths.
///
/// Insufficient data is not an error: decoders return `Ok(None)` and leave
/// the buffer untouched. Decoder states are an enum, so a corrupt state tag
/// is unrepresentable and needs no error arm.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Error in the underlying transport.
    #[error("transport error: {0}")]
    Io(#[from] io::Error),

    /// A response frame declared a negative collision count.
    #[error("negative collision count {0} in response frame")]
    NegativeCollisionCount(i32),

    /// A result frame holds more collisions than the wire format can carry.
    #[error("{0} collisions exceed the wire format limit")]
    TooManyCollisions(usize),
}

/// Incremental decoder for request frames.
///
/// States cycle `AwaitId -> AwaitArrayLength -> AwaitNumSamples -> emit ->
/// AwaitId`; each consumes one big-endian `i32`.
#[derive(Debug, Default)]
pub struct RequestDecoder {
    state: RequestState,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum RequestState {
    #[default]
    AwaitId,
    AwaitArrayLength {
        id: i32,
    },
    AwaitNumSamples {
        id: i32,
        array_length: i32,
    },
}

impl RequestDecoder {
    /// Create a decoder in its initial state.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Whether the decoder sits at a frame boundary with no partial fields.
    #[must_use]
    pub fn is_idle(&self) -> bool { self.state == RequestState::AwaitId }

    fn step(&mut self, src: &mut BytesMut) -> Option<HashRequest> {
        loop {
            match self.state {
                RequestState::AwaitId => {
                    if src.len() < 4 {
                        return None;
                    }
                    self.state = RequestState::AwaitArrayLength { id: src.get_i32() };
                }
                RequestState::AwaitArrayLength { id } => {
                    if src.len() < 4 {
                        return None;
                    }
                    self.state = RequestState::AwaitNumSamples {
                        id,
                        array_length: src.get_i32(),
                    };
                }
                RequestState::AwaitNumSamples { id, array_length } => {
                    if src.len() < 4 {
                        return None;
                    }
                    let request = HashRequest::new(id, array_length, src.get_i32());
                    self.state = RequestState::AwaitId;
                    tracing::trace!(id = request.id, "decoded request frame");
                    #[cfg(feature = "metrics")]
                    crate::metrics::inc_frames_decoded(crate::metrics::FRAME_REQUEST);
                    return Some(request);
                }
            }
        }
    }

    /// Drain every fully-buffered request from `src` in one call.
    pub fn decode_all(&mut self, src: &mut BytesMut) -> Vec<HashRequest> {
        let mut frames = Vec::new();
        while let Some(frame) = self.step(src) {
            frames.push(frame);
        }
        frames
    }
}

impl Decoder for RequestDecoder {
    type Item = HashRequest;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        Ok(self.step(src))
    }
}

/// Incremental decoder for result frames.
///
/// The collision list is read pairwise (`hash`, then `count`) until the
/// declared count is reached; a declared count of zero skips straight to the
/// trailer fields.
#[derive(Debug, Default)]
pub struct ResponseDecoder {
    state: ResponseState,
}

#[derive(Debug, Default)]
enum ResponseState {
    #[default]
    AwaitCollisionCount,
    AwaitCollisionHash {
        declared: usize,
        frame: HashResult,
    },
    AwaitCollisionCountValue {
        declared: usize,
        frame: HashResult,
    },
    AwaitRequestId {
        frame: HashResult,
    },
    AwaitGeneratorId {
        frame: HashResult,
    },
    AwaitLastPacketFlag {
        frame: HashResult,
    },
}

impl ResponseDecoder {
    /// Create a decoder in its initial state.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Whether the decoder sits at a frame boundary with no partial fields.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self.state, ResponseState::AwaitCollisionCount)
    }

    #[expect(
        clippy::too_many_lines,
        reason = "One arm per protocol state keeps the field sequencing auditable."
    )]
    fn step(&mut self, src: &mut BytesMut) -> Result<Option<HashResult>, CodecError> {
        loop {
            // Taking the state out lets the in-progress frame move between
            // states without cloning; every arm either restores it or
            // installs the successor.
            match std::mem::take(&mut self.state) {
                ResponseState::AwaitCollisionCount => {
                    if src.len() < 4 {
                        return Ok(None);
                    }
                    let declared = src.get_i32();
                    let declared = usize::try_from(declared)
                        .map_err(|_| CodecError::NegativeCollisionCount(declared))?;
                    let frame =
                        HashResult::with_capacity(declared.min(MAX_PREALLOCATED_COLLISIONS));
                    self.state = if declared == 0 {
                        ResponseState::AwaitRequestId { frame }
                    } else {
                        ResponseState::AwaitCollisionHash { declared, frame }
                    };
                }
                ResponseState::AwaitCollisionHash { declared, mut frame } => {
                    if src.len() < 4 {
                        self.state = ResponseState::AwaitCollisionHash { declared, frame };
                        return Ok(None);
                    }
                    frame.push_collision(Collision::new(src.get_i32()));
                    self.state = ResponseState::AwaitCollisionCountValue { declared, frame };
                }
                ResponseState::AwaitCollisionCountValue { declared, mut frame } => {
                    if src.len() < 2 {
                        self.state = ResponseState::AwaitCollisionCountValue { declared, frame };
                        return Ok(None);
                    }
                    let count = src.get_u16();
                    if let Some(collision) = frame.last_collision_mut() {
                        collision.set_count(count);
                    }
                    self.state = if frame.collisions().len() < declared {
                        ResponseState::AwaitCollisionHash { declared, frame }
                    } else {
                        ResponseState::AwaitRequestId { frame }
                    };
                }
                ResponseState::AwaitRequestId { mut frame } => {
                    if src.len() < 4 {
                        self.state = ResponseState::AwaitRequestId { frame };
                        return Ok(None);
                    }
                    frame.set_request_id(src.get_i32());
                    self.state = ResponseState::AwaitGeneratorId { frame };
                }
                ResponseState::AwaitGeneratorId { mut frame } => {
                    if src.is_empty() {
                        self.state = ResponseState::AwaitGeneratorId { frame };
                        return Ok(None);
                    }
                    frame.set_generator_id(src.get_u8());
                    self.state = ResponseState::AwaitLastPacketFlag { frame };
                }
                ResponseState::AwaitLastPacketFlag { mut frame } => {
                    if src.is_empty() {
                        self.state = ResponseState::AwaitLastPacketFlag { frame };
                        return Ok(None);
                    }
                    frame.set_last_packet(src.get_u8() != 0);
                    tracing::trace!(
                        request_id = frame.request_id(),
                        generator_id = frame.generator_id(),
                        collisions = frame.collisions().len(),
                        "decoded result frame"
                    );
                    #[cfg(feature = "metrics")]
                    crate::metrics::inc_frames_decoded(crate::metrics::FRAME_RESULT);
                    // `take` already reset the state to `AwaitCollisionCount`.
                    return Ok(Some(frame));
                }
            }
        }
    }

    /// Drain every fully-buffered result frame from `src` in one call.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::NegativeCollisionCount`] on a malformed frame;
    /// frames decoded before the failure are lost with the stream, matching
    /// the fail-fast contract.
    pub fn decode_all(&mut self, src: &mut BytesMut) -> Result<Vec<HashResult>, CodecError> {
        let mut frames = Vec::new();
        while let Some(frame) = self.step(src)? {
            frames.push(frame);
        }
        Ok(frames)
    }
}

impl Decoder for ResponseDecoder {
    type Item = HashResult;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        self.step(src)
    }
}

/// Encoder for request frames.
#[derive(Clone, Copy, Debug, Default)]
pub struct RequestEncoder;

impl Encoder<HashRequest> for RequestEncoder {
    type Error = CodecError;

    fn encode(&mut self, item: HashRequest, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(12);
        dst.put_i32(item.id);
        dst.put_i32(item.array_length);
        dst.put_i32(item.num_samples);
        #[cfg(feature = "metrics")]
        crate::metrics::inc_frames_encoded(crate::metrics::FRAME_REQUEST);
        Ok(())
    }
}

/// Encoder for result frames, mirroring [`ResponseDecoder`].
#[derive(Clone, Copy, Debug, Default)]
pub struct ResponseEncoder;

impl Encoder<HashResult> for ResponseEncoder {
    type Error = CodecError;

    fn encode(&mut self, item: HashResult, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let collisions = item.collisions();
        let count = i32::try_from(collisions.len())
            .map_err(|_| CodecError::TooManyCollisions(collisions.len()))?;
        dst.reserve(4 + collisions.len() * 6 + 6);
        dst.put_i32(count);
        for collision in collisions {
            dst.put_i32(collision.hash());
            dst.put_u16(collision.count());
        }
        dst.put_i32(item.request_id());
        dst.put_u8(item.generator_id());
        dst.put_u8(u8::from(item.last_packet()));
        #[cfg(feature = "metrics")]
        crate::metrics::inc_frames_encoded(crate::metrics::FRAME_RESULT);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use bytes::{BufMut, BytesMut};
    use rstest::rstest;
    use tokio_util::codec::{Decoder, Encoder};

    use super::{
        CodecError,
        RequestDecoder,
        RequestEncoder,
        ResponseDecoder,
        ResponseEncoder,
    };
    use crate::frame::{Collision, HashRequest, HashResult};

    fn sample_result() -> HashResult {
        let mut result = HashResult::new(7, 1);
        let mut first = Collision::new(-55);
        first.increment();
        result.push_collision(first);
        result.push_collision(Collision::new(1234));
        result.set_last_packet(true);
        result
    }

    fn encode_result(result: &HashResult) -> BytesMut {
        let mut wire = BytesMut::new();
        ResponseEncoder
            .encode(result.clone(), &mut wire)
            .expect("encode should succeed");
        wire
    }

    #[test]
    fn request_round_trips() {
        let request = HashRequest::new(3, 128, 10_000);
        let mut wire = BytesMut::new();
        RequestEncoder
            .encode(request, &mut wire)
            .expect("encode should succeed");
        assert_eq!(wire.len(), 12);

        let mut decoder = RequestDecoder::new();
        let decoded = decoder
            .decode(&mut wire)
            .expect("decode should succeed")
            .expect("expected a frame");
        assert_eq!(decoded, request);
        assert!(wire.is_empty());
        assert!(decoder.is_idle());
    }

    #[test]
    fn request_fields_are_network_order() {
        let mut wire = BytesMut::new();
        RequestEncoder
            .encode(HashRequest::new(0x0102_0304, 1, 2), &mut wire)
            .expect("encode should succeed");
        assert_eq!(&wire[..4], &[0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn partial_request_consumes_nothing_until_a_field_completes() {
        let mut decoder = RequestDecoder::new();
        let mut wire = BytesMut::new();
        wire.put_slice(&[0, 0, 0]);
        assert!(decoder.decode(&mut wire).expect("decode").is_none());
        assert_eq!(wire.len(), 3, "partial field must stay buffered");

        wire.put_u8(9);
        assert!(decoder.decode(&mut wire).expect("decode").is_none());
        assert!(wire.is_empty(), "completed field must be consumed");
        assert!(!decoder.is_idle());
    }

    #[test]
    fn request_drain_preserves_input_order() {
        let requests = [
            HashRequest::new(1, 10, 100),
            HashRequest::new(2, 20, 200),
            HashRequest::new(3, 30, 300),
        ];
        let mut wire = BytesMut::new();
        for request in requests {
            RequestEncoder
                .encode(request, &mut wire)
                .expect("encode should succeed");
        }
        let mut decoder = RequestDecoder::new();
        assert_eq!(decoder.decode_all(&mut wire), requests);
        assert!(decoder.is_idle());
    }

    #[test]
    fn response_round_trips() {
        let result = sample_result();
        let mut wire = encode_result(&result);
        let mut decoder = ResponseDecoder::new();
        let decoded = decoder
            .decode(&mut wire)
            .expect("decode should succeed")
            .expect("expected a frame");
        assert_eq!(decoded, result);
        assert!(wire.is_empty());
        assert!(decoder.is_idle());
    }

    #[test]
    fn empty_collision_list_skips_to_trailer() {
        let mut result = HashResult::new(-4, 0);
        result.set_last_packet(false);
        let mut wire = encode_result(&result);
        let mut decoder = ResponseDecoder::new();
        let decoded = decoder
            .decode(&mut wire)
            .expect("decode should succeed")
            .expect("expected a frame");
        assert_eq!(decoded, result);
    }

    #[rstest]
    #[case::zero(0, false)]
    #[case::one(1, true)]
    #[case::arbitrary(0xab, true)]
    fn last_packet_flag_is_nonzero_boolean(#[case] flag: u8, #[case] expected: bool) {
        let mut wire = BytesMut::new();
        wire.put_i32(0); // collision count
        wire.put_i32(11); // request id
        wire.put_u8(1); // generator id
        wire.put_u8(flag);
        let decoded = ResponseDecoder::new()
            .decode(&mut wire)
            .expect("decode should succeed")
            .expect("expected a frame");
        assert_eq!(decoded.last_packet(), expected);
    }

    #[test]
    fn negative_collision_count_is_rejected() {
        let mut wire = BytesMut::new();
        wire.put_i32(-1);
        let err = ResponseDecoder::new()
            .decode(&mut wire)
            .expect_err("expected decode to fail");
        assert!(matches!(err, CodecError::NegativeCollisionCount(-1)));
    }

    #[test]
    fn declared_count_bounds_the_collision_list() {
        let result = sample_result();
        let mut wire = encode_result(&result);
        // Append a second frame so extra bytes are available beyond the first.
        wire.extend_from_slice(&encode_result(&result));
        let mut decoder = ResponseDecoder::new();
        let frames = decoder.decode_all(&mut wire).expect("decode should succeed");
        assert_eq!(frames.len(), 2);
        for frame in frames {
            assert_eq!(frame.collisions().len(), result.collisions().len());
        }
    }

    #[test]
    fn oversized_preallocation_is_deferred() {
        let mut wire = BytesMut::new();
        wire.put_i32(i32::MAX);
        let mut decoder = ResponseDecoder::new();
        // Only the count is buffered, so the decoder parks awaiting the
        // first collision hash without reserving i32::MAX entries.
        assert!(decoder.decode(&mut wire).expect("decode").is_none());
        assert!(!decoder.is_idle());
    }

    #[test]
    fn response_resumes_at_every_split_point() {
        let result = sample_result();
        let full = encode_result(&result);
        for split in 0..=full.len() {
            let mut decoder = ResponseDecoder::new();
            let mut first = BytesMut::from(&full[..split]);
            let early = decoder.decode(&mut first).expect("decode should succeed");
            if split == full.len() {
                assert_eq!(early.as_ref(), Some(&result));
                continue;
            }
            assert!(early.is_none(), "split at {split} produced a premature frame");
            first.extend_from_slice(&full[split..]);
            let decoded = decoder
                .decode(&mut first)
                .expect("decode should succeed")
                .expect("expected a frame after the remainder arrived");
            assert_eq!(decoded, result);
        }
    }
}
