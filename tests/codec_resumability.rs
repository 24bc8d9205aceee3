//! Resumability and draining coverage for the wire codecs.
//!
//! A frame fed whole, split at any byte boundary, or delivered in arbitrary
//! chunks must decode to the same value, and fully-buffered message runs must
//! drain in one call with the decoder back at its initial state.

use bytes::BytesMut;
use hashframe::{
    codec::{RequestDecoder, RequestEncoder, ResponseDecoder, ResponseEncoder},
    frame::{Collision, HashRequest, HashResult},
};
use proptest::prelude::*;
use rstest::rstest;
use tokio_util::codec::{Decoder, Encoder};

fn encode_requests(requests: &[HashRequest]) -> BytesMut {
    let mut wire = BytesMut::new();
    for request in requests {
        RequestEncoder
            .encode(*request, &mut wire)
            .expect("encode should succeed");
    }
    wire
}

fn encode_results(results: &[HashResult]) -> BytesMut {
    let mut wire = BytesMut::new();
    for result in results {
        ResponseEncoder
            .encode(result.clone(), &mut wire)
            .expect("encode should succeed");
    }
    wire
}

fn result_fixture(request_id: i32, collisions: usize, last: bool) -> HashResult {
    let mut result = HashResult::new(request_id, 1);
    for i in 0..collisions {
        let mut collision = Collision::new(0x1000 + i32::try_from(i).expect("small index"));
        collision.set_count(u16::try_from(2 + i).expect("small count"));
        result.push_collision(collision);
    }
    result.set_last_packet(last);
    result
}

#[test]
fn request_decodes_identically_at_every_split_point() {
    let request = HashRequest::new(0x0a0b_0c0d, -5, 77);
    let full = encode_requests(&[request]);

    for split in 0..full.len() {
        let mut decoder = RequestDecoder::new();
        let mut buffer = BytesMut::from(&full[..split]);
        assert!(
            decoder
                .decode(&mut buffer)
                .expect("decode should succeed")
                .is_none(),
            "split at {split} produced a premature frame",
        );
        buffer.extend_from_slice(&full[split..]);
        let decoded = decoder
            .decode(&mut buffer)
            .expect("decode should succeed")
            .expect("expected a frame after the remainder arrived");
        assert_eq!(decoded, request);
        assert!(decoder.is_idle());
    }
}

#[rstest]
#[case::no_collisions(result_fixture(1, 0, true))]
#[case::one_collision(result_fixture(-9, 1, false))]
#[case::several_collisions(result_fixture(3, 5, true))]
fn response_decodes_identically_at_every_split_point(#[case] result: HashResult) {
    let full = encode_results(std::slice::from_ref(&result));

    for split in 0..full.len() {
        let mut decoder = ResponseDecoder::new();
        let mut buffer = BytesMut::from(&full[..split]);
        assert!(
            decoder
                .decode(&mut buffer)
                .expect("decode should succeed")
                .is_none(),
            "split at {split} produced a premature frame",
        );
        buffer.extend_from_slice(&full[split..]);
        let decoded = decoder
            .decode(&mut buffer)
            .expect("decode should succeed")
            .expect("expected a frame after the remainder arrived");
        assert_eq!(decoded, result);
        assert!(decoder.is_idle());
    }
}

#[test]
fn buffered_message_runs_drain_in_one_call() {
    let requests: Vec<HashRequest> = (0..8)
        .map(|i| HashRequest::new(i, i * 16, i * 100))
        .collect();
    let mut wire = encode_requests(&requests);
    let mut decoder = RequestDecoder::new();
    assert_eq!(decoder.decode_all(&mut wire), requests);
    assert!(wire.is_empty());
    assert!(decoder.is_idle());

    let results: Vec<HashResult> = (0..5)
        .map(|i| result_fixture(i, usize::try_from(i).expect("small index"), i == 4))
        .collect();
    let mut wire = encode_results(&results);
    let mut decoder = ResponseDecoder::new();
    assert_eq!(
        decoder.decode_all(&mut wire).expect("decode should succeed"),
        results,
    );
    assert!(wire.is_empty());
    assert!(decoder.is_idle());
}

#[test]
fn trailing_partial_frame_stays_pending_after_a_drain() {
    let requests = [HashRequest::new(1, 2, 3), HashRequest::new(4, 5, 6)];
    let mut wire = encode_requests(&requests);
    // Chop the last frame short by one byte.
    let keep = wire.len() - 1;
    let mut truncated = wire.split_to(keep);

    let mut decoder = RequestDecoder::new();
    assert_eq!(decoder.decode_all(&mut truncated), requests[..1]);
    assert!(!decoder.is_idle());

    truncated.extend_from_slice(&wire);
    assert_eq!(decoder.decode_all(&mut truncated), requests[1..]);
    assert!(decoder.is_idle());
}

fn chunk_plan(len: usize) -> impl Strategy<Value = Vec<usize>> {
    // Cut points over the wire image; duplicates collapse to empty chunks.
    proptest::collection::vec(0..=len, 0..8).prop_map(move |mut cuts| {
        cuts.push(0);
        cuts.push(len);
        cuts.sort_unstable();
        cuts
    })
}

proptest! {
    #[test]
    fn request_stream_survives_arbitrary_chunking(
        requests in proptest::collection::vec(
            (any::<i32>(), any::<i32>(), any::<i32>())
                .prop_map(|(id, array_length, num_samples)| {
                    HashRequest::new(id, array_length, num_samples)
                }),
            1..6,
        ),
        plan in chunk_plan(6 * 12),
    ) {
        let wire = encode_requests(&requests);
        let mut decoder = RequestDecoder::new();
        let mut buffer = BytesMut::new();
        let mut decoded = Vec::new();
        for window in plan.windows(2) {
            let (from, to) = (window[0].min(wire.len()), window[1].min(wire.len()));
            buffer.extend_from_slice(&wire[from..to]);
            decoded.extend(decoder.decode_all(&mut buffer));
        }
        // Deliver whatever the plan did not cover.
        let covered = plan.last().copied().unwrap_or(0).min(wire.len());
        buffer.extend_from_slice(&wire[covered..]);
        decoded.extend(decoder.decode_all(&mut buffer));
        prop_assert_eq!(decoded, requests);
        prop_assert!(decoder.is_idle());
    }
}
