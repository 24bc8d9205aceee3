//! Metric helpers for `hashframe`.
//!
//! This module defines metric names and simple helper functions
//! wrapping the [`metrics`](https://docs.rs/metrics) crate. Counters are
//! labelled by frame kind (`"request"` / `"result"`) or generator id.

use metrics::counter;

/// Name of the counter tracking decoded frames.
pub const FRAMES_DECODED: &str = "hashframe_frames_decoded_total";
/// Name of the counter tracking encoded frames.
pub const FRAMES_ENCODED: &str = "hashframe_frames_encoded_total";
/// Name of the counter tracking computed sample hashes.
pub const HASHES_COMPUTED: &str = "hashframe_hashes_computed_total";
/// Name of the counter tracking recorded collisions.
pub const COLLISIONS_RECORDED: &str = "hashframe_collisions_recorded_total";

/// Frame kind label for request frames.
pub const FRAME_REQUEST: &str = "request";
/// Frame kind label for result frames.
pub const FRAME_RESULT: &str = "result";

/// Record one decoded frame of the given kind.
pub fn inc_frames_decoded(frame: &'static str) {
    counter!(FRAMES_DECODED, "frame" => frame).increment(1);
}

/// Record one encoded frame of the given kind.
pub fn inc_frames_encoded(frame: &'static str) {
    counter!(FRAMES_ENCODED, "frame" => frame).increment(1);
}

/// Record a computed sample hash for a generator.
pub fn inc_hashes(generator_id: u8) {
    counter!(HASHES_COMPUTED, "generator" => generator_id.to_string()).increment(1);
}

/// Record a discovered collision for a generator.
pub fn inc_collisions(generator_id: u8) {
    counter!(COLLISIONS_RECORDED, "generator" => generator_id.to_string()).increment(1);
}
