//! Frame types for the hashcode wire protocol.
//!
//! A request asks a peer to hash `num_samples` random buffers of
//! `array_length` bytes; results come back as one or more [`HashResult`]
//! frames per request, the last one flagged with `last_packet`.

/// One hash workload request. Immutable once decoded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HashRequest {
    /// Identifier correlating results with this request.
    pub id: i32,
    /// Length in bytes of each sample buffer.
    pub array_length: i32,
    /// Number of sample buffers to hash.
    pub num_samples: i32,
}

impl HashRequest {
    /// Create a request.
    #[must_use]
    pub const fn new(id: i32, array_length: i32, num_samples: i32) -> Self {
        Self {
            id,
            array_length,
            num_samples,
        }
    }
}

/// One hash value observed for two or more distinct samples.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Collision {
    hash: i32,
    count: u16,
}

impl Collision {
    /// Record a fresh collision. A collision requires at least two
    /// occurrences, so the count starts at 2.
    #[must_use]
    pub const fn new(hash: i32) -> Self { Self { hash, count: 2 } }

    /// The colliding hash value.
    #[must_use]
    pub const fn hash(self) -> i32 { self.hash }

    /// Number of distinct samples observed with this hash.
    #[must_use]
    pub const fn count(self) -> u16 { self.count }

    /// Overwrite the occurrence count (used when decoding off the wire).
    pub fn set_count(&mut self, count: u16) { self.count = count; }

    /// Record one further occurrence.
    pub fn increment(&mut self) { self.count = self.count.wrapping_add(1); }
}

/// One result frame for a request, carrying the collisions one generator
/// observed.
///
/// `collisions` is append-only while the frame is under construction;
/// insertion order is discovery order, not hash order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HashResult {
    request_id: i32,
    generator_id: u8,
    last_packet: bool,
    collisions: Vec<Collision>,
}

impl HashResult {
    /// Create a result frame for `request_id` produced by `generator_id`.
    #[must_use]
    pub fn new(request_id: i32, generator_id: u8) -> Self {
        Self {
            request_id,
            generator_id,
            last_packet: false,
            collisions: Vec::new(),
        }
    }

    /// Create an empty frame sized for `capacity` collisions.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            request_id: 0,
            generator_id: 0,
            last_packet: false,
            collisions: Vec::with_capacity(capacity),
        }
    }

    /// Identifier of the request this result answers.
    #[must_use]
    pub const fn request_id(&self) -> i32 { self.request_id }

    /// Set the request identifier.
    pub fn set_request_id(&mut self, request_id: i32) { self.request_id = request_id; }

    /// Identifier of the generator that produced this result.
    #[must_use]
    pub const fn generator_id(&self) -> u8 { self.generator_id }

    /// Set the generator identifier.
    pub fn set_generator_id(&mut self, generator_id: u8) { self.generator_id = generator_id; }

    /// Whether this is the final frame for the request.
    #[must_use]
    pub const fn last_packet(&self) -> bool { self.last_packet }

    /// Mark or clear the final-frame flag.
    pub fn set_last_packet(&mut self, last_packet: bool) { self.last_packet = last_packet; }

    /// Collisions recorded so far, in discovery order.
    #[must_use]
    pub fn collisions(&self) -> &[Collision] { &self.collisions }

    /// Append a newly discovered collision.
    pub fn push_collision(&mut self, collision: Collision) { self.collisions.push(collision); }

    /// The most recently appended collision, if any.
    pub fn last_collision_mut(&mut self) -> Option<&mut Collision> { self.collisions.last_mut() }

    /// The recorded collision for `hash`, if any.
    pub fn collision_mut(&mut self, hash: i32) -> Option<&mut Collision> {
        self.collisions
            .iter_mut()
            .find(|collision| collision.hash() == hash)
    }
}

/// Hash algorithms a peer may run for a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GeneratorKind {
    /// The 31-based polynomial hash used as a baseline.
    Polynomial,
    /// The accessor-backed MurmurHash3 generator.
    Murmur3,
}

impl GeneratorKind {
    /// Wire identifier of this generator.
    #[must_use]
    pub const fn id(self) -> u8 {
        match self {
            GeneratorKind::Polynomial => 0,
            GeneratorKind::Murmur3 => 1,
        }
    }

    /// Look a generator up by its wire identifier.
    #[must_use]
    pub const fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(GeneratorKind::Polynomial),
            1 => Some(GeneratorKind::Murmur3),
            _ => None,
        }
    }
}
