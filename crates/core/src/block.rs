//! Block structure and proof-of-work sealing.

use crate::hash::{block_digest, Digest};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Payload carried by the genesis block.
pub const GENESIS_PAYLOAD: &str = "Genesis Block";

/// A single block of the chain.
///
/// Every constructor and mutator recomputes the cached digest before it
/// returns, so a block built through this API never carries a stale digest.
/// `is_valid` still re-derives it, which matters for blocks that were
/// deserialized from an external record.
///
/// The serialized form is the wire record
/// `{index, data, previousHash, timestamp, nonce, hash, isCorrupted}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Position in the chain (0 for genesis).
    index: u64,
    /// Opaque content.
    #[serde(rename = "data")]
    payload: String,
    /// Digest of the predecessor, or `"0"` for genesis.
    #[serde(rename = "previousHash")]
    previous_digest: Digest,
    /// Unix timestamp in milliseconds. Advisory only.
    #[serde(rename = "timestamp")]
    created_at: u64,
    /// Proof-of-work search counter.
    nonce: u64,
    /// Cached digest over the five fields above.
    #[serde(rename = "hash")]
    digest: Digest,
    /// Integrity signal set by the chain on tampering.
    #[serde(rename = "isCorrupted")]
    corrupted: bool,
}

impl Block {
    /// Create an unmined block stamped with the current time.
    pub fn new(index: u64, payload: impl Into<String>, previous_digest: Digest) -> Self {
        Self::with_timestamp(index, payload, previous_digest, current_timestamp(), 0)
    }

    /// Create a block with an explicit timestamp and nonce.
    pub fn with_timestamp(
        index: u64,
        payload: impl Into<String>,
        previous_digest: Digest,
        created_at: u64,
        nonce: u64,
    ) -> Self {
        let payload = payload.into();
        let digest = block_digest(index, &payload, &previous_digest, created_at, nonce);
        Self {
            index,
            payload,
            previous_digest,
            created_at,
            nonce,
            digest,
            corrupted: false,
        }
    }

    /// Create the (unmined) genesis block.
    pub fn genesis() -> Self {
        Self::new(0, GENESIS_PAYLOAD, Digest::genesis_parent())
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn previous_digest(&self) -> &Digest {
        &self.previous_digest
    }

    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn digest(&self) -> &Digest {
        &self.digest
    }

    pub fn is_corrupted(&self) -> bool {
        self.corrupted
    }

    /// Check if this is the genesis block.
    pub fn is_genesis(&self) -> bool {
        self.index == 0 && self.previous_digest == Digest::genesis_parent()
    }

    /// Recompute the digest from the current fields without caching it.
    pub fn calculate_digest(&self) -> Digest {
        block_digest(
            self.index,
            &self.payload,
            &self.previous_digest,
            self.created_at,
            self.nonce,
        )
    }

    /// Search for a nonce whose digest starts with `difficulty` zero characters.
    ///
    /// The search restarts from nonce 0, so mining unchanged fields always
    /// lands on the same nonce and digest. Clears the corrupted flag.
    pub fn mine(&mut self, difficulty: usize) {
        self.nonce = 0;
        self.digest = self.calculate_digest();

        while !self.digest.has_leading_zeros(difficulty) {
            self.nonce += 1;
            self.digest = self.calculate_digest();
        }

        self.corrupted = false;
    }

    /// Mine the block and return it.
    pub fn mined(mut self, difficulty: usize) -> Self {
        self.mine(difficulty);
        self
    }

    /// Whether the cached digest matches the current fields.
    pub fn is_valid(&self) -> bool {
        self.digest == self.calculate_digest()
    }

    /// Whether the cached digest satisfies the mining target.
    pub fn meets_difficulty(&self, difficulty: usize) -> bool {
        self.digest.has_leading_zeros(difficulty)
    }

    /// Replace the payload, re-hash, and flag the block as corrupted.
    ///
    /// The block stays hash-consistent but no longer carries a valid seal.
    pub fn update_payload(&mut self, payload: impl Into<String>) {
        self.payload = payload.into();
        self.digest = self.calculate_digest();
        self.corrupted = true;
    }

    /// Point the block at a new predecessor and re-hash.
    ///
    /// Neither re-mines nor touches the corrupted flag.
    pub fn relink(&mut self, previous_digest: Digest) {
        self.previous_digest = previous_digest;
        self.digest = self.calculate_digest();
    }

    /// Flag the block as tainted by an upstream edit.
    pub fn mark_corrupted(&mut self) {
        self.corrupted = true;
    }
}

/// Current Unix timestamp in milliseconds.
pub fn current_timestamp() -> u64 {
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default()
}
