//! SHA-256 hashing utilities for the chain.
//!
//! Digests are carried as lowercase hex text. The mining target is defined
//! over that text ("N leading `0` characters"), not over the raw bytes.

use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};
use std::fmt;

/// Predecessor link stored in the genesis block.
pub const GENESIS_PARENT: &str = "0";

/// Textual digest of a block (64 lowercase hex characters for SHA-256).
#[derive(Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Digest(String);

impl Digest {
    /// The sentinel link of the genesis block.
    pub fn genesis_parent() -> Self {
        Self(GENESIS_PARENT.to_string())
    }

    /// Wrap already-encoded digest text.
    pub fn from_hex(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the first `difficulty` characters are all `'0'`.
    ///
    /// A digest shorter than `difficulty` never qualifies.
    pub fn has_leading_zeros(&self, difficulty: usize) -> bool {
        self.0.len() >= difficulty && self.0.bytes().take(difficulty).all(|b| b == b'0')
    }

    /// Short form for log lines and terminal output.
    pub fn short(&self) -> &str {
        let end = self.0.len().min(16);
        &self.0[..end]
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.short())
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Digest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Hash arbitrary data with SHA-256.
pub fn hash(data: &[u8]) -> Digest {
    Digest(hex::encode(Sha256::digest(data)))
}

/// Compute a block digest.
///
/// The pre-image is the concatenation, without separators, of the decimal
/// `index`, the raw `payload`, the predecessor digest text, the decimal
/// `created_at` and the decimal `nonce`. The field order is part of the
/// format: other implementations must be able to re-verify a chain.
pub fn block_digest(
    index: u64,
    payload: &str,
    previous_digest: &Digest,
    created_at: u64,
    nonce: u64,
) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update(index.to_string().as_bytes());
    hasher.update(payload.as_bytes());
    hasher.update(previous_digest.as_str().as_bytes());
    hasher.update(created_at.to_string().as_bytes());
    hasher.update(nonce.to_string().as_bytes());
    Digest(hex::encode(hasher.finalize()))
}
