//! Core primitives for hashchain.
//!
//! This crate provides the two leaf types of the chain:
//! - Digests and the block hashing function
//! - Blocks with proof-of-work sealing and tamper flags

pub mod block;
pub mod hash;

// Re-export commonly used types at the crate root
pub use block::{current_timestamp, Block, GENESIS_PAYLOAD};
pub use hash::{block_digest, hash, Digest, GENESIS_PARENT};
