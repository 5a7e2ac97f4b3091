//! Hash chain orchestration for hashchain.
//!
//! This crate owns the ordered sequence of blocks and the operations on it:
//! - **Growth**: building candidate blocks and mining them onto the tip
//! - **Validation**: a sequential scan reporting the first broken block
//! - **Tampering**: editing a block's payload, which taints everything after it
//! - **Repair**: re-mining a single block and re-linking its direct successor
//!
//! # Example
//!
//! ```rust
//! use hashchain_chain::Blockchain;
//!
//! let mut chain = Blockchain::with_difficulty(1);
//! let block = chain.create_block("Block 1");
//! chain.add_block(block);
//! assert!(chain.is_chain_valid());
//!
//! chain.edit_block(1, "tampered").unwrap();
//! assert!(!chain.is_chain_valid());
//!
//! chain.remine_block(1).unwrap();
//! assert!(chain.is_chain_valid());
//! ```

pub mod blockchain;

// Re-export commonly used types
pub use blockchain::{
    Blockchain, ChainConfig, ChainError, ChainFault, ChainStats, Result, DEFAULT_DIFFICULTY,
};
