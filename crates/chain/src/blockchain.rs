//! Main chain orchestration.
//!
//! The chain is allowed to become invalid: editing a block is a supported
//! operation, and validity is reported as a value rather than an error.

use hashchain_core::{Block, Digest};
use serde::Serialize;
use thiserror::Error;

/// Leading zero characters required when no difficulty is configured.
pub const DEFAULT_DIFFICULTY: usize = 4;

/// Errors that can occur during chain operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    #[error("invalid block index {index} (chain length {len})")]
    InvalidIndex { index: usize, len: usize },
}

pub type Result<T> = std::result::Result<T, ChainError>;

/// First integrity failure found while scanning the chain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainFault {
    #[error("block {index} digest does not match its contents")]
    InvalidDigest { index: usize },

    #[error("block {index} does not link to its predecessor")]
    BrokenLink { index: usize },

    #[error("block {index} is marked corrupted")]
    Corrupted { index: usize },
}

impl ChainFault {
    /// Position of the offending block.
    pub fn index(&self) -> usize {
        match self {
            Self::InvalidDigest { index }
            | Self::BrokenLink { index }
            | Self::Corrupted { index } => *index,
        }
    }
}

/// Chain configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainConfig {
    /// Leading zero characters a mined digest must start with.
    pub difficulty: usize,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            difficulty: DEFAULT_DIFFICULTY,
        }
    }
}

/// Ordered, single-writer sequence of blocks.
#[derive(Debug, Clone)]
pub struct Blockchain {
    /// Blocks in insertion order; index 0 is genesis.
    blocks: Vec<Block>,
    /// Configuration, fixed for the lifetime of the chain.
    config: ChainConfig,
}

impl Blockchain {
    /// Create a chain at the default difficulty.
    pub fn new() -> Self {
        Self::with_config(ChainConfig::default())
    }

    /// Create a chain at the given difficulty.
    pub fn with_difficulty(difficulty: usize) -> Self {
        Self::with_config(ChainConfig { difficulty })
    }

    /// Create a chain with the given configuration. Mines the genesis block.
    pub fn with_config(config: ChainConfig) -> Self {
        Self {
            blocks: vec![Self::mined_genesis(&config)],
            config,
        }
    }

    fn mined_genesis(config: &ChainConfig) -> Block {
        let genesis = Block::genesis().mined(config.difficulty);
        tracing::debug!(
            nonce = genesis.nonce(),
            digest = %genesis.digest().short(),
            "genesis mined"
        );
        genesis
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    pub fn difficulty(&self) -> usize {
        self.config.difficulty
    }

    /// Number of blocks, genesis included. Never zero.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Always false: a chain holds at least its genesis block.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// All blocks in chain order.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Get a block by position.
    pub fn block(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    /// Get the tip of the chain.
    pub fn latest_block(&self) -> &Block {
        // The vector is never empty: construction and reset both push genesis.
        &self.blocks[self.blocks.len() - 1]
    }

    /// Build an unmined block on top of the current tip.
    ///
    /// The chain itself is not modified.
    pub fn create_block(&self, payload: impl Into<String>) -> Block {
        let latest = self.latest_block();
        Block::new(latest.index() + 1, payload, latest.digest().clone())
    }

    /// Mine `block` at the chain's difficulty and append it.
    pub fn add_block(&mut self, mut block: Block) {
        block.mine(self.config.difficulty);
        tracing::debug!(
            index = block.index(),
            nonce = block.nonce(),
            digest = %block.digest().short(),
            "block mined"
        );
        self.blocks.push(block);
    }

    /// Scan the chain from genesis and report the first failing block.
    ///
    /// Genesis must be hash-consistent. Every later block must be
    /// hash-consistent, link to its predecessor's current digest, and not be
    /// flagged corrupted, checked in that order.
    pub fn verify(&self) -> std::result::Result<(), ChainFault> {
        if !self.blocks[0].is_valid() {
            return Err(ChainFault::InvalidDigest { index: 0 });
        }

        for (index, pair) in self.blocks.windows(2).enumerate() {
            let (previous, current) = (&pair[0], &pair[1]);
            let index = index + 1;

            if !current.is_valid() {
                return Err(ChainFault::InvalidDigest { index });
            }
            if current.previous_digest() != previous.digest() {
                return Err(ChainFault::BrokenLink { index });
            }
            if current.is_corrupted() {
                return Err(ChainFault::Corrupted { index });
            }
        }

        Ok(())
    }

    /// Whether every block passes every check.
    pub fn is_chain_valid(&self) -> bool {
        self.verify().is_ok()
    }

    /// Replace the payload of block `index`.
    ///
    /// The edited block and every block after it are flagged corrupted. The
    /// descendants are tainted unconditionally, without rechecking their links.
    pub fn edit_block(&mut self, index: usize, payload: impl Into<String>) -> Result<()> {
        self.check_index(index)?;

        self.blocks[index].update_payload(payload);
        for block in &mut self.blocks[index + 1..] {
            block.mark_corrupted();
        }

        tracing::info!(
            index,
            tainted = self.blocks.len() - index,
            "block edited"
        );
        Ok(())
    }

    /// Repair the seal of block `index`.
    ///
    /// Re-links the block to its predecessor (skipped for genesis), mines it,
    /// and points the immediate successor at the fresh digest. Nothing beyond
    /// that successor is touched: its corrupted flag stays set and the block
    /// after it now links to a stale digest. Each block has to be remined in
    /// turn to restore a valid chain.
    pub fn remine_block(&mut self, index: usize) -> Result<()> {
        self.check_index(index)?;

        if index > 0 {
            let previous = self.blocks[index - 1].digest().clone();
            self.blocks[index].relink(previous);
        }

        let difficulty = self.config.difficulty;
        let block = &mut self.blocks[index];
        block.mine(difficulty);
        let digest = block.digest().clone();

        tracing::info!(
            index,
            nonce = block.nonce(),
            digest = %digest.short(),
            "block remined"
        );

        if let Some(next) = self.blocks.get_mut(index + 1) {
            next.relink(digest);
        }

        Ok(())
    }

    /// Discard every block and start over from a freshly mined genesis.
    pub fn reset(&mut self) {
        self.blocks = vec![Self::mined_genesis(&self.config)];
        tracing::info!(difficulty = self.config.difficulty, "chain reset");
    }

    /// Summary of the chain state.
    pub fn stats(&self) -> ChainStats {
        ChainStats {
            length: self.blocks.len(),
            difficulty: self.config.difficulty,
            corrupted_blocks: self.blocks.iter().filter(|b| b.is_corrupted()).count(),
            latest_digest: self.latest_block().digest().clone(),
            valid: self.is_chain_valid(),
        }
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.blocks.len() {
            return Err(ChainError::InvalidIndex {
                index,
                len: self.blocks.len(),
            });
        }
        Ok(())
    }
}

impl Default for Blockchain {
    fn default() -> Self {
        Self::new()
    }
}

/// Chain statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainStats {
    /// Number of blocks, genesis included.
    pub length: usize,
    /// Configured mining difficulty.
    pub difficulty: usize,
    /// Blocks currently flagged corrupted.
    pub corrupted_blocks: usize,
    /// Digest of the tip.
    pub latest_digest: Digest,
    /// Result of the full validation scan.
    pub valid: bool,
}
