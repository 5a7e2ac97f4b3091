//! Per-session chain storage.
//!
//! Each session key owns one [`Blockchain`] behind its own lock, so requests
//! for different sessions never wait on each other. Sessions are created on
//! first use and live until the process exits.

use hashchain_chain::{Blockchain, ChainConfig};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;

/// Handle to one session's chain.
pub type SharedChain = Arc<Mutex<Blockchain>>;

/// Keyed store of independent chains.
#[derive(Debug)]
pub struct SessionStore {
    /// Configuration used for every chain created by this store.
    config: ChainConfig,
    /// Chains indexed by session key.
    sessions: RwLock<HashMap<String, SharedChain>>,
}

impl SessionStore {
    pub fn new(config: ChainConfig) -> Self {
        Self {
            config,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Get the chain for `session_id`, creating a genesis-only one if needed.
    ///
    /// Creation mines the genesis block, so call this off the async executor.
    pub fn chain(&self, session_id: &str) -> SharedChain {
        if let Some(chain) = self.sessions.read().get(session_id) {
            return Arc::clone(chain);
        }

        let mut sessions = self.sessions.write();
        let chain = sessions.entry(session_id.to_string()).or_insert_with(|| {
            tracing::info!(session = session_id, "session created");
            Arc::new(Mutex::new(Blockchain::with_config(self.config)))
        });
        Arc::clone(chain)
    }

    /// Return the session's chain to its genesis-only state.
    pub fn reset(&self, session_id: &str) -> SharedChain {
        let chain = self.chain(session_id);
        chain.lock().reset();
        chain
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}
