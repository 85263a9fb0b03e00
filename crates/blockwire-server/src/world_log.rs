//! Append-only log of block edits, replayed to late joiners.
//!
//! Entries are never removed or rewritten. A later entry for the same
//! coordinate supersedes an earlier one when replayed in order.

use blockwire_net::BlockChange;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct WorldLog {
    changes: RwLock<Vec<BlockChange>>,
}

impl WorldLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an edit. Amortized O(1).
    pub async fn append(&self, change: BlockChange) {
        self.changes.write().await.push(change);
    }

    /// All edits in append order, as of one point in time.
    pub async fn snapshot(&self) -> Vec<BlockChange> {
        self.changes.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.changes.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.changes.read().await.is_empty()
    }
}
