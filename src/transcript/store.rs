use super::types::Turn;
use parking_lot::RwLock;
use std::sync::Arc;

/// Append-only ordered log of conversation turns. Cloning shares the
/// underlying storage.
#[derive(Debug, Clone)]
pub struct TranscriptStore {
    turns: Arc<RwLock<Vec<Turn>>>,
}

impl TranscriptStore {
    pub fn new() -> Self {
        Self {
            turns: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn append(&self, turn: Turn) {
        self.turns.write().push(turn);
    }

    /// Snapshot of all turns in append order
    pub fn snapshot(&self) -> Vec<Turn> {
        self.turns.read().clone()
    }

    /// Destructive wholesale clear. Callers must have obtained an explicit
    /// confirmation gesture before invoking this.
    pub fn clear(&self) {
        self.turns.write().clear();
    }

    pub fn len(&self) -> usize {
        self.turns.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.read().is_empty()
    }
}

impl Default for TranscriptStore {
    fn default() -> Self {
        Self::new()
    }
}
