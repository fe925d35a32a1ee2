//! Upgrader registry
//!
//! Explicit registration list standing in for runtime discovery: every
//! shipped upgrader is wired in a fixed sequence at startup. The sequence
//! number doubles as the deterministic tie-break for equal order keys, so
//! re-runs reproduce the same execution order no matter how the registry
//! was iterated.

use std::sync::Arc;

use crate::upgrade::Upgrader;

/// An upgrader plus the sequence number it was registered under
#[derive(Clone)]
pub struct RegisteredUpgrader {
    pub upgrader: Arc<dyn Upgrader>,
    pub discovery_index: usize,
}

/// Registration list of all upgraders known to this node
#[derive(Default)]
pub struct UpgraderRegistry {
    entries: Vec<RegisteredUpgrader>,
}

impl UpgraderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, upgrader: Arc<dyn Upgrader>) {
        let discovery_index = self.entries.len();
        self.entries.push(RegisteredUpgrader {
            upgrader,
            discovery_index,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<RegisteredUpgrader> {
        self.entries
    }
}
