//! Atom sink boundary
//!
//! The learning core records each ingested event as a symbolic atom. The
//! sink is a trait so hosts can route atoms into their real knowledge store;
//! the bundled in-memory implementation is the default and is also what the
//! tests exercise.

use crate::error::Result;
use crate::types::{Atom, AtomId};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Write-side boundary to the underlying knowledge store
#[async_trait]
pub trait AtomSink: Send + Sync {
    /// Persist an atom, returning its identifier
    ///
    /// A failure here is fatal to the ingesting call and surfaces as a
    /// retryable store error.
    async fn add_atom(&self, atom: Atom) -> Result<AtomId>;

    /// Fetch a previously written atom
    async fn get_atom(&self, id: AtomId) -> Result<Option<Atom>>;
}

/// In-memory atom store
pub struct MemoryAtomStore {
    atoms: RwLock<HashMap<AtomId, Atom>>,
}

impl MemoryAtomStore {
    pub fn new() -> Self {
        Self {
            atoms: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored atoms
    pub async fn len(&self) -> usize {
        self.atoms.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.atoms.read().await.is_empty()
    }
}

impl Default for MemoryAtomStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AtomSink for MemoryAtomStore {
    async fn add_atom(&self, atom: Atom) -> Result<AtomId> {
        let id = atom.id;
        let mut atoms = self.atoms.write().await;
        atoms.insert(id, atom);
        Ok(id)
    }

    async fn get_atom(&self, id: AtomId) -> Result<Option<Atom>> {
        let atoms = self.atoms.read().await;
        Ok(atoms.get(&id).cloned())
    }
}
