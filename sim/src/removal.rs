//! Frame-scoped set of entities slated for destruction.
//!
//! A `RemovalSet` is immutable once built. Parallel batch tasks only ever see
//! a shared reference to the set frozen at the start of their phase; the
//! orchestrator commits a phase by building a new set from the old one plus
//! the phase's additions. There is no way to mutate a set in place, so a
//! reader can never observe a concurrent write.

use bevy_ecs::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

/// Immutable, cheaply clonable set of entities marked for removal.
#[derive(Debug, Clone, Default)]
pub struct RemovalSet {
    entities: Arc<HashSet<Entity>>,
}

impl RemovalSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entities(entities: impl IntoIterator<Item = Entity>) -> Self {
        Self {
            entities: Arc::new(entities.into_iter().collect()),
        }
    }

    #[inline]
    pub fn contains(&self, entity: Entity) -> bool {
        self.entities.contains(&entity)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.iter().copied()
    }

    /// Build the next frozen set: this set united with `additions`.
    ///
    /// Union is idempotent, so an entity flagged by several phases is still
    /// removed exactly once. Returns a clone of `self` when nothing is new.
    #[must_use]
    pub fn committed(&self, additions: impl IntoIterator<Item = Entity>) -> Self {
        let fresh: Vec<Entity> = additions
            .into_iter()
            .filter(|entity| !self.entities.contains(entity))
            .collect();
        if fresh.is_empty() {
            return self.clone();
        }
        let mut next = HashSet::with_capacity(self.entities.len() + fresh.len());
        next.extend(self.entities.iter().copied());
        next.extend(fresh);
        Self {
            entities: Arc::new(next),
        }
    }

    /// Entities sorted by index, for deterministic comparisons.
    pub fn sorted(&self) -> Vec<Entity> {
        let mut entities: Vec<Entity> = self.iter().collect();
        entities.sort();
        entities
    }
}

impl PartialEq for RemovalSet {
    fn eq(&self, other: &Self) -> bool {
        self.entities == other.entities
    }
}

impl Eq for RemovalSet {}
