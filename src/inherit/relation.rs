//! Relation store: directed inheritance edges between entities

use serde::Serialize;

use crate::entity::{EntityKey, EntityStore};

use super::chain;
use super::conflict::Conflict;

/// One directed inheritance edge. Explicit relations come from an
/// `inherit` keyword, implicit ones from a bare type+name reference in the
/// block body; both resolve identically and the flag exists for
/// diagnostics only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Relation {
    pub child: EntityKey,
    pub parent: EntityKey,
    pub explicit: bool,
}

impl Relation {
    pub fn explicit(child: EntityKey, parent: EntityKey) -> Self {
        Self {
            child,
            parent,
            explicit: true,
        }
    }

    pub fn implicit(child: EntityKey, parent: EntityKey) -> Self {
        Self {
            child,
            parent,
            explicit: false,
        }
    }
}

/// All inheritance edges of one compilation unit, in declaration order.
///
/// `add` is the only mutating operation in the subsystem besides entity
/// registration; everything downstream is pure computation over the
/// stored graph.
#[derive(Debug, Default)]
pub struct RelationStore {
    relations: Vec<Relation>,
}

impl RelationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an edge, rejecting kind mismatches, unregistered parents, and
    /// cycles. On rejection the graph is left exactly as it was
    /// (transactional rollback for the cycle case).
    pub fn add(&mut self, entities: &EntityStore, relation: Relation) -> Result<(), Conflict> {
        if relation.child.kind != relation.parent.kind {
            return Err(Conflict::TypeMismatch {
                child: relation.child.kind,
                parent: relation.parent.kind,
            });
        }

        if !entities.exists(&relation.parent) {
            return Err(Conflict::UndefinedParent {
                name: relation.parent.name.clone(),
                kind: relation.parent.kind,
            });
        }

        // Tentatively commit, then probe for a cycle from the child
        let child = relation.child.clone();
        self.relations.push(relation);
        if let Some(path) = chain::find_cycle(self, &child) {
            self.relations.pop();
            return Err(Conflict::CircularDependency { path });
        }

        Ok(())
    }

    /// Remove a specific edge; returns whether one was removed
    pub fn remove(&mut self, child: &EntityKey, parent: &EntityKey) -> bool {
        let before = self.relations.len();
        self.relations
            .retain(|r| !(&r.child == child && &r.parent == parent));
        self.relations.len() != before
    }

    /// Direct parents of an entity, in declaration order
    pub fn parents_of(&self, key: &EntityKey) -> Vec<&EntityKey> {
        self.relations
            .iter()
            .filter(|r| &r.child == key)
            .map(|r| &r.parent)
            .collect()
    }

    /// Direct children of an entity, in declaration order
    pub fn children_of(&self, key: &EntityKey) -> Vec<&EntityKey> {
        self.relations
            .iter()
            .filter(|r| &r.parent == key)
            .map(|r| &r.child)
            .collect()
    }

    /// All edges whose child is the given entity
    pub fn relations_of(&self, key: &EntityKey) -> Vec<&Relation> {
        self.relations.iter().filter(|r| &r.child == key).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Relation> {
        self.relations.iter()
    }

    pub fn len(&self) -> usize {
        self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }
}
