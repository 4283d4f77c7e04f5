//! Conflict classification and whole-graph validation

use serde::Serialize;
use thiserror::Error;

use crate::entity::{EntityKey, EntityKind, EntityStore};

use super::chain;
use super::merge::Merger;
use super::relation::RelationStore;

/// A structural or override conflict in the inheritance graph.
///
/// `TypeMismatch`, `UndefinedParent`, and `CircularDependency` are hard
/// rejects raised at `add_relation` time; `PropertyOverride` is a soft
/// diagnostic collected during validation and never blocks resolution.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
pub enum Conflict {
    /// A relation would close an inheritance loop. The path lists keys in
    /// traversal order, repeating the starting key to close the loop.
    #[error("circular dependency detected: {}", format_path(path))]
    CircularDependency { path: Vec<EntityKey> },

    /// Inheritance never crosses kinds
    #[error("type mismatch: {child} cannot inherit from {parent}")]
    TypeMismatch { child: EntityKind, parent: EntityKind },

    /// The named parent is not registered
    #[error("parent not found: {name} ({kind})")]
    UndefinedParent { name: String, kind: EntityKind },

    /// The same property name is contributed by more than one entity in a
    /// chain. The merge already resolved it deterministically; this is a
    /// report for shadowing-style tooling.
    #[error("property '{name}' defined by multiple entities: {}", format_sources(sources))]
    PropertyOverride {
        name: String,
        sources: Vec<EntityKey>,
    },
}

fn format_path(path: &[EntityKey]) -> String {
    path.iter()
        .map(|k| k.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

fn format_sources(sources: &[EntityKey]) -> String {
    sources
        .iter()
        .map(|k| k.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Runs structural checks over the registered graph and accumulates the
/// conflict list a diagnostics layer renders.
#[derive(Debug)]
pub struct ConflictDetector<'a> {
    entities: &'a EntityStore,
    relations: &'a RelationStore,
}

impl<'a> ConflictDetector<'a> {
    pub fn new(entities: &'a EntityStore, relations: &'a RelationStore) -> Self {
        Self { entities, relations }
    }

    /// Detect conflicts for one entity: cycle first, then override report.
    pub fn detect(&self, key: &EntityKey) -> Vec<Conflict> {
        let mut conflicts = Vec::new();

        if let Some(path) = chain::find_cycle(self.relations, key) {
            conflicts.push(Conflict::CircularDependency { path });
            // Property resolution is meaningless on a cyclic chain
            return conflicts;
        }

        let merger = Merger::new(self.entities, self.relations);
        let history = match merger.history(key) {
            Ok(history) => history,
            // Element sequences concatenate rather than override; unknown
            // entities are the caller's problem, not a graph conflict
            Err(_) => return conflicts,
        };

        let mut seen: Vec<(&str, Vec<EntityKey>)> = Vec::new();
        for entry in &history {
            match seen.iter_mut().find(|(name, _)| *name == entry.name) {
                Some((_, sources)) => {
                    if !sources.contains(&entry.source) {
                        sources.push(entry.source.clone());
                    }
                }
                None => seen.push((&entry.name, vec![entry.source.clone()])),
            }
        }
        for (name, sources) in seen {
            if sources.len() > 1 {
                conflicts.push(Conflict::PropertyOverride {
                    name: name.to_string(),
                    sources,
                });
            }
        }

        conflicts
    }

    /// Validate the whole registered graph.
    ///
    /// Returns the accumulated conflicts for every entity; the system is
    /// valid iff none of them is a `CircularDependency`. Type mismatches
    /// and undefined parents are rejected at `add_relation` time and
    /// cannot appear here.
    pub fn validate(&self) -> ValidationReport {
        let mut conflicts = Vec::new();
        for key in self.entities.keys() {
            conflicts.extend(self.detect(key));
        }
        ValidationReport { conflicts }
    }
}

/// Outcome of a full-system validation pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub conflicts: Vec<Conflict>,
}

impl ValidationReport {
    /// True iff no circular dependency was found. Property overrides are
    /// warnings and never invalidate the system.
    pub fn is_valid(&self) -> bool {
        !self
            .conflicts
            .iter()
            .any(|c| matches!(c, Conflict::CircularDependency { .. }))
    }
}
