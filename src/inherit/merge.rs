//! Property merger: folds a chain's per-entity state into one flattened view

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::Serialize;

use crate::entity::{EntityBody, EntityKey, EntityStore, Tag};
use crate::error::ResolveError;

use super::chain;
use super::relation::RelationStore;

/// Audit record for one contribution to a merge.
///
/// Priorities increase along the root-first chain: the entity itself gets
/// the chain length (highest) and the most distant ancestor gets 1. The
/// conflict detector's override grouping and any explicit-wins re-ranking
/// rely on this exact assignment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedProperty {
    pub name: String,
    pub value: String,
    pub source: EntityKey,
    pub priority: usize,
}

/// Result of merging an ancestor chain, before specialization
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Merged {
    /// Flattened property map for Style and Var entities
    Properties(IndexMap<String, String>),
    /// Concatenated tag sequence for Element entities, root contributions
    /// first
    Sequence(Vec<Tag>),
}

/// Folds ancestor chains into flattened state, child overriding parent.
///
/// Pure computation over the stores; re-derivation on every call is
/// deliberate (the graph is append-only within one run, so no
/// invalidation tracking is needed for correctness).
#[derive(Debug)]
pub struct Merger<'a> {
    entities: &'a EntityStore,
    relations: &'a RelationStore,
}

impl<'a> Merger<'a> {
    pub fn new(entities: &'a EntityStore, relations: &'a RelationStore) -> Self {
        Self { entities, relations }
    }

    /// Merge the full ancestor chain of an entity
    pub fn resolve(&self, key: &EntityKey) -> Result<Merged, ResolveError> {
        self.resolve_skipping(key, &HashSet::new())
    }

    /// Merge with the named ancestors' contributions suppressed. The
    /// skipped names keep their relation edges; only their state is
    /// excised from the fold.
    pub fn resolve_skipping(
        &self,
        key: &EntityKey,
        skip: &HashSet<String>,
    ) -> Result<Merged, ResolveError> {
        let entity = self
            .entities
            .lookup(key)
            .ok_or_else(|| ResolveError::unknown(key))?;
        let links = chain::build_chain_skipping(self.relations, key, skip);

        match &entity.body {
            EntityBody::Style(_) | EntityBody::Var(_) => {
                let mut merged = IndexMap::new();
                for link in &links {
                    for (name, value) in self.own_properties(link)? {
                        merged.insert(name, value);
                    }
                }
                Ok(Merged::Properties(merged))
            }
            EntityBody::Element(_) => {
                let mut tags = Vec::new();
                for link in &links {
                    tags.extend(self.own_tags(link)?);
                }
                Ok(Merged::Sequence(tags))
            }
        }
    }

    /// Flattened property map for a Style or Var entity
    pub fn properties(&self, key: &EntityKey) -> Result<IndexMap<String, String>, ResolveError> {
        match self.resolve(key)? {
            Merged::Properties(map) => Ok(map),
            Merged::Sequence(_) => Err(ResolveError::NotProperties { key: key.clone() }),
        }
    }

    /// The full audit trail of the merge, one entry per contribution.
    ///
    /// Element sequences concatenate rather than override, so Element
    /// entities produce an empty history.
    pub fn history(&self, key: &EntityKey) -> Result<Vec<ResolvedProperty>, ResolveError> {
        if !self.entities.exists(key) {
            return Err(ResolveError::unknown(key));
        }
        let links = chain::build_chain(self.relations, key);
        let chain_len = links.len();

        let mut history = Vec::new();
        for (depth, link) in links.iter().enumerate() {
            let priority = depth + 1;
            debug_assert!(priority <= chain_len);
            for (name, value) in self.own_properties_if_any(link)? {
                history.push(ResolvedProperty {
                    name,
                    value,
                    source: link.clone(),
                    priority,
                });
            }
        }
        Ok(history)
    }

    /// An entity's own (non-inherited) property bag as owned pairs
    fn own_properties(&self, key: &EntityKey) -> Result<Vec<(String, String)>, ResolveError> {
        let entity = self.entities.lookup(key).ok_or_else(|| {
            ResolveError::internal(format!("chain member {} missing from entity store", key))
        })?;
        match &entity.body {
            EntityBody::Style(style) => Ok(style
                .properties
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()),
            EntityBody::Var(vars) => Ok(vars
                .vars
                .iter()
                .map(|(k, v)| (k.clone(), v.value.clone()))
                .collect()),
            EntityBody::Element(_) => Err(ResolveError::internal(format!(
                "chain for a property merge reached element entity {}",
                key
            ))),
        }
    }

    /// Like `own_properties` but yields nothing for Element entities
    fn own_properties_if_any(
        &self,
        key: &EntityKey,
    ) -> Result<Vec<(String, String)>, ResolveError> {
        let entity = self.entities.lookup(key).ok_or_else(|| {
            ResolveError::internal(format!("chain member {} missing from entity store", key))
        })?;
        match &entity.body {
            EntityBody::Element(_) => Ok(Vec::new()),
            _ => self.own_properties(key),
        }
    }

    fn own_tags(&self, key: &EntityKey) -> Result<Vec<Tag>, ResolveError> {
        let entity = self.entities.lookup(key).ok_or_else(|| {
            ResolveError::internal(format!("chain member {} missing from entity store", key))
        })?;
        match &entity.body {
            EntityBody::Element(element) => Ok(element.tags.clone()),
            _ => Err(ResolveError::internal(format!(
                "chain for a sequence merge reached non-element entity {}",
                key
            ))),
        }
    }
}
