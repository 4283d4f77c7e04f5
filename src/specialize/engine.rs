//! Replays a Custom's specialization operations over its merged state

use std::collections::HashSet;

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

use crate::entity::{Entity, EntityBody, EntityKey, EntityStore, Tag};
use crate::error::ResolveError;
use crate::inherit::{Merged, Merger, RelationStore};

use super::{InsertPosition, SeqTarget, SpecializeOp};

/// Final flattened state of a resolved entity, ready for the emitter
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum FinalState {
    Properties(ResolvedStyle),
    Sequence(ResolvedSequence),
}

impl FinalState {
    /// The property map, if this is a Style/Var resolution
    pub fn properties(&self) -> Option<&IndexMap<String, String>> {
        match self {
            FinalState::Properties(style) => Some(&style.properties),
            FinalState::Sequence(_) => None,
        }
    }

    /// The live (deletion-filtered) tag sequence, if this is an Element
    /// resolution
    pub fn tags(&self) -> Option<Vec<&Tag>> {
        match self {
            FinalState::Sequence(seq) => Some(seq.tags()),
            FinalState::Properties(_) => None,
        }
    }
}

/// Resolved property map of a Style or Var entity
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResolvedStyle {
    pub properties: IndexMap<String, String>,
    /// Names overridden via `SpecializeProperty`, kept for audit output
    pub specialized: IndexSet<String>,
    /// Required property names that ended up with neither a value nor a
    /// default. Soft diagnostic; never blocks generation.
    pub missing_required: Vec<String>,
}

/// One slot of a resolved Element sequence. Deleted slots stay in place so
/// later operations can still address their original positions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Slot {
    pub tag: Tag,
    pub deleted: bool,
}

impl Slot {
    fn live(tag: Tag) -> Self {
        Self {
            tag,
            deleted: false,
        }
    }
}

/// Resolved tag sequence of an Element entity
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResolvedSequence {
    pub slots: Vec<Slot>,
}

impl ResolvedSequence {
    /// The live tags in order, tombstones filtered out
    pub fn tags(&self) -> Vec<&Tag> {
        self.slots
            .iter()
            .filter(|s| !s.deleted)
            .map(|s| &s.tag)
            .collect()
    }

    pub fn into_tags(self) -> Vec<Tag> {
        self.slots
            .into_iter()
            .filter(|s| !s.deleted)
            .map(|s| s.tag)
            .collect()
    }

    /// Resolve a target against the current slot state. Tombstoned slots
    /// remain addressable, so delete-then-replace at the same target is
    /// well-defined.
    fn resolve_target(&self, target: &SeqTarget) -> Option<usize> {
        match target {
            SeqTarget::Name(name) => self.slots.iter().position(|s| &s.tag.name == name),
            SeqTarget::Index(index) => (*index < self.slots.len()).then_some(*index),
            SeqTarget::NamedIndex(name, occurrence) => self
                .slots
                .iter()
                .enumerate()
                .filter(|(_, s)| &s.tag.name == name)
                .map(|(pos, _)| pos)
                .nth(*occurrence),
        }
    }
}

/// Applies a Custom's operations on top of its merged ancestor state.
///
/// Operations replay in declaration order and compose left-to-right:
/// every positional anchor is evaluated against the sequence as mutated
/// by all prior operations in the same replay.
#[derive(Debug)]
pub struct Specializer<'a> {
    entities: &'a EntityStore,
    relations: &'a RelationStore,
}

impl<'a> Specializer<'a> {
    pub fn new(entities: &'a EntityStore, relations: &'a RelationStore) -> Self {
        Self { entities, relations }
    }

    /// Merge an entity's chain and replay its specializations.
    ///
    /// Templates carry no operations and pass their merged state through
    /// unchanged; a Template with recorded operations is a front-end bug
    /// and is rejected.
    pub fn apply(&self, key: &EntityKey) -> Result<FinalState, ResolveError> {
        let entity = self
            .entities
            .lookup(key)
            .ok_or_else(|| ResolveError::unknown(key))?;
        if !entity.is_custom() && !entity.ops.is_empty() {
            return Err(ResolveError::NotCustom { key: key.clone() });
        }

        // `delete inherit` reruns the merge with the named ancestors'
        // chain segments skipped; the skip set is collected up front so
        // the merge happens once.
        let skip: HashSet<String> = entity
            .ops
            .iter()
            .filter_map(|op| match op {
                SpecializeOp::DeleteInheritance(name) => Some(name.clone()),
                _ => None,
            })
            .collect();

        let merger = Merger::new(self.entities, self.relations);
        let merged = merger.resolve_skipping(key, &skip)?;

        match merged {
            Merged::Properties(properties) => {
                self.replay_properties(key, entity, properties)
            }
            Merged::Sequence(tags) => self.replay_sequence(key, entity, tags),
        }
    }

    fn replay_properties(
        &self,
        key: &EntityKey,
        entity: &Entity,
        properties: IndexMap<String, String>,
    ) -> Result<FinalState, ResolveError> {
        let mut state = ResolvedStyle {
            properties,
            ..Default::default()
        };

        for op in &entity.ops {
            match op {
                SpecializeOp::DeleteProperty(name) | SpecializeOp::DeleteVariable(name) => {
                    // Idempotent: deleting an absent key never fails
                    state.properties.shift_remove(name);
                }
                SpecializeOp::SpecializeProperty { name, value } => {
                    state.properties.insert(name.clone(), value.clone());
                    state.specialized.insert(name.clone());
                }
                SpecializeOp::DeleteInheritance(_) => {}
                SpecializeOp::DeleteElement(_) | SpecializeOp::InsertElement { .. } => {
                    return Err(ResolveError::NotSequence { key: key.clone() });
                }
            }
        }

        if let EntityBody::Style(style) = &entity.body {
            for (name, value) in &style.defaults {
                if !state.properties.contains_key(name) {
                    state.properties.insert(name.clone(), value.clone());
                }
            }
            for name in &style.required {
                let has_value = state.properties.contains_key(name);
                if !has_value && !style.optional.contains(name) {
                    state.missing_required.push(name.clone());
                }
            }
        }

        Ok(FinalState::Properties(state))
    }

    fn replay_sequence(
        &self,
        key: &EntityKey,
        entity: &Entity,
        tags: Vec<Tag>,
    ) -> Result<FinalState, ResolveError> {
        let mut seq = ResolvedSequence {
            slots: tags.into_iter().map(Slot::live).collect(),
        };

        for op in &entity.ops {
            match op {
                SpecializeOp::DeleteElement(target) => {
                    let pos = seq.resolve_target(target).ok_or_else(|| {
                        ResolveError::TargetNotFound {
                            target: target.to_string(),
                        }
                    })?;
                    seq.slots[pos].deleted = true;
                }
                SpecializeOp::InsertElement {
                    position,
                    target,
                    content,
                } => {
                    self.insert(&mut seq, *position, target.as_ref(), content)?;
                }
                SpecializeOp::DeleteInheritance(_) => {}
                SpecializeOp::DeleteProperty(_)
                | SpecializeOp::DeleteVariable(_)
                | SpecializeOp::SpecializeProperty { .. } => {
                    return Err(ResolveError::NotProperties { key: key.clone() });
                }
            }
        }

        Ok(FinalState::Sequence(seq))
    }

    fn insert(
        &self,
        seq: &mut ResolvedSequence,
        position: InsertPosition,
        target: Option<&SeqTarget>,
        content: &[Tag],
    ) -> Result<(), ResolveError> {
        let slots: Vec<Slot> = content.iter().cloned().map(Slot::live).collect();
        match position {
            InsertPosition::AtTop => {
                seq.slots.splice(0..0, slots);
            }
            InsertPosition::AtBottom => {
                seq.slots.extend(slots);
            }
            InsertPosition::Before | InsertPosition::After | InsertPosition::Replace => {
                let target = target.ok_or_else(|| {
                    ResolveError::internal("insert position requires a target")
                })?;
                let pos = seq.resolve_target(target).ok_or_else(|| {
                    ResolveError::TargetNotFound {
                        target: target.to_string(),
                    }
                })?;
                match position {
                    InsertPosition::Before => {
                        seq.slots.splice(pos..pos, slots);
                    }
                    InsertPosition::After => {
                        seq.slots.splice(pos + 1..pos + 1, slots);
                    }
                    InsertPosition::Replace => {
                        // Tombstone the original and splice the content at
                        // its position, so the replacement occupies the
                        // original slot in the flattened output
                        seq.slots[pos].deleted = true;
                        seq.slots.splice(pos + 1..pos + 1, slots);
                    }
                    _ => unreachable!(),
                }
            }
        }
        Ok(())
    }
}
