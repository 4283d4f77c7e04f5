//! Specialization operations: child-local edits applied after chain merge
//!
//! Customs may delete inherited properties, variables, tags, or whole
//! ancestors, insert tags at positional anchors, and override inherited
//! values. Templates never carry these operations.

pub mod engine;

pub use engine::{FinalState, ResolvedSequence, ResolvedStyle, Specializer};

use std::fmt;

use serde::Serialize;

use crate::entity::Tag;

/// Anchor for a tag insertion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InsertPosition {
    Before,
    After,
    Replace,
    AtTop,
    AtBottom,
}

/// Addresses a tag in a merged Element sequence.
///
/// Positions are evaluated against the sequence as mutated by all prior
/// operations in the same replay; deleted tags remain addressable at their
/// original slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SeqTarget {
    /// First tag with this name
    Name(String),
    /// Absolute slot position
    Index(usize),
    /// The n-th (zero-based) tag with this name, e.g. `div[1]`
    NamedIndex(String, usize),
}

impl fmt::Display for SeqTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeqTarget::Name(name) => f.write_str(name),
            SeqTarget::Index(index) => write!(f, "[{}]", index),
            SeqTarget::NamedIndex(name, index) => write!(f, "{}[{}]", name, index),
        }
    }
}

/// One specialization operation, stored per-entity in declaration order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SpecializeOp {
    /// Remove a style property; removing an absent key is a no-op
    DeleteProperty(String),
    /// Remove a variable; removing an absent key is a no-op
    DeleteVariable(String),
    /// Tombstone a tag in the merged sequence
    DeleteElement(SeqTarget),
    /// Suppress a whole ancestor's merge contribution by parent name.
    /// The relation edge itself stays in the graph for cycle detection.
    DeleteInheritance(String),
    /// Insert tags relative to an anchor. `AtTop`/`AtBottom` ignore the
    /// target; the other positions require one.
    InsertElement {
        position: InsertPosition,
        target: Option<SeqTarget>,
        content: Vec<Tag>,
    },
    /// Override an inherited value without deleting it. Distinguished from
    /// a fresh child-declared property only for audit purposes.
    SpecializeProperty { name: String, value: String },
}
