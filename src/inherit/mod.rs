//! Inheritance graph: relations, chain resolution, merging, and conflicts
//!
//! The graph is append-only within one compilation run. Entities and
//! relations are registered by the front end; everything downstream
//! (chain building, merging, conflict detection) is pure computation over
//! the stored graph, safe to re-run on demand.

pub mod chain;
pub mod conflict;
pub mod merge;
pub mod relation;

pub use chain::{build_chain, build_chain_skipping, find_cycle, has_cycle};
pub use conflict::{Conflict, ConflictDetector, ValidationReport};
pub use merge::{Merged, Merger, ResolvedProperty};
pub use relation::{Relation, RelationStore};
