//! Weft Semantics - inheritance and specialization resolution for the Weft
//! markup language
//!
//! This library takes the Template and Custom declarations produced by a
//! Weft front end and flattens them: inheritance chains are merged
//! root-first, Custom specialization operations are replayed on top, and
//! structural problems in the graph are reported as conflicts.
//!
//! # Example
//!
//! ```rust
//! use weft_semantics::{
//!     Declaration, Entity, EntityBody, EntityKey, InheritanceDecl, Resolver, StyleBody,
//! };
//!
//! let mut resolver = Resolver::new();
//! resolver
//!     .load(vec![
//!         Declaration::new(Entity::template(
//!             "Theme",
//!             EntityBody::Style(StyleBody::new().with_property("color", "red")),
//!         )),
//!         Declaration::new(Entity::template(
//!             "Button",
//!             EntityBody::Style(StyleBody::new().with_property("padding", "8px")),
//!         ))
//!         .inheriting(InheritanceDecl::explicit(EntityKey::style("Theme"))),
//!     ])
//!     .unwrap();
//!
//! let props = resolver.properties(&EntityKey::style("Button")).unwrap();
//! assert_eq!(props["color"], "red");
//! assert_eq!(props["padding"], "8px");
//! ```

pub mod entity;
pub mod error;
pub mod inherit;
pub mod resolver;
pub mod specialize;

pub use entity::{
    ElementBody, Entity, EntityBody, EntityCategory, EntityKey, EntityKind, EntityStore,
    RegistryError, StyleBody, Tag, VarBody, VarType, VarValue,
};
pub use error::{ResolveError, SemanticError};
pub use inherit::{
    Conflict, ConflictDetector, Merged, Merger, Relation, RelationStore, ResolvedProperty,
    ValidationReport,
};
pub use resolver::{Declaration, InheritanceDecl, Resolution, Resolver};
pub use specialize::{
    FinalState, InsertPosition, ResolvedSequence, ResolvedStyle, SeqTarget, SpecializeOp,
    Specializer,
};
