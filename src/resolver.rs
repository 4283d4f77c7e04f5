//! The resolution facade that ties the stores and engines together
//!
//! A front end builds [`Declaration`]s from the parse tree, feeds them to
//! [`Resolver::load`], and then asks for flattened state per entity. The
//! resolver owns the entity and relation stores; merge, specialization,
//! and conflict detection borrow them per call.

use std::collections::HashSet;
use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

use crate::entity::{Entity, EntityKey, EntityStore, RegistryError};
use crate::error::{ResolveError, SemanticError};
use crate::inherit::{
    build_chain, find_cycle, has_cycle, Conflict, ConflictDetector, Merger, Relation,
    RelationStore, ResolvedProperty, ValidationReport,
};
use crate::specialize::{FinalState, Specializer};

/// A parent named in a declaration's inherit list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InheritanceDecl {
    pub parent: EntityKey,
    /// `true` for `inherit Parent;` statements, `false` for bare
    /// composition shorthand. Both merge identically.
    pub explicit: bool,
}

impl InheritanceDecl {
    pub fn explicit(parent: EntityKey) -> Self {
        Self {
            parent,
            explicit: true,
        }
    }

    pub fn implicit(parent: EntityKey) -> Self {
        Self {
            parent,
            explicit: false,
        }
    }
}

/// One entity declaration as handed over by the front end. Specialization
/// operations travel inside the entity itself.
#[derive(Debug, Clone)]
pub struct Declaration {
    pub entity: Entity,
    pub inherits: Vec<InheritanceDecl>,
}

impl Declaration {
    pub fn new(entity: Entity) -> Self {
        Self {
            entity,
            inherits: Vec::new(),
        }
    }

    pub fn inheriting(mut self, decl: InheritanceDecl) -> Self {
        self.inherits.push(decl);
        self
    }
}

/// Everything known about one entity's resolution, bundled for reporting
#[derive(Debug, Clone, Serialize)]
pub struct Resolution {
    pub key: EntityKey,
    pub chain: Vec<EntityKey>,
    pub history: Vec<ResolvedProperty>,
    pub conflicts: Vec<Conflict>,
    pub state: FinalState,
}

impl Resolution {
    /// `true` when the entity's graph neighbourhood has no conflicts at
    /// all, overrides included
    pub fn is_clean(&self) -> bool {
        self.conflicts.is_empty()
    }
}

/// Owns the registered entities and their inheritance graph
#[derive(Debug, Default)]
pub struct Resolver {
    entities: EntityStore,
    relations: RelationStore,
}

impl Resolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one entity. Duplicate keys are rejected, never replaced.
    pub fn register(&mut self, entity: Entity) -> Result<(), RegistryError> {
        self.entities.register(entity)
    }

    /// Record `child inherits parent`. Rejected relations leave the graph
    /// exactly as it was.
    pub fn add_relation(
        &mut self,
        child: EntityKey,
        parent: EntityKey,
        explicit: bool,
    ) -> Result<(), Conflict> {
        let relation = if explicit {
            Relation::explicit(child, parent)
        } else {
            Relation::implicit(child, parent)
        };
        self.relations.add(&self.entities, relation)
    }

    pub fn remove_relation(&mut self, child: &EntityKey, parent: &EntityKey) -> bool {
        self.relations.remove(child, parent)
    }

    /// Load a batch of declarations: all entities first, then every
    /// inherit edge, so declaration order within the batch never matters.
    pub fn load(&mut self, declarations: Vec<Declaration>) -> Result<(), SemanticError> {
        let mut edges = Vec::new();
        for decl in declarations {
            let child = decl.entity.key();
            self.entities.register(decl.entity)?;
            for inherit in decl.inherits {
                edges.push((child.clone(), inherit.parent, inherit.explicit));
            }
        }
        for (child, parent, explicit) in edges {
            self.add_relation(child, parent, explicit)?;
        }
        Ok(())
    }

    /// The root-first inheritance chain ending at `key`
    pub fn chain(&self, key: &EntityKey) -> Vec<EntityKey> {
        build_chain(&self.relations, key)
    }

    pub fn has_cycle(&self, key: &EntityKey) -> bool {
        has_cycle(&self.relations, key)
    }

    pub fn cycle_path(&self, key: &EntityKey) -> Option<Vec<EntityKey>> {
        find_cycle(&self.relations, key)
    }

    /// Merged property map without specializations applied
    pub fn properties(
        &self,
        key: &EntityKey,
    ) -> Result<IndexMap<String, String>, ResolveError> {
        Merger::new(&self.entities, &self.relations).properties(key)
    }

    /// Per-property audit trail across the whole chain
    pub fn history(&self, key: &EntityKey) -> Result<Vec<ResolvedProperty>, ResolveError> {
        Merger::new(&self.entities, &self.relations).history(key)
    }

    /// Fully resolve one entity: merge its chain, then replay its
    /// specialization operations
    pub fn resolve(&self, key: &EntityKey) -> Result<FinalState, ResolveError> {
        Specializer::new(&self.entities, &self.relations).apply(key)
    }

    /// Conflicts involving one entity
    pub fn detect_conflicts(&self, key: &EntityKey) -> Vec<Conflict> {
        ConflictDetector::new(&self.entities, &self.relations).detect(key)
    }

    /// Conflicts across every registered entity
    pub fn validate(&self) -> ValidationReport {
        ConflictDetector::new(&self.entities, &self.relations).validate()
    }

    /// Resolve one entity and bundle the audit data alongside the final
    /// state, for diagnostics output
    pub fn resolution(&self, key: &EntityKey) -> Result<Resolution, ResolveError> {
        let state = self.resolve(key)?;
        Ok(Resolution {
            key: key.clone(),
            chain: self.chain(key),
            history: self.history(key).unwrap_or_default(),
            conflicts: self.detect_conflicts(key),
            state,
        })
    }

    /// Render the ancestor graph of `key` as an indented list, one entity
    /// per line, parents nested under their children
    pub fn inheritance_tree(&self, key: &EntityKey) -> String {
        let mut out = String::new();
        let mut visited = HashSet::new();
        self.render_tree(key, 0, &mut visited, &mut out);
        out
    }

    fn render_tree(
        &self,
        key: &EntityKey,
        depth: usize,
        visited: &mut HashSet<EntityKey>,
        out: &mut String,
    ) {
        for _ in 0..depth {
            out.push_str("  ");
        }
        out.push_str("- ");
        out.push_str(&key.to_string());
        out.push('\n');
        if !visited.insert(key.clone()) {
            return;
        }
        for parent in self.relations.parents_of(key) {
            self.render_tree(parent, depth + 1, visited, out);
        }
    }

    pub fn entities(&self) -> &EntityStore {
        &self.entities
    }

    pub fn relations(&self) -> &RelationStore {
        &self.relations
    }
}

impl fmt::Display for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} entities, {} inheritance relations",
            self.entities.len(),
            self.relations.len()
        )?;
        for relation in self.relations.iter() {
            writeln!(f, "  {} <- {}", relation.child, relation.parent)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{EntityBody, StyleBody};
    use pretty_assertions::assert_eq;

    fn style_decl(name: &str, props: &[(&str, &str)]) -> Declaration {
        let mut body = StyleBody::new();
        for (k, v) in props {
            body = body.with_property(*k, *v);
        }
        Declaration::new(Entity::template(name, EntityBody::Style(body)))
    }

    #[test]
    fn test_load_registers_entities_before_edges() {
        let mut resolver = Resolver::new();
        // The child is declared before its parent; load must still accept
        // the edge because registration happens in a first pass
        resolver
            .load(vec![
                style_decl("Leaf", &[("color", "blue")])
                    .inheriting(InheritanceDecl::explicit(EntityKey::style("Root"))),
                style_decl("Root", &[("color", "red"), ("margin", "0")]),
            ])
            .unwrap();

        let props = resolver.properties(&EntityKey::style("Leaf")).unwrap();
        assert_eq!(props["color"], "blue");
        assert_eq!(props["margin"], "0");
    }

    #[test]
    fn test_rejected_relation_leaves_graph_unchanged() {
        let mut resolver = Resolver::new();
        resolver
            .load(vec![
                style_decl("A", &[]),
                style_decl("B", &[])
                    .inheriting(InheritanceDecl::explicit(EntityKey::style("A"))),
            ])
            .unwrap();

        let before = resolver.relations().len();
        let err = resolver
            .add_relation(EntityKey::style("A"), EntityKey::style("B"), true)
            .unwrap_err();
        assert!(matches!(err, Conflict::CircularDependency { .. }));
        assert_eq!(resolver.relations().len(), before);
    }

    #[test]
    fn test_inheritance_tree_rendering() {
        let mut resolver = Resolver::new();
        resolver
            .load(vec![
                style_decl("Root", &[]),
                style_decl("Mid", &[])
                    .inheriting(InheritanceDecl::explicit(EntityKey::style("Root"))),
                style_decl("Leaf", &[])
                    .inheriting(InheritanceDecl::explicit(EntityKey::style("Mid"))),
            ])
            .unwrap();

        let tree = resolver.inheritance_tree(&EntityKey::style("Leaf"));
        assert_eq!(
            tree,
            "- Leaf (Style)\n  - Mid (Style)\n    - Root (Style)\n"
        );
    }

    #[test]
    fn test_resolution_bundle_is_clean_without_conflicts() {
        let mut resolver = Resolver::new();
        resolver.load(vec![style_decl("Lone", &[("color", "red")])]).unwrap();

        let resolution = resolver.resolution(&EntityKey::style("Lone")).unwrap();
        assert!(resolution.is_clean());
        assert_eq!(resolution.chain, vec![EntityKey::style("Lone")]);
    }
}
