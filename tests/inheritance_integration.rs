//! Integration tests for chain building, merging, and conflict detection
//! through the public `Resolver` API

use pretty_assertions::assert_eq;
use weft_semantics::{
    Conflict, Declaration, Entity, EntityBody, EntityKey, InheritanceDecl, Resolver, StyleBody,
};

fn style(name: &str, props: &[(&str, &str)]) -> Declaration {
    let mut body = StyleBody::new();
    for (k, v) in props {
        body = body.with_property(*k, *v);
    }
    Declaration::new(Entity::template(name, EntityBody::Style(body)))
}

fn inherits(decl: Declaration, parents: &[&str]) -> Declaration {
    parents.iter().fold(decl, |d, p| {
        d.inheriting(InheritanceDecl::explicit(EntityKey::style(*p)))
    })
}

#[test]
fn entity_without_relations_resolves_to_its_own_properties() {
    let mut resolver = Resolver::new();
    resolver
        .load(vec![style("Lone", &[("color", "red"), ("margin", "0")])])
        .unwrap();

    let key = EntityKey::style("Lone");
    assert_eq!(resolver.chain(&key), vec![key.clone()]);

    let props = resolver.properties(&key).unwrap();
    assert_eq!(props.len(), 2);
    assert_eq!(props["color"], "red");
    assert_eq!(props["margin"], "0");
}

#[test]
fn chain_length_counts_each_reachable_ancestor_once() {
    let mut resolver = Resolver::new();
    resolver
        .load(vec![
            style("Root", &[]),
            inherits(style("A", &[]), &["Root"]),
            inherits(style("B", &[]), &["Root"]),
            inherits(style("Leaf", &[]), &["A", "B"]),
        ])
        .unwrap();

    let chain = resolver.chain(&EntityKey::style("Leaf"));
    // Root is reachable through both A and B but appears exactly once
    assert_eq!(chain.len(), 4);
    assert_eq!(chain.last(), Some(&EntityKey::style("Leaf")));
    assert_eq!(
        chain.iter().filter(|k| k.name == "Root").count(),
        1
    );
}

#[test]
fn closer_ancestors_override_more_distant_ones() {
    let mut resolver = Resolver::new();
    resolver
        .load(vec![
            style("Root", &[("color", "red"), ("margin", "0")]),
            inherits(style("Mid", &[("color", "green")]), &["Root"]),
            inherits(style("Leaf", &[("color", "blue")]), &["Mid"]),
        ])
        .unwrap();

    let props = resolver.properties(&EntityKey::style("Leaf")).unwrap();
    assert_eq!(props["color"], "blue");
    assert_eq!(props["margin"], "0");

    // Mid without an own override takes Mid's value, not Root's
    let mid = resolver.properties(&EntityKey::style("Mid")).unwrap();
    assert_eq!(mid["color"], "green");
}

#[test]
fn history_ranks_the_entity_itself_highest() {
    let mut resolver = Resolver::new();
    resolver
        .load(vec![
            style("Root", &[("color", "red")]),
            inherits(style("Leaf", &[("color", "blue")]), &["Root"]),
        ])
        .unwrap();

    let history = resolver.history(&EntityKey::style("Leaf")).unwrap();
    let colors: Vec<_> = history.iter().filter(|r| r.name == "color").collect();
    assert_eq!(colors.len(), 2);

    let root_entry = colors.iter().find(|r| r.source.name == "Root").unwrap();
    let leaf_entry = colors.iter().find(|r| r.source.name == "Leaf").unwrap();
    assert!(leaf_entry.priority > root_entry.priority);
    assert_eq!(leaf_entry.value, "blue");
}

#[test]
fn implicit_and_explicit_relations_merge_identically() {
    let mut base = Resolver::new();
    base.load(vec![
        style("Root", &[("color", "red")]),
        inherits(style("Leaf", &[]), &["Root"]),
    ])
    .unwrap();

    let mut other = Resolver::new();
    other
        .load(vec![
            style("Root", &[("color", "red")]),
            style("Leaf", &[])
                .inheriting(InheritanceDecl::implicit(EntityKey::style("Root"))),
        ])
        .unwrap();

    assert_eq!(
        base.properties(&EntityKey::style("Leaf")).unwrap(),
        other.properties(&EntityKey::style("Leaf")).unwrap()
    );
}

#[test]
fn composition_scenario_combines_both_parents() {
    // `@Style Base` inside Primary composes exactly like explicit
    // inheritance: Primary picks up Base's padding and keeps its own
    // background untouched
    let mut resolver = Resolver::new();
    resolver
        .load(vec![
            style("Base", &[("padding", "8px")]),
            style("Primary", &[("background", "#007bff")])
                .inheriting(InheritanceDecl::implicit(EntityKey::style("Base"))),
        ])
        .unwrap();

    let props = resolver.properties(&EntityKey::style("Primary")).unwrap();
    assert_eq!(props["padding"], "8px");
    assert_eq!(props["background"], "#007bff");
}

#[test]
fn cycle_is_rejected_and_graph_is_unchanged() {
    let mut resolver = Resolver::new();
    resolver
        .load(vec![
            style("A", &[]),
            inherits(style("B", &[]), &["A"]),
            inherits(style("C", &[]), &["B"]),
        ])
        .unwrap();

    let before: Vec<_> = resolver
        .relations()
        .iter()
        .map(|r| (r.child.clone(), r.parent.clone()))
        .collect();

    let err = resolver
        .add_relation(EntityKey::style("A"), EntityKey::style("C"), true)
        .unwrap_err();
    match err {
        Conflict::CircularDependency { path } => {
            // The reported walk is closed: it starts and ends at the
            // same entity
            assert_eq!(path.first(), path.last());
            assert!(path.len() >= 2);
        }
        other => panic!("expected a circular dependency, got {other}"),
    }

    let after: Vec<_> = resolver
        .relations()
        .iter()
        .map(|r| (r.child.clone(), r.parent.clone()))
        .collect();
    assert_eq!(before, after);
}

#[test]
fn self_inheritance_is_a_cycle() {
    let mut resolver = Resolver::new();
    resolver.load(vec![style("Narcissus", &[])]).unwrap();

    let err = resolver
        .add_relation(
            EntityKey::style("Narcissus"),
            EntityKey::style("Narcissus"),
            true,
        )
        .unwrap_err();
    assert!(matches!(err, Conflict::CircularDependency { .. }));
}

#[test]
fn cross_kind_inheritance_is_rejected() {
    let mut resolver = Resolver::new();
    resolver.load(vec![style("X", &[])]).unwrap();
    resolver
        .register(Entity::template(
            "Y",
            EntityBody::Element(weft_semantics::ElementBody::default()),
        ))
        .unwrap();

    let before = resolver.relations().len();
    let err = resolver
        .add_relation(EntityKey::style("X"), EntityKey::element("Y"), true)
        .unwrap_err();
    assert!(matches!(err, Conflict::TypeMismatch { .. }));
    assert_eq!(resolver.relations().len(), before);
}

#[test]
fn undefined_parent_is_rejected() {
    let mut resolver = Resolver::new();
    resolver.load(vec![style("X", &[])]).unwrap();

    let err = resolver
        .add_relation(EntityKey::style("X"), EntityKey::style("Ghost"), true)
        .unwrap_err();
    assert!(matches!(err, Conflict::UndefinedParent { .. }));
}

#[test]
fn resolution_is_deterministic() {
    let mut resolver = Resolver::new();
    resolver
        .load(vec![
            style("Root", &[("a", "1"), ("b", "2")]),
            inherits(style("Left", &[("b", "3")]), &["Root"]),
            inherits(style("Right", &[("c", "4")]), &["Root"]),
            inherits(style("Leaf", &[("d", "5")]), &["Left", "Right"]),
        ])
        .unwrap();

    let key = EntityKey::style("Leaf");
    let first = resolver.properties(&key).unwrap();
    let second = resolver.properties(&key).unwrap();
    assert_eq!(first, second);
    assert_eq!(resolver.chain(&key), resolver.chain(&key));
}

#[test]
fn overrides_surface_as_conflicts_but_do_not_invalidate() {
    let mut resolver = Resolver::new();
    resolver
        .load(vec![
            style("Root", &[("color", "red")]),
            inherits(style("Leaf", &[("color", "blue")]), &["Root"]),
        ])
        .unwrap();

    let conflicts = resolver.detect_conflicts(&EntityKey::style("Leaf"));
    assert!(conflicts
        .iter()
        .any(|c| matches!(c, Conflict::PropertyOverride { name, .. } if name == "color")));

    let report = resolver.validate();
    assert!(report.is_valid());
}

#[test]
fn resolution_report_serializes_with_chain_and_state() {
    let mut resolver = Resolver::new();
    resolver
        .load(vec![
            style("Root", &[("color", "red")]),
            inherits(style("Leaf", &[]), &["Root"]),
        ])
        .unwrap();

    let resolution = resolver.resolution(&EntityKey::style("Leaf")).unwrap();
    let json = serde_json::to_value(&resolution).unwrap();
    assert_eq!(json["key"]["name"], "Leaf");
    assert_eq!(json["chain"][0]["name"], "Root");
    assert_eq!(json["state"]["Properties"]["properties"]["color"], "red");
}
