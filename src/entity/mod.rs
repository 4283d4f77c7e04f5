//! Entity definitions for the Weft semantic core
//!
//! Templates and Customs come in three kinds: Style (property bags),
//! Element (ordered tag sequences), and Var (named value sets). An entity
//! is identified by `(category, kind, name)`; the inheritance graph keys
//! entities by `(kind, name)` only, since a Custom may inherit from a
//! Template of the same kind and vice versa.

pub mod store;

pub use store::{EntityStore, RegistryError};

use std::collections::HashMap;
use std::fmt;

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

use crate::specialize::SpecializeOp;

/// The three independent sub-kinds of reusable definitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EntityKind {
    Style,
    Element,
    Var,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Style => "Style",
            EntityKind::Element => "Element",
            EntityKind::Var => "Var",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a definition is a non-editable Template or an editable Custom
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EntityCategory {
    Template,
    Custom,
}

impl EntityCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityCategory::Template => "Template",
            EntityCategory::Custom => "Custom",
        }
    }
}

impl fmt::Display for EntityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Graph key for a registered entity: kind plus fully-qualified name.
///
/// Names arriving here have already been disambiguated by the symbol
/// resolver, so `(kind, name)` is globally unique within one compilation
/// run. The category is deliberately not part of the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct EntityKey {
    pub kind: EntityKind,
    pub name: String,
}

impl EntityKey {
    pub fn new(kind: EntityKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }

    pub fn style(name: impl Into<String>) -> Self {
        Self::new(EntityKind::Style, name)
    }

    pub fn element(name: impl Into<String>) -> Self {
        Self::new(EntityKind::Element, name)
    }

    pub fn var(name: impl Into<String>) -> Self {
        Self::new(EntityKind::Var, name)
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.kind)
    }
}

/// One child tag in an Element sequence.
///
/// A tag may carry a nested property map, e.g. an inline style or script
/// payload attached by name during parsing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tag {
    pub name: String,
    pub attrs: IndexMap<String, String>,
}

impl Tag {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: IndexMap::new(),
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }
}

/// Declared type tag for a Var entry, used only as a generation hint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum VarType {
    String,
    Number,
    Boolean,
    Color,
    Size,
    Url,
}

const SIZE_SUFFIXES: &[&str] = &["px", "em", "rem", "vh", "vw", "pt", "%"];

impl VarType {
    /// Classify a raw value string when the source carries no annotation
    pub fn infer(value: &str) -> Self {
        let v = value.trim();
        if v == "true" || v == "false" {
            return VarType::Boolean;
        }
        if v.starts_with('#')
            && (v.len() == 4 || v.len() == 7)
            && v[1..].chars().all(|c| c.is_ascii_hexdigit())
        {
            return VarType::Color;
        }
        if v.parse::<f64>().is_ok() {
            return VarType::Number;
        }
        for suffix in SIZE_SUFFIXES {
            if let Some(magnitude) = v.strip_suffix(suffix) {
                if magnitude.parse::<f64>().is_ok() {
                    return VarType::Size;
                }
            }
        }
        if v.starts_with("http://") || v.starts_with("https://") || v.starts_with("url(") {
            return VarType::Url;
        }
        VarType::String
    }
}

/// A named value in a Var entity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VarValue {
    pub value: String,
    pub ty: VarType,
}

impl VarValue {
    /// Create a value with its type inferred from the raw string
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        let ty = VarType::infer(&value);
        Self { value, ty }
    }

    pub fn typed(value: impl Into<String>, ty: VarType) -> Self {
        Self {
            value: value.into(),
            ty,
        }
    }
}

/// Property bag of a Style entity.
///
/// The optional / required / default bookkeeping is only populated for
/// Custom styles; Template styles carry base properties alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StyleBody {
    pub properties: IndexMap<String, String>,
    /// Value-less property names a user of the Custom may fill in
    pub optional: IndexSet<String>,
    /// Property names that must have a value once resolved
    pub required: IndexSet<String>,
    /// Fallback values applied after specialization
    pub defaults: IndexMap<String, String>,
}

impl StyleBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    pub fn with_optional(mut self, name: impl Into<String>) -> Self {
        self.optional.insert(name.into());
        self
    }

    pub fn with_required(mut self, name: impl Into<String>) -> Self {
        self.required.insert(name.into());
        self
    }

    pub fn with_default(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.defaults.insert(name.into(), value.into());
        self
    }
}

/// Ordered tag sequence of an Element entity
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ElementBody {
    pub tags: Vec<Tag>,
}

impl ElementBody {
    pub fn new(tags: Vec<Tag>) -> Self {
        Self { tags }
    }

    /// Position of the first tag with the given name
    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.tags.iter().position(|t| t.name == name)
    }

    /// Name-to-first-position index, rebuilt from the current sequence
    pub fn index(&self) -> HashMap<&str, usize> {
        let mut index = HashMap::new();
        for (pos, tag) in self.tags.iter().enumerate() {
            index.entry(tag.name.as_str()).or_insert(pos);
        }
        index
    }
}

/// Named value set of a Var entity
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VarBody {
    pub vars: IndexMap<String, VarValue>,
}

impl VarBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_var(mut self, name: impl Into<String>, value: VarValue) -> Self {
        self.vars.insert(name.into(), value);
        self
    }
}

/// Kind-specific payload, matched exhaustively instead of downcast
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum EntityBody {
    Style(StyleBody),
    Element(ElementBody),
    Var(VarBody),
}

impl EntityBody {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityBody::Style(_) => EntityKind::Style,
            EntityBody::Element(_) => EntityKind::Element,
            EntityBody::Var(_) => EntityKind::Var,
        }
    }
}

/// A registered Template or Custom definition
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub name: String,
    pub category: EntityCategory,
    pub body: EntityBody,
    /// Visible to other compilation units; orthogonal to resolution
    pub exported: bool,
    /// Specialization operations in declaration order. Only Customs carry
    /// these; they are replayed strictly after the ancestor chain merge.
    pub ops: Vec<SpecializeOp>,
}

impl Entity {
    pub fn template(name: impl Into<String>, body: EntityBody) -> Self {
        Self {
            name: name.into(),
            category: EntityCategory::Template,
            body,
            exported: false,
            ops: Vec::new(),
        }
    }

    pub fn custom(name: impl Into<String>, body: EntityBody) -> Self {
        Self {
            name: name.into(),
            category: EntityCategory::Custom,
            body,
            exported: false,
            ops: Vec::new(),
        }
    }

    pub fn exported(mut self) -> Self {
        self.exported = true;
        self
    }

    pub fn with_ops(mut self, ops: Vec<SpecializeOp>) -> Self {
        self.ops = ops;
        self
    }

    pub fn kind(&self) -> EntityKind {
        self.body.kind()
    }

    pub fn key(&self) -> EntityKey {
        EntityKey::new(self.kind(), self.name.clone())
    }

    pub fn is_custom(&self) -> bool {
        self.category == EntityCategory::Custom
    }
}
