//! Entity store: registered Template/Custom definitions keyed by (kind, name)

use std::collections::HashMap;

use thiserror::Error;

use super::{Entity, EntityKey, EntityKind};

/// Errors raised while registering definitions
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Re-registration of an already registered (kind, name). Two files
    /// declaring the same qualified name is the symbol resolver's problem
    /// to disambiguate; this store never merges silently.
    #[error("duplicate definition: {key}")]
    Duplicate { key: EntityKey },
}

/// Flat, hash-keyed store of all registered entities.
///
/// Append-only within one compilation run: entities are registered once by
/// the front end and only read afterwards. Relations reference entities by
/// key, never by pointer, so the inheritance graph can contain structural
/// cycles (pending detection) without ownership concerns.
#[derive(Debug, Default)]
pub struct EntityStore {
    entities: HashMap<EntityKey, Entity>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition. Duplicate keys are an error, not an overwrite.
    pub fn register(&mut self, entity: Entity) -> Result<(), RegistryError> {
        let key = entity.key();
        if self.entities.contains_key(&key) {
            return Err(RegistryError::Duplicate { key });
        }
        self.entities.insert(key, entity);
        Ok(())
    }

    pub fn lookup(&self, key: &EntityKey) -> Option<&Entity> {
        self.entities.get(key)
    }

    /// Convenience lookup by kind and name
    pub fn get(&self, kind: EntityKind, name: &str) -> Option<&Entity> {
        self.entities.get(&EntityKey::new(kind, name))
    }

    pub fn exists(&self, key: &EntityKey) -> bool {
        self.entities.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &EntityKey> {
        self.entities.keys()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
