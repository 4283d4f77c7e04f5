//! Error types for resolution and specialization

use thiserror::Error;

use crate::entity::EntityKey;

/// Errors raised while resolving an entity's inherited state.
///
/// These are distinct from [`Conflict`](crate::inherit::Conflict) values:
/// conflicts describe problems in the user's inheritance graph, while
/// these describe a resolution request that cannot be answered.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The requested entity is not registered
    #[error("unknown entity: {key}")]
    UnknownEntity { key: EntityKey },

    /// A property-map view was requested of an Element entity
    #[error("{key} resolves to a tag sequence, not a property map")]
    NotProperties { key: EntityKey },

    /// A sequence operation was replayed against a property map
    #[error("{key} resolves to a property map, not a tag sequence")]
    NotSequence { key: EntityKey },

    /// A positional specialization could not resolve its anchor
    #[error("specialization target not found: {target}")]
    TargetNotFound { target: String },

    /// Specialization operations recorded on a Template. Templates are
    /// immutable once merged; the front end must never emit this.
    #[error("{key} is a template and cannot carry specializations")]
    NotCustom { key: EntityKey },

    /// A programming-error class distinct from user-facing conflicts;
    /// callers should abort the compilation run rather than swallow it.
    #[error("internal resolver invariant violated: {message}")]
    Internal { message: String },
}

impl ResolveError {
    pub fn unknown(key: &EntityKey) -> Self {
        Self::UnknownEntity { key: key.clone() }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

/// Union of every error the resolution pipeline can produce, for callers
/// that drive the whole pipeline through [`Resolver`](crate::Resolver)
#[derive(Debug, Error)]
pub enum SemanticError {
    #[error(transparent)]
    Registry(#[from] crate::entity::RegistryError),

    #[error(transparent)]
    Relation(#[from] crate::inherit::Conflict),

    #[error(transparent)]
    Resolve(#[from] ResolveError),
}
