// Typed failures for catalog operations

use thiserror::Error;

/// Errors surfaced by the catalog and its store.
///
/// `NotFound` and `AlreadyExists` are the two domain kinds; everything else is
/// infrastructure and propagates unchanged. All variants carry enough to render
/// a message naming the entity, the offending field and the value.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// No record matched the given field value.
    #[error("{entity} not found with {field}: '{value}'")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    /// A record with the given field value already exists.
    #[error("{entity} already exists with {field}: '{value}'")]
    AlreadyExists {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    /// Underlying SQLite failure.
    #[error(transparent)]
    Storage(#[from] rusqlite::Error),

    /// Record could not be serialized or deserialized.
    #[error("failed to encode record: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Filesystem failure while managing the store directory or export files.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CatalogError {
    pub fn not_found(field: &'static str, value: impl ToString) -> Self {
        CatalogError::NotFound {
            entity: "Product",
            field,
            value: value.to_string(),
        }
    }

    pub fn already_exists(field: &'static str, value: impl ToString) -> Self {
        CatalogError::AlreadyExists {
            entity: "Product",
            field,
            value: value.to_string(),
        }
    }

    /// True for the two domain kinds, false for infrastructure failures.
    pub fn is_domain(&self) -> bool {
        matches!(
            self,
            CatalogError::NotFound { .. } | CatalogError::AlreadyExists { .. }
        )
    }
}

pub type Result<T, E = CatalogError> = std::result::Result<T, E>;
