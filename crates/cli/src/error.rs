//! CLI error type.

use atelier_storefront::catalog::{CatalogError, SizeError};
use atelier_storefront::state::StateError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Layout(#[from] StateError),

    #[error("no published product with slug {0:?}")]
    UnknownProduct(String),

    #[error("{slug}: {source}")]
    Size {
        slug: String,
        #[source]
        source: SizeError,
    },

    #[error("failed to render JSON: {0}")]
    Json(#[from] serde_json::Error),
}
