//! Application state shared across handlers.

use std::path::Path;
use std::sync::Arc;

use atelier_core::layout::{LayoutConfigError, LayoutFile, ResponsiveLayout};

use crate::catalog::{CatalogError, CatalogStore};
use crate::config::StorefrontConfig;

/// Error building application state at startup.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
    #[error("failed to read layout file: {0}")]
    LayoutIo(#[from] std::io::Error),
    #[error("malformed layout file: {0}")]
    LayoutParse(#[from] serde_yaml::Error),
    #[error("invalid layout: {0}")]
    LayoutInvalid(#[from] LayoutConfigError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. Everything in it is read-only
/// after startup.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    catalog: CatalogStore,
    layout: ResponsiveLayout,
}

impl AppState {
    /// Load the catalog and layout named by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog or layout file cannot be loaded.
    pub fn new(config: StorefrontConfig) -> Result<Self, StateError> {
        let catalog = CatalogStore::load(&config.catalog_path, config.media_base_url.as_ref())?;
        let layout = match &config.layout_path {
            Some(path) => load_layout(path)?,
            None => ResponsiveLayout::default(),
        };
        Ok(Self::from_parts(config, catalog, layout))
    }

    /// Assemble state from already-loaded parts.
    #[must_use]
    pub fn from_parts(config: StorefrontConfig, catalog: CatalogStore, layout: ResponsiveLayout) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog,
                layout,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the catalog.
    #[must_use]
    pub fn catalog(&self) -> &CatalogStore {
        &self.inner.catalog
    }

    /// Get a reference to the responsive layout configuration.
    #[must_use]
    pub fn layout(&self) -> &ResponsiveLayout {
        &self.inner.layout
    }
}

/// Parse and validate a YAML layout file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not valid YAML for a
/// [`LayoutFile`], or contains invalid row patterns.
pub fn load_layout(path: &Path) -> Result<ResponsiveLayout, StateError> {
    let yaml = std::fs::read_to_string(path)?;
    let file: LayoutFile = serde_yaml::from_str(&yaml)?;
    let layout = ResponsiveLayout::try_from(file)?;
    tracing::info!(
        path = %path.display(),
        desktop_columns = layout.desktop.columns(),
        tablet_columns = layout.tablet.columns(),
        "Layout loaded"
    );
    Ok(layout)
}
