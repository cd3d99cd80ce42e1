//! Token catalogs
//!
//! A catalog supplies the raw design values for both color schemes together
//! with a version key. The engine never inspects the version; it only compares
//! it, so a development hot-reload just needs to hand over a catalog with a new
//! version to invalidate every cached configuration.

use crate::theme::ThemeBundle;
use crate::themes::DefaultTheme;
use std::fmt;

/// Opaque comparison key identifying one revision of a token catalog
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CatalogVersion(String);

impl CatalogVersion {
    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CatalogVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CatalogVersion {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for CatalogVersion {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// External table of design values consumed by the engine
pub trait TokenCatalog: Send + Sync {
    fn version(&self) -> CatalogVersion;
    fn bundle(&self) -> &ThemeBundle;
}

/// Catalog over a fixed [`ThemeBundle`]
#[derive(Clone, Debug)]
pub struct BundleCatalog {
    version: CatalogVersion,
    bundle: ThemeBundle,
}

impl BundleCatalog {
    pub fn new(version: impl Into<CatalogVersion>, bundle: ThemeBundle) -> Self {
        Self {
            version: version.into(),
            bundle,
        }
    }
}

impl Default for BundleCatalog {
    fn default() -> Self {
        Self::new(
            CatalogVersion::new(concat!("veneer@", env!("CARGO_PKG_VERSION"))),
            DefaultTheme::bundle(),
        )
    }
}

impl TokenCatalog for BundleCatalog {
    fn version(&self) -> CatalogVersion {
        self.version.clone()
    }

    fn bundle(&self) -> &ThemeBundle {
        &self.bundle
    }
}
