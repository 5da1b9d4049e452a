//! Library facade bundling an asset store with a registry.

use crate::assets::{normalize_country_code, AssetStore};
use crate::registry::{CountryInfo, Registry, RegistryError};

/// Asset store and country registry, shared by flag views and selectors.
///
/// Usually wrapped in an `Arc` and handed to every component instance.
#[derive(Debug, Clone, Default)]
pub struct FlagLibrary {
    store: AssetStore,
    registry: Registry,
}

impl FlagLibrary {
    pub fn new(store: AssetStore, registry: Registry) -> Self {
        Self { store, registry }
    }

    /// Embedded flags plus the bundled registry
    pub fn builtin() -> Result<Self, RegistryError> {
        let library = Self::new(AssetStore::embedded(), Registry::builtin()?);
        tracing::debug!(
            "Loaded {} flags and {} registry entries",
            library.store.len(),
            library.registry.len()
        );
        Ok(library)
    }

    pub fn store(&self) -> &AssetStore {
        &self.store
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Raw SVG for a code
    pub fn flag(&self, code: &str) -> Option<&str> {
        self.store.get(code).ok()
    }

    /// Codes with a flag, alphabetical
    pub fn country_codes(&self) -> Vec<&str> {
        self.store.codes().collect()
    }

    pub fn country_info(&self, code: &str) -> Option<&CountryInfo> {
        self.registry.info_of(code)
    }

    /// Two lowercase letters (after normalization) and a flag in the store
    pub fn is_valid_country(&self, code: &str) -> bool {
        self.store.is_valid_country_code(code)
    }

    /// Registry entries that also have a flag, in registry order.
    ///
    /// Flags without metadata and metadata without flags are both left out.
    pub fn available_for_selection(&self) -> Vec<&CountryInfo> {
        self.registry
            .iter()
            .filter(|info| self.store.contains(&info.code))
            .collect()
    }

    /// Display name for labels: registry name, else the code as given
    pub fn display_name<'a>(&'a self, code: &'a str) -> &'a str {
        self.registry
            .info_of(&normalize_country_code(code))
            .map(|info| info.name.as_str())
            .unwrap_or(code)
    }
}
