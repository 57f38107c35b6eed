//! Store type catalog loaded from the embedded provider manifest.

use crate::core::{ProviderError, Result};
use crate::types::{Facet, FacetSet, PrimitiveKind, StoreTypeUsage};
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

pub(crate) const PROVIDER_MANIFEST: &str = include_str!("resources/provider_manifest.toml");
pub(crate) const STORE_SCHEMA_DEFINITION: &str =
    include_str!("resources/store_schema_definition.toml");
pub(crate) const STORE_SCHEMA_MAPPING: &str = include_str!("resources/store_schema_mapping.toml");

/// Process-wide catalog. Built on first use; a load failure is cached and
/// reported on every later access.
static CATALOG: Lazy<std::result::Result<StoreTypeCatalog, String>> = Lazy::new(|| {
    StoreTypeCatalog::load(PROVIDER_MANIFEST, &[STORE_SCHEMA_DEFINITION, STORE_SCHEMA_MAPPING])
        .map_err(|e| e.to_string())
});

/// Returns the shared catalog, loading it on first use.
pub fn catalog() -> Result<&'static StoreTypeCatalog> {
    CATALOG
        .as_ref()
        .map_err(|e| ProviderError::ProviderIncompatible(format!("Invalid provider manifest: {}", e)))
}

/// Schema of a numeric facet: allowed range and default.
#[derive(Debug, Clone, Deserialize)]
pub struct RangeFacet<T> {
    pub min: T,
    pub max: T,
    pub default: Option<Facet<T>>,
    #[serde(default)]
    pub constant: bool,
}

/// Schema of a boolean facet.
#[derive(Debug, Clone, Deserialize)]
pub struct FlagFacet {
    pub default: bool,
    #[serde(default)]
    pub constant: bool,
}

/// One store type declared by the manifest.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreType {
    pub name: String,
    pub primitive: PrimitiveKind,
    pub max_length: Option<RangeFacet<u32>>,
    pub precision: Option<RangeFacet<u8>>,
    pub scale: Option<RangeFacet<u8>>,
    pub unicode: Option<FlagFacet>,
    pub fixed_length: Option<FlagFacet>,
    pub preserve_seconds: Option<FlagFacet>,
}

impl StoreType {
    /// Largest MaxLength this type can represent, if it is length-bearing.
    pub fn max_length_limit(&self) -> Option<u32> {
        self.max_length.as_ref().map(|f| f.max)
    }

    /// Checks that every facet on `facets` is declared, variable and in range.
    fn validate(&self, facets: &FacetSet) -> Result<()> {
        let reject = |facet: &str, why: &str| -> Result<()> {
            Err(ProviderError::InvalidArgument(format!(
                "Facet '{}' is {} for store type '{}'",
                facet, why, self.name
            )))
        };

        check_range("MaxLength", facets.max_length, self.max_length.as_ref(), &reject)?;
        check_range("Precision", facets.precision, self.precision.as_ref(), &reject)?;
        check_range("Scale", facets.scale, self.scale.as_ref(), &reject)?;
        check_flag("Unicode", facets.unicode, self.unicode.as_ref(), &reject)?;
        check_flag("FixedLength", facets.fixed_length, self.fixed_length.as_ref(), &reject)?;
        check_flag("PreserveSeconds", facets.preserve_seconds, self.preserve_seconds.as_ref(), &reject)?;
        Ok(())
    }
}

fn check_range<T: PartialOrd + Copy>(
    facet: &str,
    value: Option<Facet<T>>,
    schema: Option<&RangeFacet<T>>,
    reject: &dyn Fn(&str, &str) -> Result<()>,
) -> Result<()> {
    match (value, schema) {
        (None, _) => Ok(()),
        (Some(_), None) => reject(facet, "not declared"),
        (Some(_), Some(schema)) if schema.constant => reject(facet, "constant"),
        (Some(Facet::Value(v)), Some(schema)) if v < schema.min || v > schema.max => {
            reject(facet, "out of range")
        }
        (Some(_), Some(_)) => Ok(()),
    }
}

fn check_flag(
    facet: &str,
    value: Option<bool>,
    schema: Option<&FlagFacet>,
    reject: &dyn Fn(&str, &str) -> Result<()>,
) -> Result<()> {
    match (value, schema) {
        (None, _) => Ok(()),
        (Some(_), None) => reject(facet, "not declared"),
        (Some(_), Some(schema)) if schema.constant => reject(facet, "constant"),
        (Some(_), Some(_)) => Ok(()),
    }
}

#[derive(Debug, Deserialize)]
struct ManifestDocument {
    version: u32,
    namespace: String,
    types: Vec<StoreType>,
}

/// Immutable name → store type table.
#[derive(Debug)]
pub struct StoreTypeCatalog {
    namespace: String,
    version: u32,
    types: Vec<StoreType>,
    by_name: HashMap<String, usize>,
}

impl StoreTypeCatalog {
    /// Parses a manifest document. `documents` are the structural schema
    /// documents, which only need to be well-formed.
    pub fn load(manifest: &str, documents: &[&str]) -> Result<Self> {
        let document: ManifestDocument = toml::from_str(manifest)?;
        for doc in documents {
            toml::from_str::<toml::Value>(doc)?;
        }

        let mut by_name = HashMap::with_capacity(document.types.len());
        for (index, store_type) in document.types.iter().enumerate() {
            if by_name.insert(store_type.name.to_ascii_lowercase(), index).is_some() {
                return Err(ProviderError::ProviderIncompatible(format!(
                    "Store type '{}' is declared twice",
                    store_type.name
                )));
            }
        }

        debug!(
            "Loaded {} store types for namespace {} (manifest v{})",
            document.types.len(),
            document.namespace,
            document.version
        );

        Ok(StoreTypeCatalog {
            namespace: document.namespace,
            version: document.version,
            types: document.types,
            by_name,
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn types(&self) -> &[StoreType] {
        &self.types
    }

    /// Case-insensitive lookup.
    pub fn get(&self, name: &str) -> Option<&StoreType> {
        self.by_name
            .get(&name.to_ascii_lowercase())
            .map(|&index| &self.types[index])
    }

    /// Looks up a name the mapper is about to emit. A miss means the manifest
    /// and the mapper disagree.
    pub fn require(&self, name: &str) -> Result<&StoreType> {
        self.get(name).ok_or_else(|| {
            ProviderError::ProviderIncompatible(format!(
                "Store type '{}' is missing from the {} manifest",
                name, self.namespace
            ))
        })
    }

    /// Builds a store type usage, checking the name and facets against the catalog.
    pub fn usage(&self, name: &str, facets: FacetSet) -> Result<StoreTypeUsage> {
        let store_type = self.require(name)?;
        store_type.validate(&facets)?;
        Ok(StoreTypeUsage::new(store_type.name.clone(), facets))
    }
}
