/// Provider Manifest Module
///
/// The manifest describes what the SQLite store can hold: the catalog of
/// store types with their facet schemas, plus the two structural documents
/// that describe the schema-introspection views.
///
/// ## Architecture
///
/// - **Catalog** (`catalog.rs`): the store-type table, parsed once per process
/// - **Type Mapper** (`type_mapper.rs`): conversions between conceptual and store types
///
/// A `ProviderManifest` pairs the shared catalog with the date/time format
/// selected by the manifest token.
pub mod catalog;
pub mod type_mapper;

use crate::core::{ProviderError, Result};
use catalog::{StoreType, StoreTypeCatalog};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Information request for the store schema definition document.
pub const STORE_SCHEMA_DEFINITION: &str = "StoreSchemaDefinition";
/// Information request for the store schema mapping document.
pub const STORE_SCHEMA_MAPPING: &str = "StoreSchemaMapping";

/// How date/time values are stored in SQLite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DateTimeFormat {
    /// .NET ticks: 100ns intervals since 0001-01-01
    Ticks,
    /// `yyyy-MM-dd HH:mm:ss` text
    #[default]
    #[serde(rename = "ISO8601")]
    Iso8601,
}

impl DateTimeFormat {
    pub fn token(&self) -> &'static str {
        match self {
            DateTimeFormat::Ticks => "Ticks",
            DateTimeFormat::Iso8601 => "ISO8601",
        }
    }
}

impl fmt::Display for DateTimeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for DateTimeFormat {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ticks" => Ok(DateTimeFormat::Ticks),
            "iso8601" => Ok(DateTimeFormat::Iso8601),
            other => Err(ProviderError::InvalidArgument(format!(
                "Unknown manifest token '{}': expected Ticks or ISO8601",
                other
            ))),
        }
    }
}

/// Entry point for type mapping: the shared catalog plus a date/time format.
#[derive(Debug, Clone, Copy)]
pub struct ProviderManifest {
    date_time_format: DateTimeFormat,
    catalog: &'static StoreTypeCatalog,
}

impl ProviderManifest {
    /// Creates a manifest for the given token (`Ticks` or `ISO8601`).
    pub fn new(manifest_token: &str) -> Result<Self> {
        let date_time_format = manifest_token.parse()?;
        Self::with_format(date_time_format)
    }

    pub fn with_format(date_time_format: DateTimeFormat) -> Result<Self> {
        Ok(ProviderManifest {
            date_time_format,
            catalog: catalog::catalog()?,
        })
    }

    pub fn token(&self) -> &'static str {
        self.date_time_format.token()
    }

    pub fn date_time_format(&self) -> DateTimeFormat {
        self.date_time_format
    }

    pub fn catalog(&self) -> &'static StoreTypeCatalog {
        self.catalog
    }

    /// All store types declared by the manifest.
    pub fn store_types(&self) -> &'static [StoreType] {
        self.catalog.types()
    }

    /// Store type by name, ignoring case.
    pub fn store_type(&self, name: &str) -> Option<&'static StoreType> {
        self.catalog.get(name)
    }

    /// Returns one of the structural schema documents.
    ///
    /// # Errors
    ///
    /// `ProviderIncompatible` for any request other than
    /// [`STORE_SCHEMA_DEFINITION`] or [`STORE_SCHEMA_MAPPING`].
    pub fn information(&self, information_type: &str) -> Result<&'static str> {
        match information_type {
            STORE_SCHEMA_DEFINITION => Ok(catalog::STORE_SCHEMA_DEFINITION),
            STORE_SCHEMA_MAPPING => Ok(catalog::STORE_SCHEMA_MAPPING),
            other => Err(ProviderError::ProviderIncompatible(format!(
                "The provider returned null for the informationType '{}'.",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_token_parsing() {
        assert_eq!(ProviderManifest::new("iso8601").unwrap().date_time_format(), DateTimeFormat::Iso8601);
        assert_eq!(ProviderManifest::new("TICKS").unwrap().date_time_format(), DateTimeFormat::Ticks);
        assert!(matches!(
            ProviderManifest::new("JulianDay"),
            Err(ProviderError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_information_documents() {
        let manifest = ProviderManifest::new("ISO8601").unwrap();
        assert!(manifest.information(STORE_SCHEMA_DEFINITION).unwrap().contains("SCHEMATABLES"));
        assert!(manifest.information(STORE_SCHEMA_MAPPING).unwrap().contains("STables"));
        assert!(matches!(
            manifest.information("ConceptualSchemaDefinition"),
            Err(ProviderError::ProviderIncompatible(_))
        ));
    }

    #[test]
    fn test_store_types_are_shared() {
        let a = ProviderManifest::new("ISO8601").unwrap();
        let b = ProviderManifest::new("Ticks").unwrap();
        assert!(std::ptr::eq(a.catalog(), b.catalog()));
        assert!(a.store_types().iter().any(|t| t.name == "nvarchar"));
        assert_eq!(a.store_type("NVarChar").unwrap().name, "nvarchar");
        assert!(a.store_type("text").is_none());
    }
}
