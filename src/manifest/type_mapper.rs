//! Conversions between conceptual types and SQLite store types.
//!
//! Conceptual → store is total over the kinds SQLite can hold and always
//! picks exactly one store type. Store → conceptual is used for introspection
//! only and may drop facets the conceptual side cannot express.

use super::ProviderManifest;
use crate::core::{ProviderError, Result};
use crate::types::{Facet, FacetSet, PrimitiveKind, StoreKind, StoreTypeUsage, TypeUsage};
use tracing::trace;

/// Precision used for decimals that do not state one.
pub const DEFAULT_DECIMAL_PRECISION: u8 = 18;
/// Scale used for decimals that do not state one.
pub const DEFAULT_DECIMAL_SCALE: u8 = 0;

impl ProviderManifest {
    /// Maps a conceptual type to the store type that holds it.
    ///
    /// # Errors
    ///
    /// - `UnsupportedType` for SByte, DateTimeOffset and Time, which SQLite has no store type for
    /// - `InvalidArgument` when a facet falls outside the range the store type accepts
    pub fn store_type_for(&self, edm_type: &TypeUsage) -> Result<StoreTypeUsage> {
        let facets = edm_type.facets();

        let (store_kind, store_facets) = match edm_type.kind() {
            PrimitiveKind::Boolean => (StoreKind::Bit, FacetSet::default()),
            PrimitiveKind::Byte => (StoreKind::TinyInt, FacetSet::default()),
            PrimitiveKind::Int16 => (StoreKind::SmallInt, FacetSet::default()),
            PrimitiveKind::Int32 => (StoreKind::Int, FacetSet::default()),
            PrimitiveKind::Int64 => (StoreKind::Integer, FacetSet::default()),
            PrimitiveKind::Guid => (StoreKind::UniqueIdentifier, FacetSet::default()),
            PrimitiveKind::Double => (StoreKind::Float, FacetSet::default()),
            PrimitiveKind::Single => (StoreKind::Real, FacetSet::default()),

            PrimitiveKind::Decimal => {
                let scale = facets.scale_value().unwrap_or(DEFAULT_DECIMAL_SCALE);
                // An unstated precision widens to hold the stated scale.
                let precision = facets
                    .precision_value()
                    .unwrap_or(DEFAULT_DECIMAL_PRECISION.max(scale));
                if scale > precision {
                    return Err(ProviderError::InvalidArgument(format!(
                        "Scale {} exceeds precision {} for {}",
                        scale, precision, edm_type
                    )));
                }
                (
                    StoreKind::ExtDecimal,
                    FacetSet::new().with_precision(precision).with_scale(scale),
                )
            }

            PrimitiveKind::Binary => {
                let fixed_length = facets.fixed_length.unwrap_or(false);
                let mut store_facets = FacetSet {
                    max_length: Some(self.bounded_length(StoreKind::Blob, facets)?),
                    ..FacetSet::default()
                };
                // SQLite keeps fixed and variable blobs alike; the facet is only reported.
                if fixed_length {
                    store_facets.fixed_length = Some(true);
                }
                (StoreKind::Blob, store_facets)
            }

            PrimitiveKind::String => {
                let unicode = facets.unicode.unwrap_or(true);
                let fixed_length = facets.fixed_length.unwrap_or(false);
                let store_kind = match (unicode, fixed_length) {
                    (true, true) => StoreKind::NChar,
                    (true, false) => StoreKind::NVarChar,
                    (false, true) => StoreKind::Char,
                    (false, false) => StoreKind::VarChar,
                };
                let store_facets = FacetSet {
                    max_length: Some(self.bounded_length(store_kind, facets)?),
                    ..FacetSet::default()
                };
                (store_kind, store_facets)
            }

            PrimitiveKind::DateTime => {
                if facets.preserve_seconds.unwrap_or(true) {
                    (StoreKind::DateTime, FacetSet::default())
                } else {
                    (StoreKind::SmallDateTime, FacetSet::default())
                }
            }

            kind @ (PrimitiveKind::SByte | PrimitiveKind::DateTimeOffset | PrimitiveKind::Time) => {
                return Err(ProviderError::UnsupportedType(format!(
                    "There is no store type corresponding to the EDM type '{}' of primitive type '{}'.",
                    edm_type, kind
                )));
            }
        };

        let store_type = self.catalog().usage(store_kind.name(), store_facets)?;
        trace!("Mapped {} to store type {}", edm_type, store_type);
        Ok(store_type)
    }

    /// Maps a store type back to the closest conceptual type.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` for an empty name or a decimal whose scale exceeds its precision
    /// - `UnsupportedType` for names the provider does not interpret
    pub fn conceptual_type_for(&self, store_type: &StoreTypeUsage) -> Result<TypeUsage> {
        let name = store_type.name.trim().to_ascii_lowercase();
        if name.is_empty() {
            return Err(ProviderError::InvalidArgument(
                "Store type name must not be empty".to_string(),
            ));
        }

        let Some(entry) = self.catalog().get(&name) else {
            return match name.as_str() {
                "integer" => Ok(TypeUsage::default_for(PrimitiveKind::Int64)),
                _ => Err(ProviderError::unsupported_store_type(&name)),
            };
        };
        let store_kind =
            StoreKind::from_name(&name).ok_or_else(|| ProviderError::unsupported_store_type(&name))?;
        let facets = &store_type.facets;

        let usage = match store_kind {
            // SQLite's only integer affinity is 64-bit, whatever the manifest says.
            StoreKind::Integer => TypeUsage::default_for(PrimitiveKind::Int64),
            StoreKind::TinyInt
            | StoreKind::SmallInt
            | StoreKind::Int
            | StoreKind::Bit
            | StoreKind::UniqueIdentifier
            | StoreKind::Float
            | StoreKind::Real => TypeUsage::default_for(entry.primitive),

            StoreKind::Decimal | StoreKind::ExtDecimal => {
                match (facets.precision_value(), facets.scale_value()) {
                    (Some(precision), Some(scale)) => TypeUsage::decimal(precision, scale)?,
                    _ => TypeUsage::decimal_default(),
                }
            }

            StoreKind::DateTime => TypeUsage::date_time(None),
            StoreKind::SmallDateTime => TypeUsage::date_time(Some(false)),

            StoreKind::VarChar => TypeUsage::string(false, false, facets.max_length_value())?,
            StoreKind::Char => TypeUsage::string(false, true, facets.max_length_value())?,
            StoreKind::NVarChar => TypeUsage::string(true, false, facets.max_length_value())?,
            StoreKind::NChar => TypeUsage::string(true, true, facets.max_length_value())?,
            StoreKind::Xml => TypeUsage::string(true, false, None)?,

            StoreKind::Blob => {
                TypeUsage::binary(facets.fixed_length.unwrap_or(false), facets.max_length_value())?
            }
        };

        trace!("Mapped store type {} to {}", store_type, usage);
        Ok(usage)
    }

    /// Parses a declared column type (`NVARCHAR(50)`) and maps it to a conceptual type.
    pub fn conceptual_type_for_declared(&self, declared: &str) -> Result<TypeUsage> {
        self.conceptual_type_for(&StoreTypeUsage::parse(declared)?)
    }

    /// MaxLength for a store type: bounded when the conceptual facet has a
    /// value the store type can represent, unbounded otherwise.
    fn bounded_length(&self, store_kind: StoreKind, facets: &FacetSet) -> Result<Facet<u32>> {
        let limit = self
            .catalog()
            .require(store_kind.name())?
            .max_length_limit()
            .ok_or_else(|| {
                ProviderError::ProviderIncompatible(format!(
                    "Store type '{}' declares no MaxLength facet",
                    store_kind.name()
                ))
            })?;

        Ok(match facets.max_length_value() {
            Some(length) if length <= limit => Facet::Value(length),
            _ => Facet::Unbounded,
        })
    }
}
