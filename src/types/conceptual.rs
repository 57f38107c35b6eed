use super::facet::{Facet, FacetSet};
use super::kind::PrimitiveKind;
use crate::core::{ProviderError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A conceptual type: a primitive kind refined by facets.
///
/// Instances are validated on construction and immutable afterwards, so a
/// `TypeUsage` never carries a facet its kind cannot interpret.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "TypeUsageRepr", into = "TypeUsageRepr")]
pub struct TypeUsage {
    kind: PrimitiveKind,
    facets: FacetSet,
}

#[derive(Serialize, Deserialize)]
struct TypeUsageRepr {
    kind: PrimitiveKind,
    #[serde(default, skip_serializing_if = "FacetSet::is_empty")]
    facets: FacetSet,
}

impl TryFrom<TypeUsageRepr> for TypeUsage {
    type Error = ProviderError;

    fn try_from(repr: TypeUsageRepr) -> Result<Self> {
        TypeUsage::new(repr.kind, repr.facets)
    }
}

impl From<TypeUsage> for TypeUsageRepr {
    fn from(usage: TypeUsage) -> Self {
        TypeUsageRepr {
            kind: usage.kind,
            facets: usage.facets,
        }
    }
}

impl TypeUsage {
    /// Creates a type usage, rejecting facets that do not apply to `kind`.
    pub fn new(kind: PrimitiveKind, facets: FacetSet) -> Result<Self> {
        validate_facets(kind, &facets)?;
        Ok(TypeUsage { kind, facets })
    }

    /// Default usage of a kind: no facets at all.
    pub fn default_for(kind: PrimitiveKind) -> Self {
        TypeUsage {
            kind,
            facets: FacetSet::default(),
        }
    }

    /// String usage with every facet stated. `None` for `max_length` means unbounded.
    pub fn string(unicode: bool, fixed_length: bool, max_length: Option<u32>) -> Result<Self> {
        let facets = FacetSet {
            max_length: Some(max_length.map_or(Facet::Unbounded, Facet::Value)),
            unicode: Some(unicode),
            fixed_length: Some(fixed_length),
            ..FacetSet::default()
        };
        TypeUsage::new(PrimitiveKind::String, facets)
    }

    /// Binary usage with every facet stated. `None` for `max_length` means unbounded.
    pub fn binary(fixed_length: bool, max_length: Option<u32>) -> Result<Self> {
        let facets = FacetSet {
            max_length: Some(max_length.map_or(Facet::Unbounded, Facet::Value)),
            fixed_length: Some(fixed_length),
            ..FacetSet::default()
        };
        TypeUsage::new(PrimitiveKind::Binary, facets)
    }

    /// Decimal usage with an explicit precision and scale.
    pub fn decimal(precision: u8, scale: u8) -> Result<Self> {
        TypeUsage::new(
            PrimitiveKind::Decimal,
            FacetSet::new().with_precision(precision).with_scale(scale),
        )
    }

    /// Decimal usage whose precision and scale are left unbounded.
    pub fn decimal_default() -> Self {
        let facets = FacetSet {
            precision: Some(Facet::Unbounded),
            scale: Some(Facet::Unbounded),
            ..FacetSet::default()
        };
        TypeUsage {
            kind: PrimitiveKind::Decimal,
            facets,
        }
    }

    /// DateTime usage; `None` leaves PreserveSeconds unspecified.
    pub fn date_time(preserve_seconds: Option<bool>) -> Self {
        let facets = FacetSet {
            preserve_seconds,
            ..FacetSet::default()
        };
        TypeUsage {
            kind: PrimitiveKind::DateTime,
            facets,
        }
    }

    /// Returns a copy with the Nullable facet set.
    pub fn with_nullable(&self, nullable: bool) -> Self {
        TypeUsage {
            kind: self.kind,
            facets: self.facets.clone().with_nullable(nullable),
        }
    }

    pub fn kind(&self) -> PrimitiveKind {
        self.kind
    }

    pub fn facets(&self) -> &FacetSet {
        &self.facets
    }

    /// Nullable facet, defaulting to nullable when unspecified.
    pub fn is_nullable(&self) -> bool {
        self.facets.nullable.unwrap_or(true)
    }
}

impl fmt::Display for TypeUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Edm.{}", self.kind)?;
        match (self.facets.max_length, self.facets.precision, self.facets.scale) {
            (Some(Facet::Value(n)), _, _) => write!(f, "({})", n),
            (Some(Facet::Unbounded), _, _) => write!(f, "(max)"),
            (None, Some(Facet::Value(p)), Some(Facet::Value(s))) => write!(f, "({},{})", p, s),
            _ => Ok(()),
        }
    }
}

fn validate_facets(kind: PrimitiveKind, facets: &FacetSet) -> Result<()> {
    let reject = |facet: &str| -> Result<()> {
        Err(ProviderError::InvalidArgument(format!(
            "Facet '{}' does not apply to type {}",
            facet, kind
        )))
    };

    if !kind.is_length_bearing() {
        if facets.max_length.is_some() {
            return reject("MaxLength");
        }
        if facets.fixed_length.is_some() {
            return reject("FixedLength");
        }
    }
    if kind != PrimitiveKind::String && facets.unicode.is_some() {
        return reject("Unicode");
    }
    if kind != PrimitiveKind::Decimal {
        if facets.precision.is_some() {
            return reject("Precision");
        }
        if facets.scale.is_some() {
            return reject("Scale");
        }
    }
    if kind != PrimitiveKind::DateTime && facets.preserve_seconds.is_some() {
        return reject("PreserveSeconds");
    }

    if facets.max_length_value() == Some(0) {
        return Err(ProviderError::InvalidArgument(format!(
            "MaxLength of {} must be at least 1",
            kind
        )));
    }
    if facets.precision_value() == Some(0) {
        return Err(ProviderError::InvalidArgument(
            "Precision must be at least 1".to_string(),
        ));
    }

    if let (Some(precision), Some(scale)) = (facets.precision_value(), facets.scale_value()) {
        if scale > precision {
            return Err(ProviderError::InvalidArgument(format!(
                "Scale {} exceeds precision {}",
                scale, precision
            )));
        }
    }
    Ok(())
}
