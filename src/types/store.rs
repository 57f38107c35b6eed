use super::facet::{Facet, FacetSet};
use crate::core::{ProviderError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared column types as SQLite accepts them: `NVARCHAR(50)`, `decimal(10, 2)`,
/// `varchar(max)`, `unsigned big int`.
static DECLARED_TYPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*([a-z_][a-z0-9_ ]*?)\s*(?:\(\s*(\d+|max)\s*(?:,\s*(\d+)\s*)?\))?\s*$")
        .expect("declared type pattern is valid")
});

const DECIMAL_NAMES: [&str; 3] = ["decimal", "extdecimal", "numeric"];

/// Store type names the type mapper knows how to produce or interpret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKind {
    TinyInt,
    SmallInt,
    Int,
    Integer,
    Bit,
    UniqueIdentifier,
    Float,
    Real,
    Decimal,
    ExtDecimal,
    DateTime,
    SmallDateTime,
    VarChar,
    Char,
    NVarChar,
    NChar,
    Xml,
    Blob,
}

impl StoreKind {
    pub const ALL: [StoreKind; 18] = [
        StoreKind::TinyInt,
        StoreKind::SmallInt,
        StoreKind::Int,
        StoreKind::Integer,
        StoreKind::Bit,
        StoreKind::UniqueIdentifier,
        StoreKind::Float,
        StoreKind::Real,
        StoreKind::Decimal,
        StoreKind::ExtDecimal,
        StoreKind::DateTime,
        StoreKind::SmallDateTime,
        StoreKind::VarChar,
        StoreKind::Char,
        StoreKind::NVarChar,
        StoreKind::NChar,
        StoreKind::Xml,
        StoreKind::Blob,
    ];

    /// Catalog spelling of the name.
    pub fn name(&self) -> &'static str {
        match self {
            StoreKind::TinyInt => "tinyint",
            StoreKind::SmallInt => "smallint",
            StoreKind::Int => "int",
            StoreKind::Integer => "integer",
            StoreKind::Bit => "bit",
            StoreKind::UniqueIdentifier => "uniqueidentifier",
            StoreKind::Float => "float",
            StoreKind::Real => "real",
            StoreKind::Decimal => "decimal",
            StoreKind::ExtDecimal => "extDecimal",
            StoreKind::DateTime => "datetime",
            StoreKind::SmallDateTime => "smalldatetime",
            StoreKind::VarChar => "varchar",
            StoreKind::Char => "char",
            StoreKind::NVarChar => "nvarchar",
            StoreKind::NChar => "nchar",
            StoreKind::Xml => "xml",
            StoreKind::Blob => "blob",
        }
    }

    /// Case-insensitive lookup by name.
    pub fn from_name(name: &str) -> Option<StoreKind> {
        StoreKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.name().eq_ignore_ascii_case(name))
    }
}

/// A concrete store type: a catalog name plus the facets that name leaves variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoreTypeUsage {
    pub name: String,
    #[serde(default, skip_serializing_if = "FacetSet::is_empty")]
    pub facets: FacetSet,
}

impl StoreTypeUsage {
    pub fn new(name: impl Into<String>, facets: FacetSet) -> Self {
        StoreTypeUsage {
            name: name.into(),
            facets,
        }
    }

    /// A store type with no facets.
    pub fn named(name: impl Into<String>) -> Self {
        Self::new(name, FacetSet::default())
    }

    /// Parses a declared column type into a store type usage.
    ///
    /// The name is lower-cased with inner whitespace collapsed. A single
    /// argument becomes MaxLength (Precision for decimal names), two arguments
    /// become Precision and Scale. Whether the name exists in the catalog is not
    /// checked here.
    pub fn parse(declared: &str) -> Result<Self> {
        let caps = DECLARED_TYPE.captures(declared).ok_or_else(|| {
            ProviderError::InvalidArgument(format!("Cannot parse declared type '{}'", declared))
        })?;

        let name = caps[1]
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_ascii_lowercase();
        let mut facets = FacetSet::default();

        match (caps.get(2), caps.get(3)) {
            (None, _) => {}
            (Some(first), None) if DECIMAL_NAMES.contains(&name.as_str()) => {
                facets.precision = Some(Facet::Value(parse_number(first.as_str(), declared)?));
            }
            (Some(first), None) => {
                facets.max_length = Some(if first.as_str().eq_ignore_ascii_case("max") {
                    Facet::Unbounded
                } else {
                    Facet::Value(parse_number(first.as_str(), declared)?)
                });
            }
            (Some(first), Some(second)) => {
                facets.precision = Some(Facet::Value(parse_number(first.as_str(), declared)?));
                facets.scale = Some(Facet::Value(parse_number(second.as_str(), declared)?));
            }
        }

        Ok(StoreTypeUsage { name, facets })
    }
}

fn parse_number<T: std::str::FromStr>(digits: &str, declared: &str) -> Result<T> {
    digits.parse::<T>().map_err(|_| {
        ProviderError::InvalidArgument(format!(
            "Type argument '{}' is out of range in '{}'",
            digits, declared
        ))
    })
}

impl fmt::Display for StoreTypeUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        match (self.facets.max_length, self.facets.precision, self.facets.scale) {
            (Some(Facet::Value(n)), _, _) => write!(f, "({})", n),
            (Some(Facet::Unbounded), _, _) => Ok(()),
            (None, Some(Facet::Value(p)), Some(Facet::Value(s))) => write!(f, "({},{})", p, s),
            _ => Ok(()),
        }
    }
}
