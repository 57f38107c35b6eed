//! Facets refine a primitive type: length, precision, scale, unicode-ness and so on.
//!
//! A facet that is absent from a [`FacetSet`] is different from a facet that is
//! present but unbounded: `nvarchar` without a length and `nvarchar(max)` are
//! not the same request. `Option<Facet<T>>` keeps the two apart.

use crate::core::{ProviderError, Result};
use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// Keyword used for unbounded facets in TOML/JSON and on the command line.
pub const UNBOUNDED: &str = "unbounded";

/// A facet value that is either bounded or explicitly unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Facet<T> {
    Unbounded,
    Value(T),
}

impl<T: Copy> Facet<T> {
    /// Returns the bounded value, if any.
    pub fn value(&self) -> Option<T> {
        match self {
            Facet::Unbounded => None,
            Facet::Value(v) => Some(*v),
        }
    }

    pub fn is_unbounded(&self) -> bool {
        matches!(self, Facet::Unbounded)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FacetRepr<T> {
    Value(T),
    Keyword(String),
}

impl<T: Serialize> Serialize for Facet<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Facet::Unbounded => serializer.serialize_str(UNBOUNDED),
            Facet::Value(v) => v.serialize(serializer),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Facet<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        match FacetRepr::<T>::deserialize(deserializer)? {
            FacetRepr::Value(v) => Ok(Facet::Value(v)),
            FacetRepr::Keyword(k) if k.eq_ignore_ascii_case(UNBOUNDED) => Ok(Facet::Unbounded),
            FacetRepr::Keyword(k) => Err(de::Error::custom(format!(
                "expected a number or '{}', found '{}'",
                UNBOUNDED, k
            ))),
        }
    }
}

/// Sparse set of facets attached to a conceptual or store type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FacetSet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<Facet<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precision: Option<Facet<u8>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<Facet<u8>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unicode: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixed_length: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preserve_seconds: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,
}

impl FacetSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_length(mut self, max_length: u32) -> Self {
        self.max_length = Some(Facet::Value(max_length));
        self
    }

    pub fn with_unbounded_max_length(mut self) -> Self {
        self.max_length = Some(Facet::Unbounded);
        self
    }

    pub fn with_precision(mut self, precision: u8) -> Self {
        self.precision = Some(Facet::Value(precision));
        self
    }

    pub fn with_scale(mut self, scale: u8) -> Self {
        self.scale = Some(Facet::Value(scale));
        self
    }

    pub fn with_unicode(mut self, unicode: bool) -> Self {
        self.unicode = Some(unicode);
        self
    }

    pub fn with_fixed_length(mut self, fixed_length: bool) -> Self {
        self.fixed_length = Some(fixed_length);
        self
    }

    pub fn with_preserve_seconds(mut self, preserve_seconds: bool) -> Self {
        self.preserve_seconds = Some(preserve_seconds);
        self
    }

    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = Some(nullable);
        self
    }

    /// Bounded MaxLength, if the facet is present and has a value.
    pub fn max_length_value(&self) -> Option<u32> {
        self.max_length.and_then(|f| f.value())
    }

    /// Bounded Precision, if the facet is present and has a value.
    pub fn precision_value(&self) -> Option<u8> {
        self.precision.and_then(|f| f.value())
    }

    /// Bounded Scale, if the facet is present and has a value.
    pub fn scale_value(&self) -> Option<u8> {
        self.scale.and_then(|f| f.value())
    }

    pub fn is_empty(&self) -> bool {
        *self == FacetSet::default()
    }

    /// Applies a single `key=value` assignment such as `max_length=50`,
    /// `max_length=unbounded` or `unicode=false`.
    pub fn apply(&mut self, assignment: &str) -> Result<()> {
        let (key, value) = assignment.split_once('=').ok_or_else(|| {
            ProviderError::InvalidArgument(format!(
                "Facet assignment '{}' must have the form name=value",
                assignment
            ))
        })?;
        let key = key.trim().to_ascii_lowercase().replace('-', "_");
        let value = value.trim();

        match key.as_str() {
            "max_length" | "maxlength" => self.max_length = Some(parse_facet(&key, value)?),
            "precision" => self.precision = Some(parse_facet(&key, value)?),
            "scale" => self.scale = Some(parse_facet(&key, value)?),
            "unicode" => self.unicode = Some(parse_flag(&key, value)?),
            "fixed_length" | "fixedlength" => self.fixed_length = Some(parse_flag(&key, value)?),
            "preserve_seconds" | "preserveseconds" => {
                self.preserve_seconds = Some(parse_flag(&key, value)?)
            }
            "nullable" => self.nullable = Some(parse_flag(&key, value)?),
            _ => {
                return Err(ProviderError::InvalidArgument(format!(
                    "Unknown facet '{}'",
                    key
                )))
            }
        }
        Ok(())
    }
}

fn parse_facet<T: std::str::FromStr>(key: &str, value: &str) -> Result<Facet<T>> {
    if value.eq_ignore_ascii_case(UNBOUNDED) || value.eq_ignore_ascii_case("max") {
        return Ok(Facet::Unbounded);
    }
    value.parse::<T>().map(Facet::Value).map_err(|_| {
        ProviderError::InvalidArgument(format!("Invalid value '{}' for facet '{}'", value, key))
    })
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    value.to_ascii_lowercase().parse::<bool>().map_err(|_| {
        ProviderError::InvalidArgument(format!("Facet '{}' expects true or false, got '{}'", key, value))
    })
}
