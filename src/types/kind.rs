use crate::core::{ProviderError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Primitive kinds of the conceptual type system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub enum PrimitiveKind {
    Boolean,
    Byte,
    SByte,
    Int16,
    Int32,
    Int64,
    Single,
    Double,
    Decimal,
    Guid,
    String,
    Binary,
    DateTime,
    DateTimeOffset,
    Time,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 15] = [
        PrimitiveKind::Boolean,
        PrimitiveKind::Byte,
        PrimitiveKind::SByte,
        PrimitiveKind::Int16,
        PrimitiveKind::Int32,
        PrimitiveKind::Int64,
        PrimitiveKind::Single,
        PrimitiveKind::Double,
        PrimitiveKind::Decimal,
        PrimitiveKind::Guid,
        PrimitiveKind::String,
        PrimitiveKind::Binary,
        PrimitiveKind::DateTime,
        PrimitiveKind::DateTimeOffset,
        PrimitiveKind::Time,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "Boolean",
            PrimitiveKind::Byte => "Byte",
            PrimitiveKind::SByte => "SByte",
            PrimitiveKind::Int16 => "Int16",
            PrimitiveKind::Int32 => "Int32",
            PrimitiveKind::Int64 => "Int64",
            PrimitiveKind::Single => "Single",
            PrimitiveKind::Double => "Double",
            PrimitiveKind::Decimal => "Decimal",
            PrimitiveKind::Guid => "Guid",
            PrimitiveKind::String => "String",
            PrimitiveKind::Binary => "Binary",
            PrimitiveKind::DateTime => "DateTime",
            PrimitiveKind::DateTimeOffset => "DateTimeOffset",
            PrimitiveKind::Time => "Time",
        }
    }

    /// String and Binary are the only kinds sized by a MaxLength facet.
    pub fn is_length_bearing(&self) -> bool {
        matches!(self, PrimitiveKind::String | PrimitiveKind::Binary)
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PrimitiveKind {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self> {
        PrimitiveKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ProviderError::UnsupportedType(format!("Unknown primitive kind '{}'", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("int32".parse::<PrimitiveKind>().unwrap(), PrimitiveKind::Int32);
        assert_eq!(" DateTimeOffset ".parse::<PrimitiveKind>().unwrap(), PrimitiveKind::DateTimeOffset);
        assert!(matches!(
            "money".parse::<PrimitiveKind>(),
            Err(ProviderError::UnsupportedType(_))
        ));
    }

    proptest! {
        #[test]
        fn prop_display_parses_back(kind in any::<PrimitiveKind>()) {
            prop_assert_eq!(kind.to_string().parse::<PrimitiveKind>().unwrap(), kind);
        }
    }
}
