//! Bound parameters and the rules that derive them from conceptual types.

use crate::core::{ProviderError, Result};
use crate::manifest::DateTimeFormat;
use crate::types::{PrimitiveKind, TypeUsage};
use chrono::{NaiveDate, NaiveDateTime, Timelike};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::types::Value;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Size given to non-input parameters that have no bounded MaxLength.
pub const MAX_PARAMETER_SIZE: u32 = i32::MAX as u32;

/// Text layout used for ISO8601 date/time values.
pub const ISO8601_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Names that can follow `@` in SQL text without quoting.
static PARAMETER_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("parameter name pattern is valid")
});

/// Mode of a routine's formal parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterMode {
    In,
    Out,
    InOut,
    Return,
}

/// Direction of a bound command parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterDirection {
    Input,
    Output,
    InputOutput,
    ReturnValue,
}

impl From<ParameterMode> for ParameterDirection {
    fn from(mode: ParameterMode) -> Self {
        match mode {
            ParameterMode::In => ParameterDirection::Input,
            ParameterMode::Out => ParameterDirection::Output,
            ParameterMode::InOut => ParameterDirection::InputOutput,
            ParameterMode::Return => ParameterDirection::ReturnValue,
        }
    }
}

impl ParameterDirection {
    /// Whether a value flows from the caller into the command.
    pub fn accepts_input(&self) -> bool {
        matches!(self, ParameterDirection::Input | ParameterDirection::InputOutput)
    }
}

/// Concrete parameter types understood by the command layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DbType {
    AnsiString,
    AnsiStringFixedLength,
    String,
    StringFixedLength,
    Binary,
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
    DateTime,
    DateTimeOffset,
    Time,
}

/// Value carried by a bound parameter. `Null` is the placeholder until the
/// caller binds a real value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterValue {
    #[default]
    Null,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
    Guid(Uuid),
    DateTime(NaiveDateTime),
}

impl ParameterValue {
    /// Converts to the value SQLite stores, laying out date/times per `format`.
    pub fn to_sqlite(&self, format: DateTimeFormat) -> Result<Value> {
        Ok(match self {
            ParameterValue::Null => Value::Null,
            ParameterValue::Boolean(b) => Value::Integer(i64::from(*b)),
            ParameterValue::Integer(i) => Value::Integer(*i),
            ParameterValue::Real(f) => Value::Real(*f),
            ParameterValue::Text(s) => Value::Text(s.clone()),
            ParameterValue::Blob(b) => Value::Blob(b.clone()),
            ParameterValue::Guid(g) => Value::Blob(g.as_bytes().to_vec()),
            ParameterValue::DateTime(dt) => match format {
                DateTimeFormat::Iso8601 => Value::Text(dt.format(ISO8601_FORMAT).to_string()),
                DateTimeFormat::Ticks => Value::Integer(to_ticks(dt)?),
            },
        })
    }
}

/// .NET ticks (100ns since 0001-01-01T00:00:00) for a date/time.
pub fn to_ticks(dt: &NaiveDateTime) -> Result<i64> {
    let epoch = NaiveDate::from_ymd_opt(1, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| ProviderError::InvalidArgument("Tick epoch is not representable".to_string()))?;
    (*dt - epoch)
        .num_microseconds()
        .and_then(|us| us.checked_mul(10))
        .map(|ticks| ticks + i64::from(dt.nanosecond() % 1000 / 100))
        .ok_or_else(|| ProviderError::InvalidArgument(format!("Date/time {} overflows ticks", dt)))
}

/// Fully-resolved description of one command parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundParameter {
    pub name: String,
    pub direction: ParameterDirection,
    pub db_type: DbType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    pub is_nullable: bool,
    #[serde(default)]
    pub value: ParameterValue,
}

/// Derives a bound parameter from a conceptual type and a mode.
///
/// Non-input parameters are always nullable and, lacking a bounded
/// MaxLength, are sized to [`MAX_PARAMETER_SIZE`] so the engine has room to
/// write back any value.
pub fn create_parameter(
    name: &str,
    type_usage: &TypeUsage,
    mode: ParameterMode,
    value: ParameterValue,
) -> Result<BoundParameter> {
    validate_parameter_name(name)?;

    let is_out_param = mode != ParameterMode::In;
    let (db_type, size) = db_type_for(type_usage, is_out_param);

    Ok(BoundParameter {
        name: name.to_string(),
        direction: mode.into(),
        db_type,
        size,
        is_nullable: is_out_param || type_usage.is_nullable(),
        value,
    })
}

/// Checks that `name` is a plain identifier usable as `@name`.
pub fn validate_parameter_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(ProviderError::InvalidArgument(
            "Parameter name must not be empty".to_string(),
        ));
    }
    if !PARAMETER_NAME.is_match(name) {
        return Err(ProviderError::InvalidArgument(format!(
            "Parameter name '{}' must start with a letter or underscore and contain only letters, digits and underscores",
            name
        )));
    }
    Ok(())
}

/// DbType and preferred size for a conceptual type.
pub fn db_type_for(type_usage: &TypeUsage, is_out_param: bool) -> (DbType, Option<u32>) {
    match type_usage.kind() {
        PrimitiveKind::Binary => (
            binary_db_type(type_usage),
            parameter_size(type_usage, is_out_param),
        ),
        PrimitiveKind::String => (
            string_db_type(type_usage),
            parameter_size(type_usage, is_out_param),
        ),
        PrimitiveKind::Boolean => (DbType::Boolean, None),
        PrimitiveKind::Byte => (DbType::Byte, None),
        PrimitiveKind::SByte => (DbType::SByte, None),
        PrimitiveKind::Int16 => (DbType::Int16, None),
        PrimitiveKind::Int32 => (DbType::Int32, None),
        PrimitiveKind::Int64 => (DbType::Int64, None),
        PrimitiveKind::Single => (DbType::Single, None),
        PrimitiveKind::Double => (DbType::Double, None),
        PrimitiveKind::Decimal => (DbType::Decimal, None),
        PrimitiveKind::Guid => (DbType::Guid, None),
        PrimitiveKind::DateTime => (DbType::DateTime, None),
        PrimitiveKind::DateTimeOffset => (DbType::DateTimeOffset, None),
        PrimitiveKind::Time => (DbType::Time, None),
    }
}

/// Preferred size: a bounded MaxLength, else the maximum for non-input
/// parameters, else no preference.
pub fn parameter_size(type_usage: &TypeUsage, is_out_param: bool) -> Option<u32> {
    match type_usage.facets().max_length_value() {
        Some(max_length) => Some(max_length),
        None if is_out_param => Some(MAX_PARAMETER_SIZE),
        None => None,
    }
}

fn string_db_type(type_usage: &TypeUsage) -> DbType {
    let facets = type_usage.facets();
    let fixed_length = facets.fixed_length.unwrap_or(false);
    let unicode = facets.unicode.unwrap_or(true);

    match (unicode, fixed_length) {
        (true, true) => DbType::StringFixedLength,
        (true, false) => DbType::String,
        (false, true) => DbType::AnsiStringFixedLength,
        (false, false) => DbType::AnsiString,
    }
}

// TODO: confirm whether fixed-length binaries should get their own DbType;
// SQLite stores both alike, so every binary binds as DbType::Binary for now.
fn binary_db_type(_type_usage: &TypeUsage) -> DbType {
    DbType::Binary
}
