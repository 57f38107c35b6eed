/// Schema Introspection Module
///
/// Reads the declared column types of a table and maps each one to its
/// conceptual type through the provider manifest.

use crate::core::{ProviderError, Result};
use crate::manifest::ProviderManifest;
use crate::types::TypeUsage;
use rusqlite::{Connection, Row};
use serde::Serialize;
use tracing::debug;

/// A table column together with the conceptual type of its declared type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnType {
    /// Column name
    pub name: String,
    /// Type as written in the table definition (e.g., "NVARCHAR(50)")
    pub declared_type: String,
    pub not_null: bool,
    pub primary_key: bool,
    /// `None` when the declared type has no conceptual counterpart
    #[serde(rename = "type")]
    pub type_usage: Option<TypeUsage>,
}

struct PragmaColumn {
    name: String,
    declared_type: String,
    not_null: bool,
    primary_key: bool,
}

impl PragmaColumn {
    /// Creates a column from a PRAGMA table_info result row
    fn from_pragma_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(PragmaColumn {
            name: row.get(1)?,
            declared_type: row.get(2)?,
            not_null: row.get(3)?,
            primary_key: row.get::<_, i64>(5)? > 0,
        })
    }
}

/// Conceptual types of every column of `table`, in declaration order
///
/// Columns marked `NOT NULL` yield non-nullable types. A declared type the
/// provider cannot interpret (including SQLite's untyped columns) yields
/// `None` rather than failing the whole table.
///
/// # Errors
///
/// Returns `InvalidArgument` if the table does not exist, and `Database` if
/// the pragma cannot be run.
pub fn column_types(
    conn: &Connection,
    manifest: &ProviderManifest,
    table: &str,
) -> Result<Vec<ColumnType>> {
    let mut stmt = conn.prepare("SELECT * FROM pragma_table_info(?1)")?;
    let columns = stmt
        .query_map([table], |row| PragmaColumn::from_pragma_row(row))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    if columns.is_empty() {
        return Err(ProviderError::InvalidArgument(format!(
            "Table '{}' does not exist",
            table
        )));
    }

    Ok(columns
        .into_iter()
        .map(|column| {
            let type_usage = match manifest.conceptual_type_for_declared(&column.declared_type) {
                Ok(usage) => Some(usage.with_nullable(!column.not_null)),
                Err(e) => {
                    debug!("Column {}.{} has no conceptual type: {}", table, column.name, e);
                    None
                }
            };
            ColumnType {
                name: column.name,
                declared_type: column.declared_type,
                not_null: column.not_null,
                primary_key: column.primary_key,
                type_usage,
            }
        })
        .collect())
}
