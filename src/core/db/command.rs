/// Command Execution Module
///
/// Runs compiled commands against a SQLite connection, binding their
/// parameters by name and formatting any returned rows as strings.

use crate::command::{BoundParameter, CommandType, CompiledCommand};
use crate::core::{ProviderError, Result};
use crate::manifest::{DateTimeFormat, ProviderManifest};
use rusqlite::{types::ValueRef, Connection, Statement};
use serde::Serialize;
use tracing::{debug, warn};

/// Placeholder prefixes SQLite accepts for named parameters.
const PARAMETER_PREFIXES: [char; 3] = ['@', ':', '$'];

/// Represents the result of a query command
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    /// Column names from the query result
    pub columns: Vec<String>,
    /// Rows of data as string values
    pub rows: Vec<Vec<String>>,
    /// Number of rows returned
    pub row_count: usize,
}

impl QueryResult {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let row_count = rows.len();
        QueryResult {
            columns,
            rows,
            row_count,
        }
    }
}

/// Executes compiled commands on a borrowed connection
pub struct CommandExecutor<'a> {
    connection: &'a Connection,
    date_time_format: DateTimeFormat,
}

impl<'a> CommandExecutor<'a> {
    /// Creates an executor that lays out date/time values the way `manifest` does
    pub fn new(connection: &'a Connection, manifest: &ProviderManifest) -> Self {
        CommandExecutor {
            connection,
            date_time_format: manifest.date_time_format(),
        }
    }

    /// Executes an insert, update or delete and returns the number of affected rows
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` for stored-procedure commands, which SQLite
    /// cannot run, and `Database` when preparing or stepping the statement fails.
    pub fn execute_non_query(&self, command: &CompiledCommand) -> Result<usize> {
        let mut stmt = self.prepare(command)?;
        let changed = stmt.raw_execute()?;
        debug!("Command changed {} rows", changed);
        Ok(changed)
    }

    /// Executes a query and collects every row
    pub fn execute_query(&self, command: &CompiledCommand) -> Result<QueryResult> {
        let mut stmt = self.prepare(command)?;

        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let column_count = columns.len();

        let mut rows = Vec::new();
        let mut cursor = stmt.raw_query();
        while let Some(row) = cursor.next()? {
            let mut values = Vec::with_capacity(column_count);
            for i in 0..column_count {
                values.push(format_value(row.get_ref(i)?));
            }
            rows.push(values);
        }

        debug!("Query returned {} rows", rows.len());
        Ok(QueryResult::new(columns, rows))
    }

    fn prepare(&self, command: &CompiledCommand) -> Result<Statement<'a>> {
        if command.command_type() == CommandType::StoredProcedure {
            return Err(ProviderError::InvalidOperation(format!(
                "SQLite cannot execute stored procedure '{}'",
                command.sql_text()
            )));
        }

        let mut stmt = self.connection.prepare(command.sql_text())?;
        for parameter in command.parameters() {
            self.bind(&mut stmt, parameter)?;
        }
        Ok(stmt)
    }

    fn bind(&self, stmt: &mut Statement<'_>, parameter: &BoundParameter) -> Result<()> {
        if !parameter.direction.accepts_input() {
            warn!(
                "Skipping {:?} parameter '{}': SQLite has no output parameters",
                parameter.direction, parameter.name
            );
            return Ok(());
        }

        match parameter_index(stmt, &parameter.name)? {
            Some(index) => {
                let value = parameter.value.to_sqlite(self.date_time_format)?;
                stmt.raw_bind_parameter(index, value)?;
            }
            None => warn!(
                "Parameter '{}' is not referenced by the command text",
                parameter.name
            ),
        }
        Ok(())
    }
}

/// One-based index of a named parameter under any of SQLite's prefixes.
fn parameter_index(stmt: &Statement<'_>, name: &str) -> Result<Option<usize>> {
    for prefix in PARAMETER_PREFIXES {
        if let Some(index) = stmt.parameter_index(&format!("{}{}", prefix, name))? {
            return Ok(Some(index));
        }
    }
    Ok(None)
}

/// Formats a SQLite value for display
pub fn format_value(value: ValueRef) -> String {
    match value {
        ValueRef::Null => "NULL".to_string(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(t) => String::from_utf8_lossy(t).to_string(),
        ValueRef::Blob(b) => format!("<BLOB: {} bytes>", b.len()),
    }
}
