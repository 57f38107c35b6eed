//! Built-in SQL generator for the SQLite dialect.
//!
//! Queries inline their constants as literals and never synthesise
//! parameters. Inserts, updates and deletes turn each constant into a
//! synthesised `@pN` parameter. Routine invocations use the routine's
//! command text when it has one and fall back to a stored-procedure call.

use super::compiler::{CommandType, GeneratedSql, SqlGenerator};
use super::parameter::{
    create_parameter, validate_parameter_name, BoundParameter, ParameterMode, ParameterValue,
};
use super::{CommandBody, CommandTree, Operand, Predicate, RoutineSignature, SetClause};
use crate::core::{ProviderError, Result};
use crate::manifest::{DateTimeFormat, ProviderManifest};
use rusqlite::types::Value;
use std::fmt::Write;

/// Generates SQLite SQL for every kind of command tree.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteSqlGenerator;

impl SqlGenerator for SqliteSqlGenerator {
    fn generate(&self, manifest: &ProviderManifest, tree: &CommandTree) -> Result<GeneratedSql> {
        let mut writer = SqlWriter::new(tree, manifest.date_time_format());

        match &tree.body {
            CommandBody::Query {
                table,
                columns,
                filter,
            } => writer.write_query(table, columns, filter)?,
            CommandBody::Insert { table, values } => writer.write_insert(table, values)?,
            CommandBody::Update {
                table,
                values,
                filter,
            } => writer.write_update(table, values, filter)?,
            CommandBody::Delete { table, filter } => writer.write_delete(table, filter)?,
            CommandBody::Function { routine } => return function_sql(routine),
        }

        Ok(GeneratedSql {
            sql_text: writer.sql,
            parameters: writer.synthesized,
            command_type: CommandType::Text,
        })
    }
}

fn function_sql(routine: &RoutineSignature) -> Result<GeneratedSql> {
    let (sql_text, command_type) = match routine.command_text.as_deref() {
        Some(text) if !text.trim().is_empty() => (text.to_string(), CommandType::Text),
        _ => {
            let mut name = String::new();
            if let Some(schema) = &routine.schema {
                name.push_str(&quote_identifier(schema)?);
                name.push('.');
            }
            name.push_str(&quote_identifier(&routine.name)?);
            (name, CommandType::StoredProcedure)
        }
    };

    Ok(GeneratedSql {
        sql_text,
        parameters: Vec::new(),
        command_type,
    })
}

/// Quotes an identifier with double quotes, doubling embedded quotes.
pub fn quote_identifier(identifier: &str) -> Result<String> {
    if identifier.is_empty() {
        return Err(ProviderError::InvalidArgument(
            "Identifier must not be empty".to_string(),
        ));
    }
    Ok(format!("\"{}\"", identifier.replace('"', "\"\"")))
}

/// Renders a value as a SQLite literal.
pub fn literal(value: &ParameterValue, format: DateTimeFormat) -> Result<String> {
    Ok(match value.to_sqlite(format)? {
        Value::Null => "NULL".to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Real(f) if f.is_finite() => format!("{:?}", f),
        Value::Real(f) => {
            return Err(ProviderError::InvalidArgument(format!(
                "{} has no SQL literal",
                f
            )))
        }
        Value::Text(s) => format!("'{}'", s.replace('\'', "''")),
        Value::Blob(bytes) => {
            let mut hex = String::with_capacity(bytes.len() * 2 + 3);
            hex.push_str("X'");
            for byte in bytes {
                hex.push_str(&format!("{:02X}", byte));
            }
            hex.push('\'');
            hex
        }
    })
}

struct SqlWriter<'a> {
    tree: &'a CommandTree,
    date_time_format: DateTimeFormat,
    sql: String,
    synthesized: Vec<BoundParameter>,
    next_index: usize,
}

impl<'a> SqlWriter<'a> {
    fn new(tree: &'a CommandTree, date_time_format: DateTimeFormat) -> Self {
        SqlWriter {
            tree,
            date_time_format,
            sql: String::new(),
            synthesized: Vec::new(),
            next_index: 0,
        }
    }

    fn write_query(&mut self, table: &str, columns: &[String], filter: &[Predicate]) -> Result<()> {
        self.sql.push_str("SELECT ");
        if columns.is_empty() {
            self.sql.push('*');
        } else {
            let quoted = columns
                .iter()
                .map(|c| quote_identifier(c))
                .collect::<Result<Vec<_>>>()?;
            self.sql.push_str(&quoted.join(", "));
        }
        self.sql.push_str(" FROM ");
        self.sql.push_str(&quote_identifier(table)?);
        self.write_filter(filter, false)
    }

    fn write_insert(&mut self, table: &str, values: &[SetClause]) -> Result<()> {
        self.sql.push_str("INSERT INTO ");
        self.sql.push_str(&quote_identifier(table)?);

        if values.is_empty() {
            self.sql.push_str(" DEFAULT VALUES");
            return Ok(());
        }

        let mut columns = Vec::with_capacity(values.len());
        let mut operands = Vec::with_capacity(values.len());
        for clause in values {
            columns.push(quote_identifier(&clause.column)?);
            operands.push(self.operand(&clause.value, true)?);
        }
        write!(self.sql, " ({}) VALUES ({})", columns.join(", "), operands.join(", "))
            .map_err(|e| ProviderError::InvalidOperation(e.to_string()))?;
        Ok(())
    }

    fn write_update(&mut self, table: &str, values: &[SetClause], filter: &[Predicate]) -> Result<()> {
        if values.is_empty() {
            return Err(ProviderError::InvalidArgument(format!(
                "Update of {} assigns no columns",
                table
            )));
        }

        self.sql.push_str("UPDATE ");
        self.sql.push_str(&quote_identifier(table)?);
        self.sql.push_str(" SET ");

        let mut assignments = Vec::with_capacity(values.len());
        for clause in values {
            let column = quote_identifier(&clause.column)?;
            let operand = self.operand(&clause.value, true)?;
            assignments.push(format!("{} = {}", column, operand));
        }
        self.sql.push_str(&assignments.join(", "));
        self.write_filter(filter, true)
    }

    fn write_delete(&mut self, table: &str, filter: &[Predicate]) -> Result<()> {
        self.sql.push_str("DELETE FROM ");
        self.sql.push_str(&quote_identifier(table)?);
        self.write_filter(filter, true)
    }

    fn write_filter(&mut self, filter: &[Predicate], synthesize: bool) -> Result<()> {
        if filter.is_empty() {
            return Ok(());
        }

        let mut terms = Vec::with_capacity(filter.len());
        for predicate in filter {
            let column = quote_identifier(&predicate.column)?;
            let term = match &predicate.value {
                Operand::Null => format!("{} IS NULL", column),
                operand => format!("{} = {}", column, self.operand(operand, synthesize)?),
            };
            terms.push(term);
        }
        self.sql.push_str(" WHERE ");
        self.sql.push_str(&terms.join(" AND "));
        Ok(())
    }

    /// Renders an operand. Constants become synthesised parameters when
    /// `synthesize` is set and literals otherwise.
    fn operand(&mut self, operand: &Operand, synthesize: bool) -> Result<String> {
        match operand {
            Operand::Null => Ok("NULL".to_string()),
            Operand::Parameter(name) => {
                validate_parameter_name(name)?;
                if self.tree.parameter(name).is_none() {
                    return Err(ProviderError::InvalidArgument(format!(
                        "Parameter '{}' is referenced but not declared",
                        name
                    )));
                }
                Ok(format!("@{}", name))
            }
            Operand::Constant { value, type_usage } if synthesize => {
                let name = self.next_parameter_name();
                let parameter = create_parameter(&name, type_usage, ParameterMode::In, value.clone())?;
                self.synthesized.push(parameter);
                Ok(format!("@{}", name))
            }
            Operand::Constant { value, .. } => literal(value, self.date_time_format),
        }
    }

    /// Next `pN` name that does not collide with a declared parameter.
    fn next_parameter_name(&mut self) -> String {
        loop {
            let name = format!("p{}", self.next_index);
            self.next_index += 1;
            if self.tree.parameter(&name).is_none() {
                return name;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PrimitiveKind, TypeUsage};
    use chrono::NaiveDate;

    fn generate(tree: &CommandTree) -> Result<GeneratedSql> {
        SqliteSqlGenerator.generate(&ProviderManifest::new("ISO8601").unwrap(), tree)
    }

    fn int(value: i64) -> Operand {
        Operand::constant(ParameterValue::Integer(value), TypeUsage::default_for(PrimitiveKind::Int64))
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("users").unwrap(), "\"users\"");
        assert_eq!(quote_identifier("we\"ird").unwrap(), "\"we\"\"ird\"");
        assert!(quote_identifier("").is_err());
    }

    #[test]
    fn test_literals() {
        let iso = DateTimeFormat::Iso8601;
        assert_eq!(literal(&ParameterValue::Text("O'Brien".into()), iso).unwrap(), "'O''Brien'");
        assert_eq!(literal(&ParameterValue::Blob(vec![0xde, 0xad]), iso).unwrap(), "X'DEAD'");
        assert_eq!(literal(&ParameterValue::Blob(vec![]), iso).unwrap(), "X''");
        assert_eq!(literal(&ParameterValue::Blob(vec![0x00, 0x0f, 0xff]), iso).unwrap(), "X'000FFF'");
        assert_eq!(literal(&ParameterValue::Real(1.5), iso).unwrap(), "1.5");
        assert_eq!(literal(&ParameterValue::Real(2.0), iso).unwrap(), "2.0");
        assert_eq!(literal(&ParameterValue::Boolean(false), iso).unwrap(), "0");
        assert_eq!(literal(&ParameterValue::Null, iso).unwrap(), "NULL");
        assert!(literal(&ParameterValue::Real(f64::NAN), iso).is_err());

        let dt = NaiveDate::from_ymd_opt(2020, 1, 2).unwrap().and_hms_opt(3, 4, 5).unwrap();
        assert_eq!(literal(&ParameterValue::DateTime(dt), iso).unwrap(), "'2020-01-02 03:04:05'");
        assert_eq!(
            literal(&ParameterValue::DateTime(dt), DateTimeFormat::Ticks).unwrap(),
            "637135310450000000"
        );
    }

    #[test]
    fn test_query_inlines_constants() {
        let mut tree = CommandTree::query("users").with_parameter("name", TypeUsage::string(true, false, None).unwrap());
        if let CommandBody::Query { columns, filter, .. } = &mut tree.body {
            columns.push("id".into());
            columns.push("name".into());
            filter.push(Predicate::eq("name", Operand::parameter("name")));
            filter.push(Predicate::eq("age", int(42)));
            filter.push(Predicate::eq("deleted_at", Operand::Null));
        }
        let generated = generate(&tree).unwrap();
        assert_eq!(
            generated.sql_text,
            "SELECT \"id\", \"name\" FROM \"users\" WHERE \"name\" = @name AND \"age\" = 42 AND \"deleted_at\" IS NULL"
        );
        assert!(generated.parameters.is_empty());
        assert_eq!(generated.command_type, CommandType::Text);
    }

    #[test]
    fn test_insert_synthesizes_parameters() {
        let tree = CommandTree::insert(
            "users",
            vec![SetClause::new("id", int(1)), SetClause::new("note", Operand::Null)],
        );
        let generated = generate(&tree).unwrap();
        assert_eq!(generated.sql_text, "INSERT INTO \"users\" (\"id\", \"note\") VALUES (@p0, NULL)");
        assert_eq!(generated.parameters.len(), 1);
        assert_eq!(generated.parameters[0].name, "p0");
        assert_eq!(generated.parameters[0].value, ParameterValue::Integer(1));
    }

    #[test]
    fn test_insert_default_values() {
        let generated = generate(&CommandTree::insert("log", vec![])).unwrap();
        assert_eq!(generated.sql_text, "INSERT INTO \"log\" DEFAULT VALUES");
    }

    #[test]
    fn test_synthesized_names_skip_declared_ones() {
        let tree = CommandTree::update(
            "t",
            vec![SetClause::new("a", int(1)), SetClause::new("b", int(2))],
            vec![Predicate::eq("id", Operand::parameter("p0"))],
        )
        .with_parameter("p0", TypeUsage::default_for(PrimitiveKind::Int32));
        let generated = generate(&tree).unwrap();
        assert_eq!(generated.sql_text, "UPDATE \"t\" SET \"a\" = @p1, \"b\" = @p2 WHERE \"id\" = @p0");
        let names: Vec<_> = generated.parameters.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["p1", "p2"]);
    }

    #[test]
    fn test_update_requires_assignments() {
        let tree = CommandTree::update("t", vec![], vec![]);
        assert!(matches!(generate(&tree), Err(ProviderError::InvalidArgument(_))));
    }

    #[test]
    fn test_delete_filter_uses_parameters() {
        let tree = CommandTree::delete("t", vec![Predicate::eq("id", int(9))]);
        let generated = generate(&tree).unwrap();
        assert_eq!(generated.sql_text, "DELETE FROM \"t\" WHERE \"id\" = @p0");
        assert_eq!(generated.parameters.len(), 1);
    }

    #[test]
    fn test_undeclared_parameter_reference() {
        let tree = CommandTree::delete("t", vec![Predicate::eq("id", Operand::parameter("id"))]);
        assert!(matches!(generate(&tree), Err(ProviderError::InvalidArgument(_))));
    }

    #[test]
    fn test_parameter_reference_must_be_identifier() {
        let tree = CommandTree::delete("t", vec![Predicate::eq("id", Operand::parameter("id or 1=1"))])
            .with_parameter("id or 1=1", TypeUsage::default_for(PrimitiveKind::Int32));
        assert!(matches!(generate(&tree), Err(ProviderError::InvalidArgument(_))));
    }

    #[test]
    fn test_function_sql() {
        let routine = RoutineSignature::new("next_id").with_command_text("SELECT max(id) + 1 FROM t");
        let generated = generate(&CommandTree::function(routine)).unwrap();
        assert_eq!(generated.sql_text, "SELECT max(id) + 1 FROM t");
        assert_eq!(generated.command_type, CommandType::Text);

        let routine = RoutineSignature::new("archive").with_schema("main");
        let generated = generate(&CommandTree::function(routine)).unwrap();
        assert_eq!(generated.sql_text, "\"main\".\"archive\"");
        assert_eq!(generated.command_type, CommandType::StoredProcedure);
    }
}
