/// Command Module
///
/// This module turns abstract command trees into SQLite commands.
///
/// ## Architecture
///
/// - **Command trees** (this file): the engine-neutral description of a query,
///   insert, update, delete or routine invocation, with its declared parameters
/// - **Parameters** (`parameter.rs`): derivation of bound parameters from conceptual types
/// - **Compiler** (`compiler.rs`): SQL text plus the ordered, fully-typed parameter list
/// - **SQLite generator** (`sqlite_sql.rs`): the built-in SQL text generator
pub mod compiler;
pub mod parameter;
pub mod sqlite_sql;

pub use compiler::{CommandCompiler, CommandType, CompiledCommand, GeneratedSql, SqlGenerator};
pub use parameter::{
    create_parameter, validate_parameter_name, BoundParameter, DbType, ParameterDirection,
    ParameterMode, ParameterValue, MAX_PARAMETER_SIZE,
};
pub use sqlite_sql::SqliteSqlGenerator;

use crate::types::TypeUsage;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A parameter declared by a command tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub type_usage: TypeUsage,
}

/// A formal parameter of a stored routine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub type_usage: TypeUsage,
    pub mode: ParameterMode,
}

/// Declared signature of a stored routine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutineSignature {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    /// SQL the routine expands to, when it is defined by command text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_text: Option<String>,
    #[serde(default)]
    pub parameters: Vec<FunctionParameter>,
}

impl RoutineSignature {
    pub fn new(name: impl Into<String>) -> Self {
        RoutineSignature {
            name: name.into(),
            schema: None,
            command_text: None,
            parameters: Vec::new(),
        }
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn with_command_text(mut self, command_text: impl Into<String>) -> Self {
        self.command_text = Some(command_text.into());
        self
    }

    pub fn with_parameter(
        mut self,
        name: impl Into<String>,
        type_usage: TypeUsage,
        mode: ParameterMode,
    ) -> Self {
        self.parameters.push(FunctionParameter {
            name: name.into(),
            type_usage,
            mode,
        });
        self
    }

    /// Formal parameter with exactly this name.
    pub fn parameter(&self, name: &str) -> Option<&FunctionParameter> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

/// Right-hand side of an assignment or comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operand {
    /// Reference to a parameter declared by the tree
    Parameter(String),
    /// Literal value with its conceptual type
    Constant {
        value: ParameterValue,
        #[serde(rename = "type")]
        type_usage: TypeUsage,
    },
    Null,
}

impl Operand {
    pub fn parameter(name: impl Into<String>) -> Self {
        Operand::Parameter(name.into())
    }

    pub fn constant(value: ParameterValue, type_usage: TypeUsage) -> Self {
        Operand::Constant { value, type_usage }
    }
}

/// `column = operand` in an INSERT or UPDATE.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetClause {
    pub column: String,
    pub value: Operand,
}

/// `column = operand` (or `column IS NULL`) in a WHERE clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
    pub column: String,
    pub value: Operand,
}

impl SetClause {
    pub fn new(column: impl Into<String>, value: Operand) -> Self {
        SetClause {
            column: column.into(),
            value,
        }
    }
}

impl Predicate {
    pub fn eq(column: impl Into<String>, value: Operand) -> Self {
        Predicate {
            column: column.into(),
            value,
        }
    }
}

/// What a command tree does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CommandBody {
    Query {
        table: String,
        #[serde(default)]
        columns: Vec<String>,
        #[serde(default)]
        filter: Vec<Predicate>,
    },
    Insert {
        table: String,
        #[serde(default)]
        values: Vec<SetClause>,
    },
    Update {
        table: String,
        values: Vec<SetClause>,
        #[serde(default)]
        filter: Vec<Predicate>,
    },
    Delete {
        table: String,
        #[serde(default)]
        filter: Vec<Predicate>,
    },
    Function {
        routine: RoutineSignature,
    },
}

/// Discriminant of a [`CommandBody`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandTreeKind {
    Query,
    Insert,
    Update,
    Delete,
    Function,
}

impl CommandTreeKind {
    /// Only data-modification trees may carry parameters synthesised by the SQL generator.
    pub fn permits_generated_parameters(&self) -> bool {
        matches!(
            self,
            CommandTreeKind::Insert | CommandTreeKind::Update | CommandTreeKind::Delete
        )
    }
}

impl fmt::Display for CommandTreeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CommandTreeKind::Query => "query",
            CommandTreeKind::Insert => "insert",
            CommandTreeKind::Update => "update",
            CommandTreeKind::Delete => "delete",
            CommandTreeKind::Function => "function",
        };
        f.write_str(name)
    }
}

/// An abstract command: a body plus the parameters it declares, in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandTree {
    #[serde(default)]
    pub parameters: Vec<QueryParameter>,
    pub body: CommandBody,
}

impl CommandTree {
    pub fn new(body: CommandBody) -> Self {
        CommandTree {
            parameters: Vec::new(),
            body,
        }
    }

    pub fn query(table: impl Into<String>) -> Self {
        Self::new(CommandBody::Query {
            table: table.into(),
            columns: Vec::new(),
            filter: Vec::new(),
        })
    }

    pub fn insert(table: impl Into<String>, values: Vec<SetClause>) -> Self {
        Self::new(CommandBody::Insert {
            table: table.into(),
            values,
        })
    }

    pub fn update(table: impl Into<String>, values: Vec<SetClause>, filter: Vec<Predicate>) -> Self {
        Self::new(CommandBody::Update {
            table: table.into(),
            values,
            filter,
        })
    }

    pub fn delete(table: impl Into<String>, filter: Vec<Predicate>) -> Self {
        Self::new(CommandBody::Delete {
            table: table.into(),
            filter,
        })
    }

    pub fn function(routine: RoutineSignature) -> Self {
        Self::new(CommandBody::Function { routine })
    }

    /// Declares a parameter; declaration order is preserved.
    pub fn with_parameter(mut self, name: impl Into<String>, type_usage: TypeUsage) -> Self {
        self.parameters.push(QueryParameter {
            name: name.into(),
            type_usage,
        });
        self
    }

    pub fn kind(&self) -> CommandTreeKind {
        match &self.body {
            CommandBody::Query { .. } => CommandTreeKind::Query,
            CommandBody::Insert { .. } => CommandTreeKind::Insert,
            CommandBody::Update { .. } => CommandTreeKind::Update,
            CommandBody::Delete { .. } => CommandTreeKind::Delete,
            CommandBody::Function { .. } => CommandTreeKind::Function,
        }
    }

    /// Target routine of a function tree.
    pub fn function_signature(&self) -> Option<&RoutineSignature> {
        match &self.body {
            CommandBody::Function { routine } => Some(routine),
            _ => None,
        }
    }

    pub fn parameter(&self, name: &str) -> Option<&QueryParameter> {
        self.parameters.iter().find(|p| p.name == name)
    }
}
