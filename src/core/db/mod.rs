/// Database Module
///
/// Runs compiled commands against SQLite and introspects table columns.
///
/// ## Architecture
///
/// - **Command Execution** (`command.rs`): binds compiled parameters by name and runs the statement
/// - **Schema Introspection** (`schema.rs`): maps declared column types to conceptual types
///
/// ## Error Handling
///
/// SQLite failures surface as `ProviderError::Database`.
pub mod command;
pub mod schema;

pub use command::*;
pub use schema::*;
