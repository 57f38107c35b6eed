//! Compiles command trees into SQL text plus bound parameters.

use super::parameter::{create_parameter, BoundParameter, ParameterMode, ParameterValue};
use super::CommandTree;
use crate::core::{ProviderError, Result};
use crate::manifest::ProviderManifest;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, trace};

/// How the SQL text of a command is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandType {
    Text,
    StoredProcedure,
}

/// Output of a SQL generator.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedSql {
    pub sql_text: String,
    /// Parameters the generator synthesised itself (DML constants).
    pub parameters: Vec<BoundParameter>,
    pub command_type: CommandType,
}

/// Produces SQL text for a command tree.
pub trait SqlGenerator {
    fn generate(&self, manifest: &ProviderManifest, tree: &CommandTree) -> Result<GeneratedSql>;
}

impl<F> SqlGenerator for F
where
    F: Fn(&ProviderManifest, &CommandTree) -> Result<GeneratedSql>,
{
    fn generate(&self, manifest: &ProviderManifest, tree: &CommandTree) -> Result<GeneratedSql> {
        self(manifest, tree)
    }
}

/// A compiled command: SQL text, how to run it, and its parameters in order.
///
/// Holds no reference to the tree it was compiled from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledCommand {
    sql_text: String,
    command_type: CommandType,
    parameters: Vec<BoundParameter>,
}

impl CompiledCommand {
    pub fn sql_text(&self) -> &str {
        &self.sql_text
    }

    pub fn command_type(&self) -> CommandType {
        self.command_type
    }

    pub fn parameters(&self) -> &[BoundParameter] {
        &self.parameters
    }

    pub fn parameter(&self, name: &str) -> Option<&BoundParameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Replaces the placeholder value of a parameter.
    pub fn bind(&mut self, name: &str, value: ParameterValue) -> Result<()> {
        let parameter = self
            .parameters
            .iter_mut()
            .find(|p| p.name == name)
            .ok_or_else(|| {
                ProviderError::InvalidArgument(format!("Command has no parameter named '{}'", name))
            })?;
        parameter.value = value;
        Ok(())
    }
}

/// Compiles command trees with a given SQL generator.
#[derive(Debug, Clone)]
pub struct CommandCompiler<G> {
    manifest: ProviderManifest,
    generator: G,
}

impl<G: SqlGenerator> CommandCompiler<G> {
    pub fn new(manifest: ProviderManifest, generator: G) -> Self {
        CommandCompiler { manifest, generator }
    }

    pub fn manifest(&self) -> &ProviderManifest {
        &self.manifest
    }

    /// Compiles a tree into a standalone command.
    ///
    /// Each declared parameter takes its type and mode from the routine's
    /// formal parameter of the same name when the tree invokes a routine,
    /// otherwise from the tree's own declaration with mode `In`. Parameters
    /// synthesised by the generator follow, and are only legal for
    /// insert, update and delete trees.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` for duplicate or empty parameter names
    /// - `InvalidOperation` when the generator synthesised parameters for a query or function
    /// - any error raised by the generator, unchanged
    pub fn compile(&self, tree: &CommandTree) -> Result<CompiledCommand> {
        let kind = tree.kind();
        let generated = self.generator.generate(&self.manifest, tree)?;

        let mut seen = HashSet::with_capacity(tree.parameters.len());
        let mut parameters = Vec::with_capacity(tree.parameters.len() + generated.parameters.len());
        let function = tree.function_signature();

        for declared in &tree.parameters {
            if !seen.insert(declared.name.as_str()) {
                return Err(ProviderError::InvalidArgument(format!(
                    "Parameter '{}' is declared more than once",
                    declared.name
                )));
            }

            let parameter = match function.and_then(|f| f.parameter(&declared.name)) {
                Some(formal) => create_parameter(
                    &formal.name,
                    &formal.type_usage,
                    formal.mode,
                    ParameterValue::Null,
                )?,
                None => create_parameter(
                    &declared.name,
                    &declared.type_usage,
                    ParameterMode::In,
                    ParameterValue::Null,
                )?,
            };
            trace!(
                "Parameter {} -> {:?} {:?} size={:?}",
                parameter.name,
                parameter.direction,
                parameter.db_type,
                parameter.size
            );
            parameters.push(parameter);
        }

        if !generated.parameters.is_empty() {
            if !kind.permits_generated_parameters() {
                return Err(ProviderError::InvalidOperation(format!(
                    "SQL generation produced parameters for a {} command; generated parameters are only permitted for insert, update and delete",
                    kind
                )));
            }
            parameters.extend(generated.parameters);
        }

        debug!(
            "Compiled {} command ({:?}) with {} parameters",
            kind,
            generated.command_type,
            parameters.len()
        );

        Ok(CompiledCommand {
            sql_text: generated.sql_text,
            command_type: generated.command_type,
            parameters,
        })
    }
}
