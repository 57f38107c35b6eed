use rusqlite::{Connection, OpenFlags};
use sqlite_provider::command::{CommandCompiler, CommandTree, SqliteSqlGenerator};
use sqlite_provider::config::{self, Config};
use sqlite_provider::core::db::column_types;
use sqlite_provider::manifest::ProviderManifest;
use sqlite_provider::types::{FacetSet, PrimitiveKind, StoreTypeUsage, TypeUsage};
use sqlite_provider::{ProviderError, Result};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "\
usage: sqlite-provider [--config PATH] <command>

commands:
  store-type <Kind> [facet=value ...]         store type for a conceptual type
  conceptual-type <store-type> [facet=value ...]  conceptual type for a store type
  compile <plan.toml>                         compile a command tree
  columns <db-path> <table>                   conceptual types of a table's columns";

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(args) {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Vec<String>) -> Result<String> {
    let (config_path, args) = split_config_flag(args)?;
    let config = load_config(config_path)?;
    init_logging(&config);

    let manifest = ProviderManifest::new(&config.manifest_token())?;
    info!("Using manifest token {}", manifest.token());

    let (command, rest) = match args.split_first() {
        Some((command, rest)) => (command.as_str(), rest),
        None => return Ok(USAGE.to_string()),
    };

    match (command, rest) {
        ("store-type", [kind, facets @ ..]) => {
            let kind: PrimitiveKind = kind.parse()?;
            let usage = TypeUsage::new(kind, parse_facets(FacetSet::default(), facets)?)?;
            let store_type = manifest.store_type_for(&usage)?;
            Ok(serde_json::to_string_pretty(&store_type)?)
        }
        ("conceptual-type", [name, facets @ ..]) => {
            let parsed = StoreTypeUsage::parse(name)?;
            let store_type = StoreTypeUsage::new(parsed.name, parse_facets(parsed.facets, facets)?);
            let usage = manifest.conceptual_type_for(&store_type)?;
            Ok(serde_json::to_string_pretty(&usage)?)
        }
        ("compile", [plan]) => {
            let tree: CommandTree = toml::from_str(&fs::read_to_string(plan)?)?;
            let compiler = CommandCompiler::new(manifest, SqliteSqlGenerator);
            let command = compiler.compile(&tree)?;
            Ok(serde_json::to_string_pretty(&command)?)
        }
        ("columns", [db_path, table]) => {
            let conn = Connection::open_with_flags(db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
            let columns = column_types(&conn, &manifest, table)?;
            Ok(serde_json::to_string_pretty(&columns)?)
        }
        ("help" | "--help" | "-h", _) => Ok(USAGE.to_string()),
        _ => Err(ProviderError::InvalidArgument(format!(
            "unrecognised command line\n{}",
            USAGE
        ))),
    }
}

/// Removes `--config PATH` (or `--config=PATH`) from the arguments.
fn split_config_flag(args: Vec<String>) -> Result<(Option<PathBuf>, Vec<String>)> {
    let mut config_path = None;
    let mut rest = Vec::with_capacity(args.len());
    let mut iter = args.into_iter();

    while let Some(arg) = iter.next() {
        if arg == "--config" {
            let path = iter.next().ok_or_else(|| {
                ProviderError::InvalidArgument("--config requires a path".to_string())
            })?;
            config_path = Some(PathBuf::from(path));
        } else if let Some(path) = arg.strip_prefix("--config=") {
            config_path = Some(PathBuf::from(path));
        } else {
            rest.push(arg);
        }
    }
    Ok((config_path, rest))
}

fn load_config(explicit: Option<PathBuf>) -> Result<Config> {
    if let Some(path) = explicit {
        return config::load_config(path);
    }
    match config::default_config_path() {
        Some(path) if path.is_file() => config::load_config(path),
        _ => Ok(Config::default()),
    }
}

fn parse_facets(mut facets: FacetSet, assignments: &[String]) -> Result<FacetSet> {
    for assignment in assignments {
        facets.apply(assignment)?;
    }
    debug!("Parsed facets {:?}", facets);
    Ok(facets)
}

fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_filter().unwrap_or("warn")))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
