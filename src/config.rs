use crate::core::{ProviderError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Manifest token used when nothing else selects one.
pub const DEFAULT_MANIFEST_TOKEN: &str = "ISO8601";

/// Top-level configuration structure parsed from a TOML file.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    pub provider: Option<ProviderConfig>,
    pub logging: Option<LoggingConfig>,
}

/// Provider-related configuration.
#[derive(Debug, Default, Deserialize)]
pub struct ProviderConfig {
    /// `Ticks` or `ISO8601`
    pub date_time_format: Option<String>,
    /// ADO-style `key=value;` pairs; only `DateTimeFormat` is read
    pub connection_string: Option<String>,
}

/// Logging configuration.
#[derive(Debug, Default, Deserialize)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive, e.g. `sqlite_provider=debug`
    pub filter: Option<String>,
}

impl Config {
    /// Manifest token selected by this configuration.
    ///
    /// An explicit `date_time_format` wins, then the connection string's
    /// `DateTimeFormat` key, then [`DEFAULT_MANIFEST_TOKEN`].
    pub fn manifest_token(&self) -> String {
        let provider = self.provider.as_ref();
        provider
            .and_then(|p| p.date_time_format.clone())
            .or_else(|| {
                provider
                    .and_then(|p| p.connection_string.as_deref())
                    .and_then(|cs| connection_string_value(cs, "DateTimeFormat"))
            })
            .unwrap_or_else(|| DEFAULT_MANIFEST_TOKEN.to_string())
    }

    pub fn log_filter(&self) -> Option<&str> {
        self.logging.as_ref().and_then(|l| l.filter.as_deref())
    }
}

/// Value of `key` in a `key=value;key=value` connection string, matched case-insensitively.
pub fn connection_string_value(connection_string: &str, key: &str) -> Option<String> {
    connection_string
        .split(';')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| k.trim().eq_ignore_ascii_case(key))
        .map(|(_, v)| v.trim().to_string())
}

/// Loads configuration from a TOML file at the given path.
///
/// # Example
///
/// ```no_run
/// let config = sqlite_provider::config::load_config("config.toml").expect("Failed to load config");
/// println!("{}", config.manifest_token());
/// ```
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = fs::read_to_string(path)?;
    toml::from_str(&content).map_err(|e| ProviderError::Config(e.to_string()))
}

/// `<config dir>/sqlite-provider/config.toml`, if the platform has a config directory.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("sqlite-provider").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE_CONFIG: &str = r#"
[provider]
date_time_format = "Ticks"
connection_string = "Data Source=app.db;DateTimeFormat=ISO8601"

[logging]
filter = "sqlite_provider=debug"
"#;

    #[test]
    fn test_load_config_from_str() {
        let config: Config = toml::from_str(SAMPLE_CONFIG).expect("Failed to parse sample config");
        assert_eq!(config.manifest_token(), "Ticks");
        assert_eq!(config.log_filter(), Some("sqlite_provider=debug"));
    }

    #[test]
    fn test_token_from_connection_string() {
        let config: Config = toml::from_str(
            r#"
[provider]
connection_string = "Data Source=app.db; datetimeformat = Ticks ;"
"#,
        )
        .unwrap();
        assert_eq!(config.manifest_token(), "Ticks");
    }

    #[test]
    fn test_default_token() {
        assert_eq!(Config::default().manifest_token(), DEFAULT_MANIFEST_TOKEN);
        assert_eq!(Config::default().log_filter(), None);
    }

    #[test]
    fn test_load_config_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SAMPLE_CONFIG.as_bytes()).unwrap();
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.manifest_token(), "Ticks");
    }

    #[test]
    fn test_load_config_errors() {
        assert!(matches!(
            load_config("/definitely/not/here.toml"),
            Err(ProviderError::Io(_))
        ));

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"[provider\n").unwrap();
        assert!(matches!(load_config(file.path()), Err(ProviderError::Config(_))));
    }

    #[test]
    fn test_default_config_path() {
        if let Some(path) = default_config_path() {
            assert!(path.ends_with("sqlite-provider/config.toml"));
        }
    }
}
