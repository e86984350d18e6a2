//! Startup configuration read from environment variables (or a `.env` file).
//!
//! The recognised keys mirror a classic database connection: host, port,
//! user, password and database. The embedded SQLite backend only needs the
//! database; the network settings are validated and carried so they show up
//! in logs, then ignored.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories::BaseDirs;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".school-records-manager";
/// SQLite file name stored inside the application data directory.
const DB_FILE_NAME: &str = "records.sqlite";
/// Log file name stored beside the default database.
const LOG_FILE_NAME: &str = "records.log";
/// Value of `RECORDS_DATABASE` that selects a throwaway in-memory store.
const IN_MEMORY: &str = ":memory:";

/// Where the records live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseTarget {
    File(PathBuf),
    InMemory,
}

impl fmt::Display for DatabaseTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseTarget::File(path) => write!(f, "{}", path.display()),
            DatabaseTarget::InMemory => write!(f, "{IN_MEMORY}"),
        }
    }
}

#[derive(Clone)]
pub struct StoreConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: DatabaseTarget,
    pub log_file: PathBuf,
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("database", &self.database)
            .field("log_file", &self.log_file)
            .finish()
    }
}

impl StoreConfig {
    /// Load from the process environment, reading `.env` first when present.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let data_dir = default_data_dir()?;
        Self::from_lookup(&data_dir, |key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup. Unset and blank values
    /// fall back to defaults rooted at `data_dir`.
    pub fn from_lookup<F>(data_dir: &Path, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
        };

        let port = value("RECORDS_PORT")
            .map(|raw| {
                raw.parse::<u16>()
                    .with_context(|| format!("RECORDS_PORT must be a port number, got '{raw}'"))
            })
            .transpose()?;

        let database = match value("RECORDS_DATABASE") {
            Some(raw) if raw == IN_MEMORY => DatabaseTarget::InMemory,
            Some(raw) => DatabaseTarget::File(PathBuf::from(raw)),
            None => DatabaseTarget::File(data_dir.join(DB_FILE_NAME)),
        };

        let log_file = value("RECORDS_LOG")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join(LOG_FILE_NAME));

        Ok(Self {
            host: value("RECORDS_HOST"),
            port,
            user: value("RECORDS_USER"),
            password: value("RECORDS_PASSWORD"),
            database,
            log_file,
        })
    }

    /// Whether any of the network-only options were supplied.
    pub fn has_network_options(&self) -> bool {
        self.host.is_some() || self.port.is_some() || self.user.is_some() || self.password.is_some()
    }
}

/// `~/.school-records-manager`, resolved per platform.
fn default_data_dir() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<StoreConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        StoreConfig::from_lookup(Path::new("/data"), |key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_live_in_the_data_dir() {
        let config = config_from(&[]).unwrap();
        assert_eq!(
            config.database,
            DatabaseTarget::File(PathBuf::from("/data/records.sqlite"))
        );
        assert_eq!(config.log_file, PathBuf::from("/data/records.log"));
        assert!(!config.has_network_options());
    }

    #[test]
    fn memory_target_and_network_options_are_recognised() {
        let config = config_from(&[
            ("RECORDS_DATABASE", ":memory:"),
            ("RECORDS_HOST", "localhost"),
            ("RECORDS_PORT", "5432"),
            ("RECORDS_USER", "admin"),
            ("RECORDS_PASSWORD", "secret"),
        ])
        .unwrap();

        assert_eq!(config.database, DatabaseTarget::InMemory);
        assert_eq!(config.port, Some(5432));
        assert!(config.has_network_options());
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn bad_port_is_an_error() {
        let err = config_from(&[("RECORDS_PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().contains("RECORDS_PORT"));
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = config_from(&[("RECORDS_DATABASE", "  "), ("RECORDS_HOST", "")]).unwrap();
        assert!(matches!(config.database, DatabaseTarget::File(_)));
        assert!(config.host.is_none());
    }
}
