//! Runtime configuration for the Bear MCP server.
//!
//! The only user-tunable setting is the location of Bear's database. It is
//! normally taken from `DB_ROUTE`, and the `--db` flag overrides it. Everything
//! else falls back to the documented defaults.

use std::env;
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::error::{BearError, Result};

/// Environment variable that overrides the database location.
pub const STORE_PATH_ENV: &str = "DB_ROUTE";

/// Program used to hand `bear://` URLs to the operating system.
pub const DEFAULT_LAUNCHER: &str = "open";

const BEAR_GROUP_CONTAINER: &str = "9K33E3U3T4.net.shinyfrog.bear";

#[derive(Debug, Clone)]
pub struct Config {
    /// Explicit database path. `None` means use Bear's default location.
    pub store_path: Option<PathBuf>,
    /// Command that opens x-callback URLs.
    pub launcher: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: None,
            launcher: DEFAULT_LAUNCHER.to_string(),
        }
    }
}

impl Config {
    /// Build a config from the process environment.
    pub fn from_env() -> Self {
        Self::default().with_store_path(env::var_os(STORE_PATH_ENV).map(PathBuf::from))
    }

    /// Override the database path. Empty paths are ignored.
    pub fn with_store_path(mut self, path: Option<PathBuf>) -> Self {
        if let Some(path) = path.filter(|p| !p.as_os_str().is_empty()) {
            self.store_path = Some(path);
        }
        self
    }

    /// The database path in effect: the override when set, otherwise Bear's
    /// default location under the user's group containers.
    pub fn resolve_store_path(&self) -> Result<PathBuf> {
        if let Some(ref path) = self.store_path {
            return Ok(path.clone());
        }
        default_store_path()
    }

    /// Resolve the database path and make sure it can be read.
    ///
    /// Called once at startup so that a missing or unreadable database is
    /// reported before any operation is accepted.
    pub fn verify_store(&self) -> Result<PathBuf> {
        let path = self.resolve_store_path()?;
        check_readable(&path)?;
        Ok(path)
    }
}

/// Bear's database location on macOS.
pub fn default_store_path() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| {
        BearError::StoreUnavailable("Could not determine the home directory".to_string())
    })?;
    Ok(home
        .join("Library")
        .join("Group Containers")
        .join(BEAR_GROUP_CONTAINER)
        .join("Application Data")
        .join("database.sqlite"))
}

fn check_readable(path: &Path) -> Result<()> {
    if !path.is_file() {
        return Err(BearError::StoreUnavailable(format!(
            "{} does not exist or is not a file",
            path.display()
        )));
    }
    File::open(path).map_err(|e| {
        BearError::StoreUnavailable(format!("{} is not readable: {}", path.display(), e))
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.store_path.is_none());
        assert_eq!(config.launcher, "open");
    }

    #[test]
    fn test_default_path_points_into_group_container() {
        let path = Config::default().resolve_store_path().unwrap();
        let display = path.to_string_lossy();
        assert!(display.contains("9K33E3U3T4.net.shinyfrog.bear"));
        assert!(display.ends_with("database.sqlite"));
    }

    #[test]
    fn test_override_wins() {
        let config = Config::default().with_store_path(Some(PathBuf::from("/tmp/bear.sqlite")));
        assert_eq!(
            config.resolve_store_path().unwrap(),
            PathBuf::from("/tmp/bear.sqlite")
        );
    }

    #[test]
    fn test_empty_override_is_ignored() {
        let config = Config::default().with_store_path(Some(PathBuf::new()));
        assert!(config.store_path.is_none());
    }

    #[test]
    fn test_verify_missing_store_fails_fast() {
        let tmp = TempDir::new().unwrap();
        let config =
            Config::default().with_store_path(Some(tmp.path().join("missing.sqlite")));
        let err = config.verify_store().unwrap_err();
        assert!(matches!(err, BearError::StoreUnavailable(_)));
    }

    #[test]
    fn test_verify_directory_fails() {
        let tmp = TempDir::new().unwrap();
        let config = Config::default().with_store_path(Some(tmp.path().to_path_buf()));
        assert!(matches!(
            config.verify_store(),
            Err(BearError::StoreUnavailable(_))
        ));
    }

    #[test]
    fn test_verify_existing_store() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("database.sqlite");
        std::fs::write(&path, b"").unwrap();
        let config = Config::default().with_store_path(Some(path.clone()));
        assert_eq!(config.verify_store().unwrap(), path);
    }
}
