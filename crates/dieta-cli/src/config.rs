//! Configuration file management for dieta.
//!
//! Provides a TOML-based config file at `~/.config/dieta/config.toml` and a
//! resolution chain: CLI flag > env var > config file > default.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use dieta_db::config::DbConfig;

/// Generation service used when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:3333";

/// Transport timeout for a single generation request.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigFile {
    pub api: ApiSection,
    pub database: DatabaseSection,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiSection {
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseSection {
    pub url: String,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the dieta config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/dieta` or `~/.config/dieta`.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("dieta");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("dieta")
}

/// Return the path to the dieta config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. Returns an error if it does not exist.
pub fn load_config() -> Result<ConfigFile> {
    let path = config_path();
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents).context("failed to parse config file")?;
    Ok(config)
}

/// Serialize and write the config file, creating parent dirs as needed.
/// Sets file permissions to 0600 on Unix.
pub fn save_config(config: &ConfigFile) -> Result<()> {
    let path = config_path();
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(&path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct DietaConfig {
    pub db_config: DbConfig,
    pub api_url: String,
    pub timeout: Duration,
}

impl DietaConfig {
    /// Resolve configuration using the chain: CLI flag > env var > config file > default.
    ///
    /// - DB URL: `cli_db_url` > `DIETA_DATABASE_URL` env > `database.url` > [`DbConfig::default_url`]
    /// - API URL: `cli_api_url` > `DIETA_API_URL` env > `api.base_url` > [`DEFAULT_API_URL`]
    /// - Timeout: `api.timeout_secs` > [`DEFAULT_TIMEOUT_SECS`]; zero means unset
    pub fn resolve(cli_db_url: Option<&str>, cli_api_url: Option<&str>) -> Self {
        let file_config = load_config().ok();

        let db_url = if let Some(url) = cli_db_url {
            url.to_string()
        } else if let Ok(url) = std::env::var("DIETA_DATABASE_URL") {
            url
        } else if let Some(ref cfg) = file_config {
            cfg.database.url.clone()
        } else {
            DbConfig::default_url()
        };

        let api_url = if let Some(url) = cli_api_url {
            url.to_string()
        } else if let Ok(url) = std::env::var("DIETA_API_URL") {
            url
        } else if let Some(ref cfg) = file_config {
            cfg.api.base_url.clone()
        } else {
            DEFAULT_API_URL.to_string()
        };

        let timeout_secs = file_config
            .as_ref()
            .map(|cfg| cfg.api.timeout_secs)
            .filter(|&secs| secs > 0)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Self {
            db_config: DbConfig::new(db_url),
            api_url,
            timeout: Duration::from_secs(timeout_secs),
        }
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    /// Point the config directory at an empty temp dir and clear overrides.
    fn isolated_env() -> TempDir {
        let tmp = TempDir::new().unwrap();
        unsafe { std::env::set_var("XDG_CONFIG_HOME", tmp.path()) };
        unsafe { std::env::remove_var("DIETA_DATABASE_URL") };
        unsafe { std::env::remove_var("DIETA_API_URL") };
        tmp
    }

    fn sample_file() -> ConfigFile {
        ConfigFile {
            api: ApiSection {
                base_url: "http://file:3333".to_string(),
                timeout_secs: 15,
            },
            database: DatabaseSection {
                url: "sqlite:///tmp/file.db".to_string(),
            },
        }
    }

    #[test]
    fn save_and_load_config_roundtrip() {
        let _lock = crate::test_util::lock_env();
        let _tmp = isolated_env();

        save_config(&sample_file()).unwrap();
        let loaded = load_config().unwrap();

        assert_eq!(loaded.api.base_url, "http://file:3333");
        assert_eq!(loaded.api.timeout_secs, 15);
        assert_eq!(loaded.database.url, "sqlite:///tmp/file.db");
    }

    #[cfg(unix)]
    #[test]
    fn save_config_sets_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let _lock = crate::test_util::lock_env();
        let _tmp = isolated_env();

        save_config(&sample_file()).unwrap();

        let meta = std::fs::metadata(config_path()).unwrap();
        assert_eq!(meta.permissions().mode() & 0o777, 0o600);
    }

    #[test]
    fn timeout_defaults_when_omitted_from_file() {
        let parsed: ConfigFile = toml::from_str(
            r#"
[api]
base_url = "http://x"

[database]
url = "sqlite://x.db"
"#,
        )
        .unwrap();
        assert_eq!(parsed.api.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn resolve_defaults_when_nothing_set() {
        let _lock = crate::test_util::lock_env();
        let _tmp = isolated_env();

        let config = DietaConfig::resolve(None, None);
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.db_config.database_url, DbConfig::default_url());
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn resolve_reads_config_file() {
        let _lock = crate::test_util::lock_env();
        let _tmp = isolated_env();
        save_config(&sample_file()).unwrap();

        let config = DietaConfig::resolve(None, None);
        assert_eq!(config.api_url, "http://file:3333");
        assert_eq!(config.db_config.database_url, "sqlite:///tmp/file.db");
        assert_eq!(config.timeout, Duration::from_secs(15));
    }

    #[test]
    fn resolve_treats_zero_timeout_as_default() {
        let _lock = crate::test_util::lock_env();
        let _tmp = isolated_env();
        let mut file = sample_file();
        file.api.timeout_secs = 0;
        save_config(&file).unwrap();

        let config = DietaConfig::resolve(None, None);
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(config.api_url, "http://file:3333");
    }

    #[test]
    fn resolve_with_env_var_overrides_config_file() {
        let _lock = crate::test_util::lock_env();
        let _tmp = isolated_env();
        save_config(&sample_file()).unwrap();

        unsafe { std::env::set_var("DIETA_API_URL", "http://env:3333") };
        unsafe { std::env::set_var("DIETA_DATABASE_URL", "sqlite:///tmp/env.db") };

        let config = DietaConfig::resolve(None, None);

        unsafe { std::env::remove_var("DIETA_API_URL") };
        unsafe { std::env::remove_var("DIETA_DATABASE_URL") };

        assert_eq!(config.api_url, "http://env:3333");
        assert_eq!(config.db_config.database_url, "sqlite:///tmp/env.db");
    }

    #[test]
    fn resolve_with_cli_flag_overrides_all() {
        let _lock = crate::test_util::lock_env();
        let _tmp = isolated_env();
        save_config(&sample_file()).unwrap();

        unsafe { std::env::set_var("DIETA_API_URL", "http://env:3333") };
        unsafe { std::env::set_var("DIETA_DATABASE_URL", "sqlite:///tmp/env.db") };

        let config = DietaConfig::resolve(Some("sqlite:///tmp/cli.db"), Some("http://cli:3333"));

        unsafe { std::env::remove_var("DIETA_API_URL") };
        unsafe { std::env::remove_var("DIETA_DATABASE_URL") };

        assert_eq!(config.api_url, "http://cli:3333");
        assert_eq!(config.db_config.database_url, "sqlite:///tmp/cli.db");
    }

    #[test]
    fn config_path_ends_with_expected_filename() {
        let path = config_path();
        assert!(
            path.ends_with("dieta/config.toml"),
            "unexpected config path: {}",
            path.display()
        );
    }
}
