use std::env;
use std::path::PathBuf;

/// Database configuration.
///
/// Reads from the `DIETA_DATABASE_URL` environment variable, falling back to
/// a SQLite file under the platform data directory when unset.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Full SQLite connection URL.
    pub database_url: String,
}

impl DbConfig {
    /// File name of the default database inside the data directory.
    pub const DEFAULT_FILE_NAME: &str = "dieta.db";

    /// URL scheme prefix for SQLite databases.
    const SCHEME: &str = "sqlite:";

    /// Build a config from the environment.
    ///
    /// Priority: `DIETA_DATABASE_URL` env var, then [`Self::default_url`].
    pub fn from_env() -> Self {
        let database_url = env::var("DIETA_DATABASE_URL").unwrap_or_else(|_| Self::default_url());
        Self { database_url }
    }

    /// Build a config from an explicit URL (useful for tests and CLI flags).
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
        }
    }

    /// Build a config pointing at a SQLite file on disk.
    pub fn for_path(path: impl Into<PathBuf>) -> Self {
        let path: PathBuf = path.into();
        Self::new(format!("sqlite://{}", path.display()))
    }

    /// The URL used when nothing else is configured:
    /// `sqlite://<data_dir>/dieta/dieta.db`.
    pub fn default_url() -> String {
        let dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("dieta");
        format!("sqlite://{}", dir.join(Self::DEFAULT_FILE_NAME).display())
    }

    /// Whether the URL names an in-memory database.
    pub fn is_in_memory(&self) -> bool {
        self.database_url.contains(":memory:") || self.database_url.contains("mode=memory")
    }

    /// Extract the database file path from the URL.
    ///
    /// Returns `None` for in-memory databases or URLs that are not SQLite.
    pub fn database_path(&self) -> Option<PathBuf> {
        if self.is_in_memory() {
            return None;
        }
        let rest = self.database_url.strip_prefix(Self::SCHEME)?;
        let rest = rest.strip_prefix("//").unwrap_or(rest);
        // Drop connection parameters such as `?mode=rwc`.
        let path = rest.split('?').next().filter(|s| !s.is_empty())?;
        Some(PathBuf::from(path))
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
