//! Configuration loading and root folder resolution
//!
//! Two tiers:
//! 1. **TOML bootstrap**: bind address, port, auth switch, session lifetime, logging
//! 2. **Root folder**: where `educafric.db` lives
//!
//! Root folder priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`EDUCAFRIC_ROOT_FOLDER`)
//! 3. TOML config file (`root_folder`)
//! 4. OS-dependent compiled default (fallback)
//!
//! Missing or malformed TOML files never stop startup: a warning is logged
//! and built-in defaults are used.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "EDUCAFRIC_ROOT_FOLDER";

/// Database file name inside the root folder
pub const DATABASE_FILE_NAME: &str = "educafric.db";

/// Bootstrap configuration loaded from TOML file
///
/// These settings cannot change during runtime.
#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    /// Root folder holding the database (optional)
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// Address the HTTP server binds to
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Require a session cookie on user-scoped routes
    ///
    /// `false` gives every request an unrestricted context (local tooling only).
    #[serde(default = "default_require_auth")]
    pub require_auth: bool,

    /// Session lifetime in hours
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: i64,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            root_folder: None,
            bind_address: default_bind_address(),
            port: default_port(),
            require_auth: default_require_auth(),
            session_ttl_hours: default_session_ttl_hours(),
            logging: LoggingConfig::default(),
        }
    }
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5730
}

fn default_require_auth() -> bool {
    true
}

/// Longest accepted session lifetime (one year)
pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 366;

fn default_session_ttl_hours() -> i64 {
    24
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TomlConfig {
    /// Parse a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: TomlConfig = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;

        if !(1..=MAX_SESSION_TTL_HOURS).contains(&config.session_ttl_hours) {
            return Err(Error::Config(format!(
                "{}: session_ttl_hours must be between 1 and {} (got {})",
                path.display(),
                MAX_SESSION_TTL_HOURS,
                config.session_ttl_hours
            )));
        }

        Ok(config)
    }

    /// Load config from an explicit path or the platform config location
    ///
    /// Never fails: any problem logs a warning and yields defaults.
    pub fn load_or_default(explicit_path: Option<&Path>) -> Self {
        let path = match explicit_path {
            Some(path) => path.to_path_buf(),
            None => match find_config_file() {
                Some(path) => path,
                None => {
                    info!("No config file found, using built-in defaults");
                    return Self::default();
                }
            },
        };

        match Self::from_file(&path) {
            Ok(config) => {
                info!("Loaded config file: {}", path.display());
                config
            }
            Err(e) => {
                warn!("Ignoring config file ({}), using built-in defaults", e);
                Self::default()
            }
        }
    }
}

/// Resolve the root folder following the documented priority order
pub fn resolve_root_folder(cli_arg: Option<&Path>, toml_config: &TomlConfig) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Some(path) = &toml_config.root_folder {
        return path.clone();
    }

    // Priority 4: OS-dependent compiled default
    default_root_folder()
}

/// Create the root folder if missing and return the database path inside it
pub fn prepare_root_folder(root_folder: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(root_folder)?;
    Ok(root_folder.join(DATABASE_FILE_NAME))
}

/// Locate the platform config file, user config taking precedence
fn find_config_file() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("educafric").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/educafric/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Get OS-dependent default root folder path
pub fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/educafric (or /var/lib/educafric for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join("educafric"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/educafric"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("educafric"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/educafric"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("educafric"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\educafric"))
    } else {
        PathBuf::from("./educafric_data")
    }
}
