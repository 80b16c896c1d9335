//! Configuration file management for tripplan.
//!
//! Provides a TOML-based config file at `~/.config/tripplan/config.toml` and a
//! resolution chain: CLI flag > env var > config file > default.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use tripplan_core::llm::LlmCredentials;
use tripplan_core::llm::http::DEFAULT_TIMEOUT;
use tripplan_db::config::DbConfig;

pub const ENV_LLM_ENDPOINT: &str = "TRIPPLAN_LLM_ENDPOINT";
pub const ENV_LLM_API_KEY: &str = "TRIPPLAN_LLM_API_KEY";
pub const ENV_LLM_MODEL: &str = "TRIPPLAN_LLM_MODEL";
pub const ENV_LLM_AZURE: &str = "TRIPPLAN_LLM_AZURE";

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub database: DatabaseSection,
    #[serde(default)]
    pub llm: LlmSection,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct DatabaseSection {
    pub url: String,
}

/// `[llm]` section. Every key is optional; missing credentials surface as a
/// configuration error only when a generation is attempted.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LlmSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the tripplan config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/tripplan` or
/// `~/.config/tripplan`, on macOS too.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("tripplan");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("tripplan")
}

/// Return the path to the tripplan config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. A missing file is `None`; a file that
/// exists but cannot be read or parsed is an error.
pub fn load_config() -> Result<Option<ConfigFile>> {
    let path = config_path();
    let contents = match std::fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(e)
                .with_context(|| format!("failed to read config file at {}", path.display()));
        }
    };
    toml::from_str(&contents)
        .map(Some)
        .with_context(|| format!("failed to parse config file at {}", path.display()))
}

/// Serialize and write the config file, creating parent dirs as needed.
/// Sets file permissions to 0600 on Unix, since it may hold an API key.
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
pub struct TripplanConfig {
    pub db_config: DbConfig,
    pub credentials: LlmCredentials,
    pub llm_timeout: Duration,
}

impl TripplanConfig {
    /// Resolve configuration using the chain: CLI flag > env var > config file > default.
    ///
    /// - DB URL: `cli_db_url` > `TRIPPLAN_DATABASE_URL` > `database.url` > `DbConfig::DEFAULT_URL`
    /// - LLM endpoint, key, model, azure: `TRIPPLAN_LLM_*` > `[llm]` > unset
    /// - LLM timeout: `llm.timeout_secs` > 120 s
    pub fn resolve(cli_db_url: Option<&str>) -> Result<Self> {
        Self::resolve_with(cli_db_url, load_config()?)
    }

    fn resolve_with(cli_db_url: Option<&str>, file_config: Option<ConfigFile>) -> Result<Self> {
        let file_config = file_config.unwrap_or_default();

        let db_url = if let Some(url) = cli_db_url {
            url.to_string()
        } else if let Ok(url) = std::env::var(DbConfig::ENV_VAR) {
            url
        } else if !file_config.database.url.trim().is_empty() {
            file_config.database.url.clone()
        } else {
            DbConfig::DEFAULT_URL.to_string()
        };

        let llm = file_config.llm;
        let azure = match std::env::var(ENV_LLM_AZURE).ok() {
            Some(raw) => {
                Some(parse_bool(&raw).with_context(|| format!("invalid {ENV_LLM_AZURE}"))?)
            }
            None => llm.azure,
        };

        let credentials = LlmCredentials {
            endpoint: env_or(ENV_LLM_ENDPOINT, llm.endpoint).unwrap_or_default(),
            api_key: env_or(ENV_LLM_API_KEY, llm.api_key).unwrap_or_default(),
            model: env_or(ENV_LLM_MODEL, llm.model),
            azure,
        };

        let llm_timeout = match llm.timeout_secs {
            Some(0) => bail!("llm.timeout_secs must be greater than zero"),
            Some(secs) => Duration::from_secs(secs),
            None => DEFAULT_TIMEOUT,
        };

        Ok(Self {
            db_config: DbConfig::new(db_url),
            credentials,
            llm_timeout,
        })
    }
}

fn env_or(var: &str, fallback: Option<String>) -> Option<String> {
    std::env::var(var).ok().or(fallback)
}

fn parse_bool(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("expected true or false, got {other:?}"),
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
