//! TOML configuration loading and validation.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use vsebook::GameId;
use vsebook_broker::marketwatch::urls::{DEFAULT_BASE_URL, DEFAULT_ID_URL, Endpoints};

use crate::error::{Error, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub session: SessionConfig,
    pub game: GameConfig,
    #[serde(default)]
    pub endpoints: EndpointsConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Login settings. The password itself is never stored in the file.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub username: String,
    /// Environment variable holding the password.
    #[serde(default = "default_password_env")]
    pub password_env: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_password_env() -> String {
    "VSE_PASSWORD".into()
}
fn default_timeout() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize)]
pub struct GameConfig {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EndpointsConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_id_url")]
    pub id_url: String,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            id_url: default_id_url(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.into()
}
fn default_id_url() -> String {
    DEFAULT_ID_URL.into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionConfig {
    /// Pause between consecutive order submissions.
    #[serde(default = "default_interval")]
    pub order_interval_ms: u64,
    #[serde(default = "default_max_orders")]
    pub max_orders_per_run: usize,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            order_interval_ms: default_interval(),
            max_orders_per_run: default_max_orders(),
        }
    }
}

fn default_interval() -> u64 {
    5000
}
fn default_max_orders() -> usize {
    50
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_dir")]
    pub dir: String,
    #[serde(default = "default_audit_file")]
    pub audit_file: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: default_log_dir(),
            audit_file: default_audit_file(),
        }
    }
}

fn default_log_dir() -> String {
    "./logs".into()
}
fn default_audit_file() -> String {
    "audit.jsonl".into()
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml(&contents)
    }

    /// Parse and validate a TOML string.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate config invariants.
    fn validate(&self) -> Result<()> {
        if self.session.username.trim().is_empty() {
            return Err(Error::Config("session.username must not be empty".into()));
        }
        if self.session.password_env.trim().is_empty() {
            return Err(Error::Config("session.password_env must not be empty".into()));
        }
        if self.session.timeout_secs == 0 {
            return Err(Error::Config("session.timeout_secs must be > 0".into()));
        }
        if self.game.id.trim().is_empty() {
            return Err(Error::Config("game.id must not be empty".into()));
        }
        for (key, url) in [
            ("endpoints.base_url", &self.endpoints.base_url),
            ("endpoints.id_url", &self.endpoints.id_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(Error::Config(format!("{key} must be an http(s) URL, got {url:?}")));
            }
        }
        if self.execution.max_orders_per_run == 0 {
            return Err(Error::Config("execution.max_orders_per_run must be > 0".into()));
        }
        Ok(())
    }

    pub fn game_id(&self) -> GameId {
        GameId::new(self.game.id.trim())
    }

    pub fn endpoints(&self) -> Endpoints {
        Endpoints::new(&self.endpoints.base_url, &self.endpoints.id_url)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.session.timeout_secs)
    }

    pub fn order_interval(&self) -> Duration {
        Duration::from_millis(self.execution.order_interval_ms)
    }

    /// Full path to the audit log file.
    pub fn audit_path(&self) -> PathBuf {
        Path::new(&self.logging.dir).join(&self.logging.audit_file)
    }
}
