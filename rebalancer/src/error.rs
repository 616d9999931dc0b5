//! Error types for the rebalancer.

use std::path::PathBuf;

use vsebook::ValidationError;

/// All errors that can occur during rebalancer operation.
///
/// `StateRead` and `OrderSubmission` are the two fatal kinds a rebalance
/// pass can end with. Per-order problems never surface here; they are
/// collected in the pass summary instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("target file error: {0}")]
    Target(String),

    #[error("failed to read target file {path}: {source}")]
    TargetRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse target JSON: {0}")]
    TargetParse(#[from] serde_json::Error),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("game connection error: {0}")]
    Connection(String),

    #[error("could not read state ({what}): {reason}")]
    StateRead { what: &'static str, reason: String },

    #[error("could not submit order: {0}")]
    OrderSubmission(String),

    #[error("invalid order: {0}")]
    InvalidOrder(String),

    #[error("plan has {planned} orders, more than the {max} allowed per run")]
    TooManyOrders { planned: usize, max: usize },

    /// The operator declined at the prompt.
    #[error("execution aborted: {0}")]
    Aborted(String),

    /// The prompt could not be shown or read (no terminal attached).
    #[error("confirmation prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("audit log error: {0}")]
    Audit(#[from] std::io::Error),
}

impl Error {
    /// True for the errors that stop a rebalance pass midway.
    pub fn is_fatal_pass_error(&self) -> bool {
        matches!(self, Error::StateRead { .. } | Error::OrderSubmission(_))
    }

    /// Process exit status for a command that ended with this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Aborted(_) => 0,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
