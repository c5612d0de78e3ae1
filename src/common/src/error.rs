//! Unified error taxonomy for the market-maker core.
//!
//! Every fallible operation in `common` and `market-maker` returns this
//! single enum. The three variants map directly onto the taxonomy: config
//! errors are fatal at startup, transport errors are recoverable per call
//! site, and invariant violations indicate a bug and should abort the
//! process rather than be swallowed.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Missing credentials file, unknown profile, malformed YAML.
    #[error("{0}")]
    Config(String),

    /// Non-2xx HTTP response, network failure, or response decode failure.
    /// Also covers an expired/rejected bearer token: the next tick
    /// re-authenticates via `AuthSession`.
    #[error("transport error: {status} {reason}")]
    Transport { status: u16, reason: String },

    /// Internal check failure, e.g. a computed price outside 1..99. These
    /// indicate a bug in the core and are never recovered from locally.
    #[error("invariant violated: {0}")]
    Invariant(String),
}

impl Error {
    pub fn transport(status: u16, reason: impl Into<String>) -> Self {
        Error::Transport {
            status,
            reason: reason.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Error::Invariant(msg.into())
    }

    /// True for `Invariant`. Callers at the top of the call stack use this
    /// to decide whether to abort the process instead of logging and
    /// continuing to the next market/cycle.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Invariant(_))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let status = err.status().map(|s| s.as_u16()).unwrap_or(0);
        Error::Transport {
            status,
            reason: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Config(err.to_string())
    }
}
