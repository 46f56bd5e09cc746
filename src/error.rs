//! Error types for the triage engine's fallible edges
//!
//! Only the backend and configuration boundaries can fail. Everything
//! downstream of a loaded taxonomy degrades to empty selections instead.

use thiserror::Error;

/// Errors raised by taxonomy sources and configuration loading
#[derive(Debug, Error)]
pub enum TriageError {
    #[error("Transport error fetching {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Backend returned {status} for {url}: {body}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Failed to decode {what}: {message}")]
    Decode { what: String, message: String },

    #[error("Invalid URL '{url}': {source}")]
    Url {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl TriageError {
    pub fn decode(what: impl Into<String>, message: impl ToString) -> Self {
        Self::Decode {
            what: what.into(),
            message: message.to_string(),
        }
    }

    /// Short machine-readable code for log fields
    pub fn code(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "TRANSPORT",
            Self::Status { .. } => "HTTP_STATUS",
            Self::Decode { .. } => "DECODE",
            Self::Url { .. } => "URL",
            Self::Config(_) => "CONFIG",
            Self::Io { .. } => "IO",
        }
    }
}

pub type Result<T> = std::result::Result<T, TriageError>;
