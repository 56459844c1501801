//! Error types for the proxy.

use thiserror::Error;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ProxyError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The upstream call never produced an HTTP response (connect, TLS, body read).
    #[error("{message}")]
    Upstream { message: String },

    /// The upstream answered 2xx but the body could not be turned into a completion.
    #[error("Translation error: {message}")]
    Translation { message: String },

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl ProxyError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::Upstream {
            message: msg.into(),
        }
    }

    pub fn translation(msg: impl Into<String>) -> Self {
        Self::Translation {
            message: msg.into(),
        }
    }

    /// HTTP status reported to the caller when this error reaches the handler.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Translation { .. } => 502,
            _ => 500,
        }
    }
}

pub type Result<T> = std::result::Result<T, ProxyError>;
