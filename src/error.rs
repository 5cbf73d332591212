//! Error types.
//!
//! - `SourceError` is what the provider clients return. Each UI section catches
//!   its own `SourceError` and renders it inline.
//! - `AppError` is the CLI boundary type: a message plus a process exit code.

use chrono::NaiveDate;
use thiserror::Error;

/// Failure of a single provider data path.
#[derive(Debug, Clone, Error)]
pub enum SourceError {
    /// A required secret is not configured.
    #[error("Missing {var} in environment (.env).")]
    MissingConfig { var: &'static str },

    /// Network failure or timeout.
    #[error("{provider} request failed: {message}")]
    Transport {
        provider: &'static str,
        message: String,
    },

    /// The provider answered with a non-2xx status.
    #[error("{provider} request failed with status {status}.")]
    Status { provider: &'static str, status: u16 },

    /// The body was not the expected JSON envelope.
    #[error("Failed to parse {provider} response: {message}")]
    Decode {
        provider: &'static str,
        message: String,
    },

    /// The caller asked for a series key outside the catalogue.
    #[error("Unknown series key '{key}'.")]
    UnknownKey { key: String },

    /// A history request whose end precedes its start.
    #[error("End date {end} is before start date {start}.")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
}

impl SourceError {
    pub fn transport(provider: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Transport {
            provider,
            message: err.to_string(),
        }
    }

    pub fn decode(provider: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Decode {
            provider,
            message: err.to_string(),
        }
    }

    /// Exit code used when this error reaches the CLI boundary.
    pub fn exit_code(&self) -> u8 {
        match self {
            SourceError::MissingConfig { .. }
            | SourceError::UnknownKey { .. }
            | SourceError::InvalidRange { .. } => 2,
            SourceError::Transport { .. }
            | SourceError::Status { .. }
            | SourceError::Decode { .. } => 4,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<SourceError> for AppError {
    fn from(err: SourceError) -> Self {
        Self::new(err.exit_code(), err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_errors_map_to_exit_codes() {
        let missing: AppError = SourceError::MissingConfig { var: "FRED_API_KEY" }.into();
        assert_eq!(missing.exit_code(), 2);
        assert_eq!(missing.to_string(), "Missing FRED_API_KEY in environment (.env).");

        let status: AppError = SourceError::Status {
            provider: "Banxico",
            status: 503,
        }
        .into();
        assert_eq!(status.exit_code(), 4);
        assert!(status.to_string().contains("503"));
    }
}
