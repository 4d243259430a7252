//! Application error types with rich context

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Application error types organized by layer/domain
#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Common/Infrastructure Errors
    // ─────────────────────────────────────────────────────────────
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    // ─────────────────────────────────────────────────────────────
    // Vendor Service Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Vendor call '{operation}' failed: {message}")]
    Vendor { operation: String, message: String },

    #[error("Failed to launch foreground flow under request code {code:#x}: {reason}")]
    Launch { code: i32, reason: String },

    // ─────────────────────────────────────────────────────────────
    // Result Routing Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Result delivered for unknown request code {code:#x}")]
    UnknownRequestCode { code: i32 },

    #[error("No pending request registered under request code {code:#x}")]
    NoPendingRequest { code: i32 },

    // ─────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("Invalid configuration: {message}")]
    ConfigInvalid { message: String },
}

// ─────────────────────────────────────────────────────────────────
// Convenience Constructors
// ─────────────────────────────────────────────────────────────────

impl Error {
    pub fn vendor(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Vendor {
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn launch(code: i32, reason: impl Into<String>) -> Self {
        Self::Launch {
            code,
            reason: reason.into(),
        }
    }

    pub fn config_invalid(message: impl Into<String>) -> Self {
        Self::ConfigInvalid {
            message: message.into(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Error Context Extensions
// ─────────────────────────────────────────────────────────────────

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Log the error with context built lazily, then pass it on
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", f(), err);
            err
        })
    }
}
