// ── Core error types ──
//
// Errors that abort a provisioning run. Recoverable record-level failures
// (validation, missing parents, unresolved assignments) never surface here:
// the engine reports them through the `ReportSink` and carries on. The
// `From<nbsetup_api::Error>` impl translates transport-layer errors into
// domain-appropriate variants.

use std::path::PathBuf;

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to NetBox at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    #[error("NetBox request timed out: {url}")]
    Timeout { url: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Input errors ─────────────────────────────────────────────────
    #[error("Invalid input {}: {message}", path.display())]
    Input { path: PathBuf, message: String },

    #[error("Invalid device-type template {}: {message}", path.display())]
    Template { path: PathBuf, message: String },

    // ── Plan errors ──────────────────────────────────────────────────
    #[error("Invalid stage plan: {0}")]
    Plan(String),

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<nbsetup_api::Error> for CoreError {
    fn from(err: nbsetup_api::Error) -> Self {
        match err {
            nbsetup_api::Error::InvalidToken { message } => CoreError::Authentication { message },
            nbsetup_api::Error::Transport(ref e) => {
                let url = e
                    .url()
                    .map_or_else(|| "<unknown>".into(), ToString::to_string);
                if e.is_timeout() {
                    CoreError::Timeout { url }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url,
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            nbsetup_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            nbsetup_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            err @ (nbsetup_api::Error::Validation { .. } | nbsetup_api::Error::Ambiguous { .. }) => {
                CoreError::Api {
                    message: err.to_string(),
                    status: None,
                }
            }
            nbsetup_api::Error::Api { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            nbsetup_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}
