use thiserror::Error;

use crate::validation::ValidationErrors;

/// Top-level error type for the `nbsetup-api` crate.
///
/// Covers every failure mode of the NetBox REST surface: authentication,
/// transport, field validation on create, and unexpected payloads.
/// `nbsetup-core` decides which of these are reported-and-skipped and which
/// abort the run (see [`Error::is_recoverable`]).
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Token rejected by NetBox (HTTP 401/403).
    #[error("Invalid API token: {message}")]
    InvalidToken { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Records ─────────────────────────────────────────────────────
    /// HTTP 400 on create: per-record field errors, parsed.
    #[error("Validation failed on {collection} (HTTP {status}): {errors}")]
    Validation {
        collection: String,
        status: u16,
        errors: ValidationErrors,
    },

    /// A lookup expected at most one record but the filter matched several.
    #[error("{count} records in {collection} match {filter}")]
    Ambiguous {
        collection: String,
        filter: String,
        count: u64,
    },

    /// Any other non-success response.
    #[error("NetBox API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the failure concerns the records in one request and
    /// the caller can report it and carry on with unrelated work.
    ///
    /// Transport, TLS, auth and server-side (5xx) failures are not recoverable:
    /// nothing else in the run can succeed either.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Validation { .. } | Self::Ambiguous { .. } => true,
            Self::Api { status, .. } => (400..500).contains(status),
            _ => false,
        }
    }

    /// Structured field errors, when this is a create-time validation failure.
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            Self::Validation { errors, .. } => Some(errors),
            _ => None,
        }
    }
}
