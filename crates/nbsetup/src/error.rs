//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and a process exit code.

use miette::Diagnostic;
use thiserror::Error;

use nbsetup_config::ConfigError;
use nbsetup_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to NetBox at {url}")]
    #[diagnostic(
        code(nbsetup::connection_failed),
        help(
            "Check that NetBox is running and reachable.\n\
             Reason: {reason}\n\
             Self-signed certificate? Try --insecure (-k) or set ca_cert in your profile."
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request to NetBox timed out: {url}")]
    #[diagnostic(
        code(nbsetup::timeout),
        help("Increase the timeout with --timeout or check NetBox responsiveness.")
    )]
    Timeout { url: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(nbsetup::auth_failed),
        help(
            "Verify the API token and its write permissions.\n\
             Store a new one with: nbsetup config set-token"
        )
    )]
    AuthFailed { message: String },

    #[error("No API token configured for profile '{profile}'")]
    #[diagnostic(
        code(nbsetup::no_token),
        help(
            "Configure a token with: nbsetup config set-token -p {profile}\n\
             Or set the NBSETUP_TOKEN environment variable."
        )
    )]
    NoToken { profile: String },

    // ── API ──────────────────────────────────────────────────────────
    #[error("NetBox API error{}: {message}", .status.map(|s| format!(" ({s})")).unwrap_or_default())]
    #[diagnostic(code(nbsetup::api_error))]
    ApiError { status: Option<u16>, message: String },

    // ── Input ────────────────────────────────────────────────────────
    #[error("Invalid input {path}: {message}")]
    #[diagnostic(
        code(nbsetup::input),
        help("Check the YAML files in the input directory.")
    )]
    Input { path: String, message: String },

    #[error("Invalid device-type template {path}: {message}")]
    #[diagnostic(
        code(nbsetup::template),
        help("Templates are read from the profile's template_dir or --template-dir.")
    )]
    Template { path: String, message: String },

    #[error("Input document has {count} problem(s)")]
    #[diagnostic(code(nbsetup::invalid_document))]
    InvalidDocument { count: usize },

    #[error("Cannot run the selected stages: {message}")]
    #[diagnostic(
        code(nbsetup::plan),
        help("Add the missing sections or pick other stages. See: nbsetup stages")
    )]
    Plan { message: String },

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(nbsetup::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(nbsetup::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: nbsetup config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No NetBox configured")]
    #[diagnostic(
        code(nbsetup::no_config),
        help(
            "Create a profile with: nbsetup config init\n\
             Expected at: {path}\n\
             Or pass --url and --token."
        )
    )]
    NoConfig { path: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(nbsetup::config))]
    Config { message: String },

    // ── Run outcome ──────────────────────────────────────────────────
    #[error("Run finished with {failures} failure(s)")]
    #[diagnostic(
        code(nbsetup::run_failures),
        help("Drop --strict to exit successfully despite reported failures.")
    )]
    RunHadFailures { failures: usize },

    #[error("Internal error: {0}")]
    #[diagnostic(code(nbsetup::internal))]
    Internal(String),

    // ── IO ───────────────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::AuthFailed { .. } | Self::NoToken { .. } => exit_code::AUTH,
            Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::Input { .. }
            | Self::Template { .. }
            | Self::InvalidDocument { .. }
            | Self::Plan { .. }
            | Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => Self::ConnectionFailed { url, reason },
            CoreError::Authentication { message } => Self::AuthFailed { message },
            CoreError::Timeout { url } => Self::Timeout { url },
            CoreError::Api { message, status } => Self::ApiError { status, message },
            CoreError::Input { path, message } => Self::Input {
                path: path.display().to_string(),
                message,
            },
            CoreError::Template { path, message } => Self::Template {
                path: path.display().to_string(),
                message,
            },
            CoreError::Plan(message) => Self::Plan { message },
            CoreError::Config { message } => Self::Config { message },
            CoreError::Internal(message) => Self::Internal(message),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::NoToken { profile } => Self::NoToken { profile },
            ConfigError::UnknownProfile { name } => Self::ProfileNotFound {
                name,
                available: "(none)".into(),
            },
            ConfigError::Io(e) => Self::Io(e),
            other => Self::Config {
                message: other.to_string(),
            },
        }
    }
}
