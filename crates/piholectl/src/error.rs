//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use pihole_config::ConfigError;
use pihole_core::{CoreError, RecordKind};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
    pub const CANCELLED: i32 = 130;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to Pi-hole at {url}")]
    #[diagnostic(
        code(piholectl::connection_failed),
        help(
            "Check that the appliance is running and reachable.\n\
             Reason: {reason}\n\
             Self-signed certificate? Try --insecure (-k) or --ca-file."
        )
    )]
    ConnectionFailed { url: String, reason: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(piholectl::auth_failed),
        help(
            "Verify the admin password.\n\
             Run: piholectl config set-password"
        )
    )]
    AuthFailed { message: String },

    #[error("Pi-hole accepted the password but returned no session")]
    #[diagnostic(
        code(piholectl::session_missing),
        help("Is this a Pi-hole v6 appliance? Older releases use a different API.")
    )]
    SessionMissing,

    #[error("No password or session configured for profile '{profile}'")]
    #[diagnostic(
        code(piholectl::no_credentials),
        help(
            "Configure credentials with: piholectl config init\n\
             Or set PIHOLE_PASSWORD (or __PIHOLE_SESSION_ID) in the environment."
        )
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(piholectl::not_found),
        help("Run: piholectl {list_command} to see existing records")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("Pi-hole still reports the entry as present after {attempts} attempts")]
    #[diagnostic(
        code(piholectl::conflict),
        help(
            "Appliance said: {body}\n\
             Delete the existing record first, or use `replace`."
        )
    )]
    Conflict { attempts: u32, body: String },

    // ── API ──────────────────────────────────────────────────────────
    #[error("Unexpected response from Pi-hole (HTTP {status})")]
    #[diagnostic(code(piholectl::api_error), help("Appliance said: {body}"))]
    ApiError { status: u16, body: String },

    #[error("Internal error: {message}")]
    #[diagnostic(code(piholectl::internal))]
    Internal { message: String },

    // ── Cancellation ─────────────────────────────────────────────────
    #[error("Operation cancelled")]
    #[diagnostic(
        code(piholectl::cancelled),
        help(
            "A request may already have reached the appliance.\n\
             Re-check the record with `get` before retrying."
        )
    )]
    Cancelled,

    #[error("Operation did not finish within {secs}s")]
    #[diagnostic(
        code(piholectl::deadline_exceeded),
        help("Raise --deadline, or check the appliance's responsiveness with -vv.")
    )]
    DeadlineExceeded { secs: u64 },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(piholectl::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(piholectl::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: piholectl config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(piholectl::config))]
    Config { message: String },

    // ── IO ───────────────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::SessionMissing | Self::NoCredentials { .. } => {
                exit_code::AUTH
            }
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Conflict { .. } => exit_code::CONFLICT,
            Self::Validation { .. } => exit_code::USAGE,
            Self::Cancelled => exit_code::CANCELLED,
            Self::DeadlineExceeded { .. } => exit_code::TIMEOUT,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed { url, reason },

            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },

            CoreError::SessionMissing => CliError::SessionMissing,

            CoreError::NotFound { kind, identifier } => {
                let list_command = match kind {
                    RecordKind::Dns => "dns list",
                    RecordKind::Cname => "cname list",
                    RecordKind::Client => "clients list",
                };
                CliError::NotFound {
                    resource_type: kind.to_string(),
                    identifier,
                    list_command: list_command.into(),
                }
            }

            CoreError::Conflict { attempts, body } => CliError::Conflict { attempts, body },

            CoreError::UnexpectedStatus { status, body } => CliError::ApiError { status, body },

            CoreError::Cancelled => CliError::Cancelled,

            CoreError::Validation { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },

            CoreError::Config { message } => CliError::Config { message },

            CoreError::Internal(message) => CliError::Internal { message },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::UnknownProfile { name } => CliError::ProfileNotFound {
                name,
                available: String::new(),
            },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config {
                message: other.to_string(),
            },
        }
    }
}
