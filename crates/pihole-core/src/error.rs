// ── Core error types ──
//
// User-facing errors from pihole-core. The `From<pihole_api::Error>` impl
// folds the per-kind API variants into a smaller taxonomy hosts can act on:
// "absent" (NotFound), "retry later" (Conflict), "re-verify" (Cancelled).

use strum::Display;
use thiserror::Error;

/// The record family an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum RecordKind {
    #[strum(serialize = "DNS record")]
    Dns,
    #[strum(serialize = "CNAME record")]
    Cname,
    #[strum(serialize = "client")]
    Client,
}

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to appliance at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Appliance accepted the password but returned no session id")]
    SessionMissing,

    // ── Data errors ──────────────────────────────────────────────────
    #[error("{kind} not found: {identifier}")]
    NotFound {
        kind: RecordKind,
        identifier: String,
    },

    #[error("Appliance still reports the entry as present after {attempts} attempts: {body}")]
    Conflict { attempts: u32, body: String },

    #[error("Unexpected response from appliance (HTTP {status}): {body}")]
    UnexpectedStatus { status: u16, body: String },

    // ── Operation errors ─────────────────────────────────────────────
    /// The caller's token fired. A request already on the wire may still
    /// have been applied; re-read before assuming either outcome.
    #[error("Operation cancelled")]
    Cancelled,

    #[error("Validation failed: {message}")]
    Validation { message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// `true` when the record is absent; hosts drop it from their state.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<pihole_api::Error> for CoreError {
    fn from(err: pihole_api::Error) -> Self {
        use pihole_api::Error as Api;

        match err {
            Api::AuthFailed { status, message } => CoreError::AuthenticationFailed {
                message: format!("HTTP {status}: {message}"),
            },
            Api::SessionMissing => CoreError::SessionMissing,
            Api::DnsNotFound { domain } => CoreError::NotFound {
                kind: RecordKind::Dns,
                identifier: domain,
            },
            Api::CnameNotFound { domain } => CoreError::NotFound {
                kind: RecordKind::Cname,
                identifier: domain,
            },
            Api::ClientNotFound { client } => CoreError::NotFound {
                kind: RecordKind::Client,
                identifier: client,
            },
            Api::AlreadyPresent { attempts, body } => CoreError::Conflict { attempts, body },
            Api::UnexpectedStatus { status, body, .. } => {
                CoreError::UnexpectedStatus { status, body }
            }
            Api::NoClientReturned => {
                CoreError::Internal("appliance response listed no client".into())
            }
            Api::Transport(ref e) => {
                let url = e
                    .url()
                    .map(|u| u.origin().ascii_serialization())
                    .unwrap_or_else(|| "<unknown>".into());
                let reason = if e.is_timeout() {
                    "request timed out".into()
                } else {
                    e.to_string()
                };
                CoreError::ConnectionFailed { url, reason }
            }
            Api::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            Api::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            Api::Deserialization { message, .. } => {
                CoreError::Internal(format!("unexpected response shape: {message}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_keeps_kind_and_identifier() {
        let err = CoreError::from(pihole_api::Error::CnameNotFound {
            domain: "alias.local".into(),
        });
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "CNAME record not found: alias.local");
    }

    #[test]
    fn exhausted_retries_become_conflict() {
        let err = CoreError::from(pihole_api::Error::AlreadyPresent {
            attempts: 5,
            body: "Item already present".into(),
        });
        assert!(matches!(err, CoreError::Conflict { attempts: 5, .. }));
    }

    #[test]
    fn unexpected_status_drops_expectation() {
        let err = CoreError::from(pihole_api::Error::UnexpectedStatus {
            status: 500,
            expected: "201",
            body: "boom".into(),
        });
        assert!(matches!(err, CoreError::UnexpectedStatus { status: 500, ref body } if body == "boom"));
    }

    #[test]
    fn auth_failure_mentions_status() {
        let err = CoreError::from(pihole_api::Error::AuthFailed {
            status: 401,
            message: "password incorrect".into(),
        });
        assert_eq!(
            err.to_string(),
            "Authentication failed: HTTP 401: password incorrect"
        );
    }
}
