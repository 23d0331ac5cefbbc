use thiserror::Error;

/// Top-level error type for the `pihole-api` crate.
///
/// Covers every failure mode of the appliance API: authentication,
/// transport, record lookups, create conflicts, and unexpected responses.
/// `pihole-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The appliance rejected the credential (non-success status on `/api/auth`).
    #[error("Authentication failed (HTTP {status}): {message}")]
    AuthFailed { status: u16, message: String },

    /// Authentication succeeded but the response carried no session id.
    #[error("Session id not found in authentication response")]
    SessionMissing,

    // ── Record lookups ──────────────────────────────────────────────
    /// No local DNS record exists for the domain.
    #[error("Local DNS record not found: {domain}")]
    DnsNotFound { domain: String },

    /// No CNAME record exists for the domain.
    #[error("Local CNAME record not found: {domain}")]
    CnameNotFound { domain: String },

    /// No client record exists for the identifier.
    #[error("Client not found: {client}")]
    ClientNotFound { client: String },

    // ── Mutations ───────────────────────────────────────────────────
    /// The appliance kept reporting the entry as already present after
    /// every retry was spent.
    #[error("Item already present after {attempts} attempts: {body}")]
    AlreadyPresent { attempts: u32, body: String },

    /// Any HTTP status the operation does not expect.
    #[error("Unexpected status code {status} (expected {expected}): {body}")]
    UnexpectedStatus {
        status: u16,
        expected: &'static str,
        body: String,
    },

    /// A client create/update succeeded but the response listed no client.
    #[error("No client returned in response")]
    NoClientReturned,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS configuration error (bad CA material, client build failure).
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` for the per-kind "record not found" variants.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::DnsNotFound { .. } | Self::CnameNotFound { .. } | Self::ClientNotFound { .. }
        )
    }

    /// Returns `true` if this error means the credential or session is unusable.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::AuthFailed { .. } | Self::SessionMissing)
    }

    /// Returns `true` if create retries were exhausted on an "already present" body.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::AlreadyPresent { .. })
    }

    /// The HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::AuthFailed { status, .. } | Self::UnexpectedStatus { status, .. } => {
                Some(*status)
            }
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_covers_every_record_kind() {
        assert!(Error::DnsNotFound { domain: "a.local".into() }.is_not_found());
        assert!(Error::CnameNotFound { domain: "a.local".into() }.is_not_found());
        assert!(Error::ClientNotFound { client: "10.0.0.1".into() }.is_not_found());
        assert!(!Error::SessionMissing.is_not_found());
    }

    #[test]
    fn unexpected_status_reports_code_and_body() {
        let err = Error::UnexpectedStatus {
            status: 500,
            expected: "201",
            body: "boom".into(),
        };
        assert_eq!(err.status(), Some(500));
        assert_eq!(
            err.to_string(),
            "Unexpected status code 500 (expected 201): boom"
        );
    }
}
