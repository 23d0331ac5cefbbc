// ── Runtime connection profile ──
//
// Describes *how* to reach one appliance. Carries credential data and
// TLS material as bytes, but never touches disk: pihole-config (or any
// other host) builds a `ConnectionProfile` and hands it in.

use std::time::Duration;

use pihole_api::{RetryPolicy, TlsMode, TransportConfig};
use secrecy::SecretString;
use url::Url;

/// Everything needed to construct a client for one appliance.
///
/// Immutable once handed to [`Controller::connect`](crate::Controller::connect).
#[derive(Debug, Clone)]
pub struct ConnectionProfile {
    /// Appliance base URL (e.g., `http://pi.hole`).
    pub url: Url,
    /// Admin password. Optional only when `session_id` is supplied.
    pub password: Option<SecretString>,
    /// User-Agent sent on every request.
    pub user_agent: Option<String>,
    /// PEM-encoded CA bundle to trust in addition to the system roots.
    pub ca_pem: Option<Vec<u8>>,
    /// Accept any TLS certificate. Wins over `ca_pem`.
    pub insecure_tls: bool,
    /// Pre-existing session to reuse instead of authenticating.
    pub session_id: Option<SecretString>,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Backoff for create conflicts.
    pub retry: RetryPolicy,
}

impl ConnectionProfile {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            password: None,
            user_agent: None,
            ca_pem: None,
            insecure_tls: false,
            session_id: None,
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_password(mut self, password: SecretString) -> Self {
        self.password = Some(password);
        self
    }

    pub fn with_session_id(mut self, sid: SecretString) -> Self {
        self.session_id = Some(sid);
        self
    }

    pub(crate) fn transport(&self) -> TransportConfig {
        let tls = if self.insecure_tls {
            TlsMode::DangerAcceptInvalid
        } else if let Some(pem) = &self.ca_pem {
            TlsMode::CustomCa(pem.clone())
        } else {
            TlsMode::System
        };
        TransportConfig {
            tls,
            timeout: self.timeout,
        }
    }
}
