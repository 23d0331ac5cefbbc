// Transport configuration for building the appliance's reqwest::Client.
//
// TLS material arrives as bytes: reading CA files from disk belongs to
// the configuration loader, not to the API client.

use std::time::Duration;

use crate::error::Error;

/// TLS verification mode.
#[derive(Debug, Clone, Default)]
pub enum TlsMode {
    /// Use the built-in webpki root store.
    #[default]
    System,
    /// Trust the CA certificates in this PEM bundle (in addition to the roots).
    CustomCa(Vec<u8>),
    /// Accept any certificate (self-signed appliances).
    DangerAcceptInvalid,
}

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::System,
            timeout: Duration::from_secs(30),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder().timeout(self.timeout);

        match &self.tls {
            TlsMode::System => {}
            TlsMode::CustomCa(pem) => {
                let certs = reqwest::Certificate::from_pem_bundle(pem)
                    .map_err(|e| Error::Tls(format!("invalid CA certificate bundle: {e}")))?;
                if certs.is_empty() {
                    return Err(Error::Tls("CA bundle contains no certificates".into()));
                }
                for cert in certs {
                    builder = builder.add_root_certificate(cert);
                }
            }
            TlsMode::DangerAcceptInvalid => {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }
}
