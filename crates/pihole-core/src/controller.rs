// ── Controller facade ──
//
// The single entry point hosts use. Wraps one `Appliance` and runs every
// operation under the `Coordinator` with the caller's cancellation token.
// Inputs are validated before the lock is taken, so a malformed request
// never queues behind real work.

use std::sync::Arc;
use std::time::Duration;

use pihole_api::{
    Appliance, ClientManagement, ClientRecord, CnameRecord, CreateOptions, DnsRecord, LocalCname,
    LocalDns, V6Client,
};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::ConnectionProfile;
use crate::coordinator::{self, Coordinator};
use crate::error::CoreError;
use crate::validation::{validate_client_id, validate_domain, validate_ip};

/// Upper bound for the best-effort logout during shutdown.
pub const TERMINATE_TIMEOUT: Duration = Duration::from_secs(5);

/// Serialized, cancellable access to one appliance.
///
/// Cheaply cloneable via `Arc`; clones share the appliance, the session,
/// and the coordinator.
pub struct Controller<A: Appliance = V6Client> {
    inner: Arc<ControllerInner<A>>,
}

struct ControllerInner<A> {
    appliance: A,
    coordinator: Arc<Coordinator>,
    /// `false` when the session was handed in from outside; such sessions
    /// belong to someone else and are never logged out on shutdown.
    owns_session: bool,
}

impl<A: Appliance> Clone for Controller<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Controller<V6Client> {
    /// Build a v6 client from `profile` and establish a session.
    ///
    /// A supplied `session_id` is reused as-is; otherwise the password is
    /// exchanged for a new session. The controller joins the process-wide
    /// coordinator.
    pub async fn connect(profile: ConnectionProfile) -> Result<Self, CoreError> {
        let transport = profile.transport();
        let mut client =
            V6Client::new(profile.url.clone(), &transport)?.with_retry_policy(profile.retry);
        if let Some(agent) = &profile.user_agent {
            client = client.with_user_agent(agent.clone());
        }

        let owns_session = match (&profile.session_id, &profile.password) {
            (Some(sid), _) => {
                debug!("reusing supplied session");
                client = client.with_session_id(sid.clone());
                false
            }
            (None, Some(password)) => {
                client.authenticate(password).await?;
                true
            }
            (None, None) => {
                return Err(CoreError::Config {
                    message: "a password or an existing session id is required".into(),
                });
            }
        };

        info!(url = %profile.url, "connected to appliance");
        Ok(Self::from_parts(
            client,
            Coordinator::process_wide(),
            owns_session,
        ))
    }

    /// A token cancelled by `parent` or after `timeout`, whichever comes first.
    pub fn with_deadline(parent: &CancellationToken, timeout: Duration) -> CancellationToken {
        coordinator::deadline(parent, timeout)
    }
}

impl<A: Appliance> Controller<A> {
    /// Wrap an already-connected appliance.
    pub fn from_parts(appliance: A, coordinator: Arc<Coordinator>, owns_session: bool) -> Self {
        Self {
            inner: Arc::new(ControllerInner {
                appliance,
                coordinator,
                owns_session,
            }),
        }
    }

    pub fn appliance(&self) -> &A {
        &self.inner.appliance
    }

    pub fn coordinator(&self) -> &Arc<Coordinator> {
        &self.inner.coordinator
    }

    /// The current session id, for handing to another process.
    pub fn session_id(&self) -> Option<String> {
        self.inner.appliance.session_id()
    }

    pub fn owns_session(&self) -> bool {
        self.inner.owns_session
    }

    async fn run<T, F>(&self, cancel: &CancellationToken, op: F) -> Result<T, CoreError>
    where
        F: Future<Output = Result<T, CoreError>>,
    {
        self.inner.coordinator.run(cancel, op).await
    }

    // ── Local DNS ────────────────────────────────────────────────────

    pub async fn list_dns(&self, cancel: &CancellationToken) -> Result<Vec<DnsRecord>, CoreError> {
        self.run(cancel, async {
            self.inner.appliance.dns().list().await.map_err(CoreError::from)
        })
        .await
    }

    pub async fn get_dns(
        &self,
        domain: &str,
        cancel: &CancellationToken,
    ) -> Result<DnsRecord, CoreError> {
        self.run(cancel, async {
            self.inner.appliance.dns().get(domain).await.map_err(CoreError::from)
        })
        .await
    }

    pub async fn create_dns(
        &self,
        domain: &str,
        ip: &str,
        opts: CreateOptions,
        cancel: &CancellationToken,
    ) -> Result<DnsRecord, CoreError> {
        validate_domain(domain)?;
        validate_ip(ip)?;
        self.run(cancel, async {
            self.inner.appliance.dns().create(domain, ip, opts).await.map_err(CoreError::from)
        })
        .await
    }

    /// Idempotent: an absent domain is not an error.
    pub async fn delete_dns(&self, domain: &str, cancel: &CancellationToken) -> Result<(), CoreError> {
        self.run(cancel, async {
            self.inner.appliance.dns().delete(domain).await.map_err(CoreError::from)
        })
        .await
    }

    /// Delete whatever `domain` maps to, then create the new mapping,
    /// without letting another operation in between.
    pub async fn replace_dns(
        &self,
        domain: &str,
        ip: &str,
        cancel: &CancellationToken,
    ) -> Result<DnsRecord, CoreError> {
        validate_domain(domain)?;
        validate_ip(ip)?;
        self.run(cancel, async {
            let dns = self.inner.appliance.dns();
            dns.delete(domain).await?;
            let record = dns.create(domain, ip, CreateOptions::default()).await?;
            info!(domain, ip, "replaced local DNS record");
            Ok::<_, CoreError>(record)
        })
        .await
    }

    // ── Local CNAME ──────────────────────────────────────────────────

    pub async fn list_cname(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<CnameRecord>, CoreError> {
        self.run(cancel, async {
            self.inner.appliance.cname().list().await.map_err(CoreError::from)
        })
        .await
    }

    pub async fn get_cname(
        &self,
        domain: &str,
        cancel: &CancellationToken,
    ) -> Result<CnameRecord, CoreError> {
        self.run(cancel, async {
            self.inner.appliance.cname().get(domain).await.map_err(CoreError::from)
        })
        .await
    }

    pub async fn create_cname(
        &self,
        domain: &str,
        target: &str,
        opts: CreateOptions,
        cancel: &CancellationToken,
    ) -> Result<CnameRecord, CoreError> {
        validate_domain(domain)?;
        validate_domain(target)?;
        self.run(cancel, async {
            let cname = self.inner.appliance.cname();
            cname
                .create(domain, target, opts)
                .await
                .map_err(CoreError::from)
        })
        .await
    }

    /// Idempotent: an absent domain is not an error.
    pub async fn delete_cname(
        &self,
        domain: &str,
        cancel: &CancellationToken,
    ) -> Result<(), CoreError> {
        self.run(cancel, async {
            self.inner.appliance.cname().delete(domain).await.map_err(CoreError::from)
        })
        .await
    }

    pub async fn replace_cname(
        &self,
        domain: &str,
        target: &str,
        cancel: &CancellationToken,
    ) -> Result<CnameRecord, CoreError> {
        validate_domain(domain)?;
        validate_domain(target)?;
        self.run(cancel, async {
            let cname = self.inner.appliance.cname();
            cname.delete(domain).await?;
            let record = cname
                .create(domain, target, CreateOptions::default())
                .await?;
            info!(domain, target, "replaced local CNAME record");
            Ok::<_, CoreError>(record)
        })
        .await
    }

    // ── Client records ───────────────────────────────────────────────

    pub async fn list_clients(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<ClientRecord>, CoreError> {
        self.run(cancel, async {
            self.inner.appliance.clients().list().await.map_err(CoreError::from)
        })
        .await
    }

    pub async fn get_client(
        &self,
        client: &str,
        cancel: &CancellationToken,
    ) -> Result<ClientRecord, CoreError> {
        validate_client_id(client)?;
        self.run(cancel, async {
            self.inner.appliance.clients().get(client).await.map_err(CoreError::from)
        })
        .await
    }

    pub async fn create_client(
        &self,
        client: &str,
        comment: &str,
        cancel: &CancellationToken,
    ) -> Result<ClientRecord, CoreError> {
        validate_client_id(client)?;
        self.run(cancel, async {
            self.inner.appliance.clients().create(client, comment).await.map_err(CoreError::from)
        })
        .await
    }

    pub async fn update_client(
        &self,
        client: &str,
        comment: &str,
        cancel: &CancellationToken,
    ) -> Result<ClientRecord, CoreError> {
        validate_client_id(client)?;
        self.run(cancel, async {
            self.inner.appliance.clients().update(client, comment).await.map_err(CoreError::from)
        })
        .await
    }

    /// Unlike DNS and CNAME, a missing client is reported as `NotFound`.
    pub async fn delete_client(
        &self,
        client: &str,
        cancel: &CancellationToken,
    ) -> Result<(), CoreError> {
        validate_client_id(client)?;
        self.run(cancel, async {
            self.inner.appliance.clients().delete(client).await.map_err(CoreError::from)
        })
        .await
    }

    // ── Session lifecycle ────────────────────────────────────────────

    /// End the session on the appliance, reporting any failure.
    pub async fn logout(&self, cancel: &CancellationToken) -> Result<(), CoreError> {
        self.run(cancel, async {
            self.inner.appliance.logout().await.map_err(CoreError::from)
        })
        .await
    }

    /// Best-effort logout bounded by [`TERMINATE_TIMEOUT`]. Never fails.
    ///
    /// Skipped for sessions supplied from outside.
    pub async fn terminate(&self) {
        if !self.inner.owns_session {
            debug!("session not owned, leaving it open");
            return;
        }

        let token = coordinator::deadline(&CancellationToken::new(), TERMINATE_TIMEOUT);
        if let Err(e) = self.logout(&token).await {
            warn!(error = %e, "logout failed (non-fatal)");
        }
        token.cancel();
    }
}

impl<A: Appliance + 'static> Controller<A> {
    /// Log out once `shutdown` fires, from a detached task.
    ///
    /// The task has its own timeout and discards failures, so shutdown is
    /// never held up by an unreachable appliance.
    pub fn logout_on_shutdown(&self, shutdown: CancellationToken) -> JoinHandle<()> {
        let ctrl = self.clone();
        tokio::spawn(async move {
            shutdown.cancelled().await;
            ctrl.terminate().await;
        })
    }
}
