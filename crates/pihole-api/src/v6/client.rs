// Pi-hole v6 HTTP client
//
// Wraps `reqwest::Client` with the appliance's request conventions: the
// `X-FTL-SID` session header read fresh at send time, an optional
// User-Agent, and JSON bodies. Record services (dns, cname, clients) are
// thin views over this client and live in their own modules.

use reqwest::header::USER_AGENT;
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::error::Error;
use crate::retry::{RetryPolicy, is_transient_conflict};
use crate::service::{Appliance, ClientManagement, LocalCname, LocalDns};
use crate::transport::TransportConfig;
use crate::v6::clients::ClientService;
use crate::v6::cname::CnameService;
use crate::v6::dns::DnsService;
use crate::v6::session::Session;

/// Header carrying the session id on every authenticated request.
pub const SESSION_HEADER: &str = "X-FTL-SID";

/// Raw HTTP client for the Pi-hole v6 API.
///
/// Safe to share between tasks: the session id sits behind a read-write
/// lock, so concurrent requests read it while a (rare) re-authentication
/// replaces it.
pub struct V6Client {
    http: reqwest::Client,
    base_url: Url,
    user_agent: Option<String>,
    session: Session,
    retry: RetryPolicy,
}

impl V6Client {
    /// Create a new client from a `TransportConfig`.
    ///
    /// The client starts without a session; call
    /// [`authenticate`](Self::authenticate) or supply one with
    /// [`with_session_id`](Self::with_session_id).
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url))
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            base_url,
            user_agent: None,
            session: Session::default(),
            retry: RetryPolicy::default(),
        }
    }

    /// Send this User-Agent on every request.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Reuse an existing session instead of authenticating.
    pub fn with_session_id(self, sid: SecretString) -> Self {
        self.session.replace(sid);
        self
    }

    /// Override the create-conflict retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// The appliance base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The active create-conflict retry policy.
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// The session manager holding the current session id.
    pub fn session(&self) -> &Session {
        &self.session
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub(crate) fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build a full URL for an absolute API path such as `/api/auth`.
    pub(crate) fn endpoint(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}{path}"))?)
    }

    // ── Request executor ─────────────────────────────────────────────

    /// Build and send one authenticated request.
    ///
    /// `Content-Type: application/json` is only set when a body is present.
    /// The session header uses whatever id the session holds at send time.
    pub(crate) async fn execute<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<reqwest::Response, Error>
    where
        B: Serialize + ?Sized + Sync,
    {
        let url = self.endpoint(path)?;
        debug!("{method} {}", url.path());

        let mut builder = self.http.request(method, url);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        if let Some(agent) = self.user_agent() {
            builder = builder.header(USER_AGENT, agent);
        }
        if let Some(sid) = self.session.current() {
            builder = builder.header(SESSION_HEADER, sid.expose_secret());
        }

        builder.send().await.map_err(Error::Transport)
    }

    pub(crate) async fn get(&self, path: &str) -> Result<reqwest::Response, Error> {
        self.execute::<()>(Method::GET, path, None).await
    }

    pub(crate) async fn put<B>(
        &self,
        path: &str,
        body: Option<&B>,
    ) -> Result<reqwest::Response, Error>
    where
        B: Serialize + ?Sized + Sync,
    {
        self.execute(Method::PUT, path, body).await
    }

    pub(crate) async fn post<B>(&self, path: &str, body: &B) -> Result<reqwest::Response, Error>
    where
        B: Serialize + ?Sized + Sync,
    {
        self.execute(Method::POST, path, Some(body)).await
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<reqwest::Response, Error> {
        self.execute::<()>(Method::DELETE, path, None).await
    }

    // ── Shared create loop ───────────────────────────────────────────

    /// PUT a body-less create, retrying while the appliance reports the
    /// entry as still present.
    ///
    /// Succeeds only on `201 Created`. A 400 whose body contains one of
    /// `markers` is retried with exponential backoff up to the policy's
    /// bound; any other status fails immediately.
    pub(crate) async fn create_with_retry(&self, path: &str, markers: &[&str]) -> Result<(), Error> {
        let attempts = self.retry.max_attempts.max(1);
        let mut last_body = String::new();

        for attempt in 0..attempts {
            let delay = self.retry.delay_before(attempt);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            let resp = self.put::<()>(path, None).await?;
            let status = resp.status();
            if status == StatusCode::CREATED {
                return Ok(());
            }

            let body = read_text(resp).await;
            if !is_transient_conflict(status, &body, markers) {
                return Err(Error::UnexpectedStatus {
                    status: status.as_u16(),
                    expected: "201",
                    body,
                });
            }

            if backoff_follows(attempt, attempts) {
                warn!(
                    path,
                    attempt = attempt + 1,
                    max_attempts = attempts,
                    "entry still present on appliance, backing off"
                );
            }
            last_body = body;
        }

        Err(Error::AlreadyPresent {
            attempts,
            body: last_body,
        })
    }
}

/// Whether another attempt (and its backoff wait) comes after `attempt`.
fn backoff_follows(attempt: u32, attempts: u32) -> bool {
    attempt + 1 < attempts
}

// ── Response helpers ─────────────────────────────────────────────────

/// Read a response body for diagnostics; an unreadable body becomes empty.
pub(crate) async fn read_text(resp: reqwest::Response) -> String {
    resp.text().await.unwrap_or_default()
}

/// Read and deserialize a JSON response body.
pub(crate) async fn read_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
    let body = resp.text().await.map_err(Error::Transport)?;
    match serde_json::from_str(&body) {
        Ok(value) => Ok(value),
        Err(e) => Err(Error::Deserialization {
            message: e.to_string(),
            body,
        }),
    }
}

/// Treat an explicit JSON `null` list like a missing one.
pub(crate) fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// `{collection}/{escaped key}` for endpoints keyed by a single path segment.
pub(crate) fn keyed_path(collection: &str, key: &str) -> String {
    format!("{collection}/{}", urlencoding::encode(key))
}

/// Fail with `UnexpectedStatus` unless the response status is one of `accepted`.
pub(crate) async fn expect_status(
    resp: reqwest::Response,
    accepted: &[StatusCode],
    expected: &'static str,
) -> Result<reqwest::Response, Error> {
    if accepted.contains(&resp.status()) {
        return Ok(resp);
    }
    let status = resp.status().as_u16();
    Err(Error::UnexpectedStatus {
        status,
        expected,
        body: read_text(resp).await,
    })
}

// ── Capability trait ─────────────────────────────────────────────────

impl Appliance for V6Client {
    fn dns(&self) -> impl LocalDns + '_ {
        DnsService::new(self)
    }

    fn cname(&self) -> impl LocalCname + '_ {
        CnameService::new(self)
    }

    fn clients(&self) -> impl ClientManagement + '_ {
        ClientService::new(self)
    }

    fn session_id(&self) -> Option<String> {
        self.session
            .current()
            .map(|sid| sid.expose_secret().to_owned())
    }

    async fn logout(&self) -> Result<(), Error> {
        self.end_session().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> V6Client {
        V6Client::with_client(reqwest::Client::new(), Url::parse(base).expect("valid url"))
    }

    #[test]
    fn endpoint_joins_without_double_slash() {
        let c = client("http://pi.hole/");
        let url = c.endpoint("/api/auth").expect("valid endpoint");
        assert_eq!(url.as_str(), "http://pi.hole/api/auth");
    }

    #[test]
    fn endpoint_keeps_base_path_prefix() {
        let c = client("https://proxy.lan/pihole");
        let url = c.endpoint("/api/config/dns/hosts").expect("valid endpoint");
        assert_eq!(url.path(), "/pihole/api/config/dns/hosts");
    }

    #[test]
    fn keyed_path_escapes_separators() {
        assert_eq!(
            keyed_path("/api/config/dns/hosts", "10.0.0.5 example.local"),
            "/api/config/dns/hosts/10.0.0.5%20example.local"
        );
        assert_eq!(
            keyed_path("/api/config/dns/cnameRecords", "alias.local,example.local"),
            "/api/config/dns/cnameRecords/alias.local%2Cexample.local"
        );
    }

    #[test]
    fn injected_session_is_exposed_for_reuse() {
        let c = client("http://pi.hole").with_session_id(SecretString::from("abc123".to_owned()));
        assert_eq!(c.session_id().as_deref(), Some("abc123"));
    }

    #[test]
    fn no_backoff_after_final_attempt() {
        assert!(backoff_follows(0, 5));
        assert!(backoff_follows(3, 5));
        assert!(!backoff_follows(4, 5));
        assert!(!backoff_follows(0, 1));
    }
}
