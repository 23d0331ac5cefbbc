// Pi-hole v6 session management
//
// `POST /api/auth` exchanges the admin password for a session id (`sid`);
// every later request carries it in `X-FTL-SID`. `DELETE /api/auth` ends
// the session and frees one of the appliance's limited session slots.

use std::sync::{PoisonError, RwLock};

use reqwest::StatusCode;
use reqwest::header::USER_AGENT;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::error::Error;
use crate::v6::client::{V6Client, expect_status, read_text};

const AUTH_PATH: &str = "/api/auth";

/// Holder of the current session id.
///
/// Many readers (every outbound request) race with a rare writer
/// (authentication or explicit reuse), hence the read-write lock.
/// Poisoning is ignored: the guarded value is a plain id with no
/// invariant a panicking writer could break.
#[derive(Debug, Default)]
pub struct Session {
    sid: RwLock<Option<SecretString>>,
}

impl Session {
    pub fn new(sid: Option<SecretString>) -> Self {
        Self {
            sid: RwLock::new(sid),
        }
    }

    /// The session id as of this call.
    pub fn current(&self) -> Option<SecretString> {
        self.sid
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether a session id is held.
    pub fn is_active(&self) -> bool {
        self.sid
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    pub(crate) fn replace(&self, sid: SecretString) {
        *self.sid.write().unwrap_or_else(PoisonError::into_inner) = Some(sid);
    }

    pub(crate) fn clear(&self) {
        *self.sid.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

#[derive(Debug, Default, Deserialize)]
struct AuthResponse {
    #[serde(default)]
    session: AuthSession,
}

#[derive(Debug, Default, Deserialize)]
struct AuthSession {
    #[serde(default)]
    sid: Option<String>,
}

impl V6Client {
    /// Exchange the admin password for a session id.
    ///
    /// A non-success status yields [`Error::AuthFailed`]. A success status
    /// whose body lacks a usable `session.sid` yields
    /// [`Error::SessionMissing`]: the credential was accepted but the
    /// response shape is not what this client understands.
    pub async fn authenticate(&self, password: &SecretString) -> Result<(), Error> {
        let url = self.endpoint(AUTH_PATH)?;
        debug!("authenticating at {}", url);

        let body = json!({ "password": password.expose_secret() });
        let mut builder = self.http().post(url).json(&body);
        if let Some(agent) = self.user_agent() {
            builder = builder.header(USER_AGENT, agent);
        }

        let resp = builder.send().await.map_err(Error::Transport)?;
        let status = resp.status();
        if !status.is_success() {
            let body = read_text(resp).await;
            return Err(Error::AuthFailed {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        let body = read_text(resp).await;
        let parsed: AuthResponse = serde_json::from_str(&body).unwrap_or_default();
        let sid = parsed
            .session
            .sid
            .filter(|sid| !sid.is_empty())
            .ok_or(Error::SessionMissing)?;

        self.session().replace(SecretString::from(sid));
        info!("authenticated with appliance");
        Ok(())
    }

    /// End the current session on the appliance.
    ///
    /// `401`, `404`, and `410` mean the session is already gone and count as
    /// success and clear the local session id. Any other status leaves it
    /// in place so the logout can be retried or the session handed off.
    pub async fn end_session(&self) -> Result<(), Error> {
        if !self.session().is_active() {
            debug!("no active session, skipping logout");
            return Ok(());
        }

        let resp = self.delete(AUTH_PATH).await?;
        expect_status(
            resp,
            &[
                StatusCode::OK,
                StatusCode::NO_CONTENT,
                StatusCode::UNAUTHORIZED,
                StatusCode::NOT_FOUND,
                StatusCode::GONE,
            ],
            "204",
        )
        .await?;

        self.session().clear();
        info!("session ended");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_starts_empty() {
        let session = Session::default();
        assert!(!session.is_active());
        assert!(session.current().is_none());
    }

    #[test]
    fn replace_then_clear() {
        let session = Session::new(None);
        session.replace(SecretString::from("sid-1".to_owned()));
        assert_eq!(
            session.current().map(|s| s.expose_secret().to_owned()),
            Some("sid-1".to_owned())
        );
        session.clear();
        assert!(!session.is_active());
    }

    #[test]
    fn concurrent_readers_see_whole_ids() {
        let session = Session::new(Some(SecretString::from("sid-0000".to_owned())));
        let written: Vec<String> = (0..200).map(|i| format!("sid-{i:04}")).collect();

        std::thread::scope(|s| {
            s.spawn(|| {
                for sid in &written {
                    session.replace(SecretString::from(sid.clone()));
                }
            });
            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..500 {
                        let sid = session.current().expect("never cleared");
                        let sid = sid.expose_secret();
                        assert!(written.iter().any(|w| w == sid), "torn read: {sid}");
                    }
                });
            }
        });

        assert_eq!(
            session.current().map(|s| s.expose_secret().to_owned()),
            Some("sid-0199".to_owned())
        );
    }

    #[test]
    fn auth_response_tolerates_missing_fields() {
        let parsed: AuthResponse = serde_json::from_str("{}").expect("empty object parses");
        assert!(parsed.session.sid.is_none());

        let parsed: AuthResponse =
            serde_json::from_str(r#"{"session":{"valid":true,"sid":"abc"}}"#).expect("parses");
        assert_eq!(parsed.session.sid.as_deref(), Some("abc"));
    }
}
