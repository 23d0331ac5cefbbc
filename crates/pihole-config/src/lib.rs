//! Shared configuration for Pi-hole tools.
//!
//! TOML profiles layered with `PIHOLE_*` environment variables, credential
//! resolution (env + keyring + plaintext), CA bundle loading, and
//! translation to `pihole_core::ConnectionProfile`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use pihole_core::ConnectionProfile;

/// Prefix for every environment override.
pub const ENV_PREFIX: &str = "PIHOLE_";

/// Admin password, consulted after `password_env`.
pub const PASSWORD_ENV: &str = "PIHOLE_PASSWORD";

/// A session created and owned by some other process.
pub const SESSION_ENV: &str = "__PIHOLE_SESSION_ID";

/// Keyring service name; the entry user is the profile name.
pub const KEYRING_SERVICE: &str = "pihole";

pub const DEFAULT_URL: &str = "http://pi.hole";

/// Profile keys a bare `PIHOLE_<KEY>` variable overrides.
const PROFILE_ENV_KEYS: [&str; 5] = [
    "url",
    "ca_file",
    "user_agent",
    "timeout",
    "insecure_skip_verify",
];

const PEM_CERT_HEADER: &str = "-----BEGIN CERTIFICATE-----";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no password or session id configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{name}' not found in config")]
    UnknownProfile { name: String },

    #[error("keyring error: {0}")]
    Keyring(String),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when none is named on the command line.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named appliance profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default)]
    pub insecure_skip_verify: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,

    pub user_agent: Option<String>,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            insecure_skip_verify: false,
            timeout: default_timeout(),
            user_agent: None,
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_url() -> String {
    DEFAULT_URL.into()
}

/// A named appliance profile.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Profile {
    /// Appliance base URL.
    #[serde(default = "default_url")]
    pub url: String,

    /// Admin password (plaintext, prefer keyring or env var).
    pub password: Option<String>,

    /// Environment variable holding the admin password.
    pub password_env: Option<String>,

    /// PEM bundle of extra CA certificates.
    pub ca_file: Option<PathBuf>,

    /// Skip TLS verification; overrides `defaults.insecure_skip_verify`.
    pub insecure_skip_verify: Option<bool>,

    pub user_agent: Option<String>,

    /// Request timeout in seconds; overrides `defaults.timeout`.
    pub timeout: Option<u64>,

    /// Existing session to reuse instead of logging in.
    pub session_id: Option<String>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            url: default_url(),
            password: None,
            password_env: None,
            ca_file: None,
            insecure_skip_verify: None,
            user_agent: None,
            timeout: None,
            session_id: None,
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("net", "pi-hole", "piholectl").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("piholectl");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load config from `path` + environment. A missing file yields defaults.
///
/// Nested keys use a double underscore: `PIHOLE_DEFAULTS__TIMEOUT=60`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__").ignore(&PROFILE_ENV_KEYS));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Profile selection ───────────────────────────────────────────────

impl Config {
    /// Name of the profile to use: explicit, then `default_profile`, then `"default"`.
    pub fn profile_name(&self, requested: Option<&str>) -> String {
        requested
            .map(str::to_owned)
            .or_else(|| self.default_profile.clone())
            .unwrap_or_else(|| "default".into())
    }

    /// Select a profile and apply `PIHOLE_*` overrides to it.
    ///
    /// An absent `"default"` profile is synthesized so that a purely
    /// env-driven setup works without any config file.
    pub fn resolve_profile(&self, requested: Option<&str>) -> Result<(String, Profile), ConfigError> {
        let name = self.profile_name(requested);
        let base = match self.profiles.get(&name) {
            Some(p) => p.clone(),
            None if requested.is_none() => Profile::default(),
            None => return Err(ConfigError::UnknownProfile { name }),
        };
        let profile = apply_env(base)?;
        Ok((name, profile))
    }
}

/// Overlay `PIHOLE_URL`, `PIHOLE_CA_FILE` and friends onto a profile.
pub fn apply_env(profile: Profile) -> Result<Profile, ConfigError> {
    let profile = Figment::new()
        .merge(Serialized::defaults(profile))
        .merge(Env::prefixed(ENV_PREFIX).only(&PROFILE_ENV_KEYS))
        .extract()?;
    Ok(profile)
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve the admin password.
///
/// Order: the profile's `password_env` variable, `PIHOLE_PASSWORD`, the
/// system keyring entry `pihole/<profile>`, the plaintext profile value.
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Option<SecretString> {
    // 1. Profile's password_env → env var lookup
    if let Some(ref env_name) = profile.password_env {
        if let Ok(val) = std::env::var(env_name) {
            debug!(env = %env_name, "password from profile env var");
            return Some(SecretString::from(val));
        }
    }

    // 2. Well-known env var
    if let Ok(val) = std::env::var(PASSWORD_ENV) {
        debug!("password from {PASSWORD_ENV}");
        return Some(SecretString::from(val));
    }

    // 3. System keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, profile_name) {
        if let Ok(secret) = entry.get_password() {
            debug!(profile = profile_name, "password from keyring");
            return Some(SecretString::from(secret));
        }
    }

    // 4. Plaintext in config
    profile.password.clone().map(SecretString::from)
}

/// An externally managed session: `__PIHOLE_SESSION_ID`, then the profile.
pub fn resolve_session_id(profile: &Profile) -> Option<SecretString> {
    std::env::var(SESSION_ENV)
        .ok()
        .or_else(|| profile.session_id.clone())
        .filter(|sid| !sid.is_empty())
        .map(SecretString::from)
}

/// Store a password in the system keyring for `profile_name`.
pub fn store_password(profile_name: &str, password: &str) -> Result<(), ConfigError> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, profile_name)
        .map_err(|e| ConfigError::Keyring(e.to_string()))?;
    entry
        .set_password(password)
        .map_err(|e| ConfigError::Keyring(e.to_string()))
}

// ── CA material ─────────────────────────────────────────────────────

/// Read a CA bundle, rejecting files that hold no PEM certificate.
pub fn read_ca_file(path: &Path) -> Result<Vec<u8>, ConfigError> {
    let pem = std::fs::read(path)?;
    let text = String::from_utf8_lossy(&pem);
    if !text.contains(PEM_CERT_HEADER) {
        return Err(ConfigError::Validation {
            field: "ca_file".into(),
            reason: format!("{} contains no PEM certificate", path.display()),
        });
    }
    Ok(pem)
}

// ── Translation ─────────────────────────────────────────────────────

/// Build a `ConnectionProfile` from a resolved profile.
///
/// A missing password is only an error when no session id is available.
pub fn profile_to_connection(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<ConnectionProfile, ConfigError> {
    let url: url::Url = profile.url.parse().map_err(|_| ConfigError::Validation {
        field: "url".into(),
        reason: format!("invalid URL: {}", profile.url),
    })?;

    let session_id = resolve_session_id(profile);
    let password = resolve_password(profile, profile_name);
    if session_id.is_none() && password.is_none() {
        return Err(ConfigError::NoCredentials {
            profile: profile_name.into(),
        });
    }

    let ca_pem = profile.ca_file.as_deref().map(read_ca_file).transpose()?;

    let mut conn = ConnectionProfile::new(url);
    conn.password = password;
    conn.session_id = session_id;
    conn.ca_pem = ca_pem;
    conn.insecure_tls = profile
        .insecure_skip_verify
        .unwrap_or(defaults.insecure_skip_verify);
    conn.user_agent = profile
        .user_agent
        .clone()
        .or_else(|| defaults.user_agent.clone());
    conn.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    Ok(conn)
}

#[cfg(test)]
mod tests {
    use figment::Jail;
    use secrecy::ExposeSecret;

    use super::*;

    const CERT: &str = "-----BEGIN CERTIFICATE-----\nMIIB\n-----END CERTIFICATE-----\n";

    fn jail_err(e: impl std::fmt::Display) -> figment::Error {
        figment::Error::from(e.to_string())
    }

    #[test]
    fn missing_file_yields_defaults() {
        Jail::expect_with(|_jail| {
            let cfg = load_config_from(Path::new("absent.toml")).map_err(jail_err)?;
            assert_eq!(cfg.default_profile.as_deref(), Some("default"));
            assert_eq!(cfg.defaults.timeout, 30);
            assert!(cfg.profiles.is_empty());

            let (name, profile) = cfg.resolve_profile(None).map_err(jail_err)?;
            assert_eq!(name, "default");
            assert_eq!(profile.url, DEFAULT_URL);
            Ok(())
        });
    }

    #[test]
    fn file_profiles_and_nested_env_overrides() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                default_profile = "lab"

                [defaults]
                timeout = 10

                [profiles.lab]
                url = "https://pihole.lab"
                password_env = "LAB_PW"
                "#,
            )?;
            jail.set_env("PIHOLE_DEFAULTS__TIMEOUT", "45");

            let cfg = load_config_from(Path::new("config.toml")).map_err(jail_err)?;
            assert_eq!(cfg.defaults.timeout, 45);

            let (name, profile) = cfg.resolve_profile(None).map_err(jail_err)?;
            assert_eq!(name, "lab");
            assert_eq!(profile.url, "https://pihole.lab");
            Ok(())
        });
    }

    #[test]
    fn legacy_env_vars_override_profile() {
        Jail::expect_with(|jail| {
            jail.create_file("ca.pem", CERT)?;
            jail.set_env("PIHOLE_URL", "https://10.0.0.2");
            jail.set_env("PIHOLE_CA_FILE", "ca.pem");
            jail.set_env("PIHOLE_PASSWORD", "from-env");

            let cfg = Config::default();
            let (name, profile) = cfg.resolve_profile(None).map_err(jail_err)?;
            assert_eq!(profile.url, "https://10.0.0.2");
            // The password is never copied into the plaintext slot.
            assert!(profile.password.is_none());

            let conn = profile_to_connection(&profile, &name, &cfg.defaults).map_err(jail_err)?;
            assert_eq!(conn.url.as_str(), "https://10.0.0.2/");
            assert_eq!(
                conn.password.as_ref().map(|p| p.expose_secret().to_owned()),
                Some("from-env".to_owned())
            );
            assert_eq!(conn.ca_pem.as_deref(), Some(CERT.as_bytes()));
            Ok(())
        });
    }

    #[test]
    fn profile_password_env_wins_over_global_env() {
        Jail::expect_with(|jail| {
            jail.set_env("LAB_PW", "specific");
            jail.set_env("PIHOLE_PASSWORD", "global");
            let profile = Profile {
                password_env: Some("LAB_PW".into()),
                password: Some("plaintext".into()),
                ..Profile::default()
            };
            let pw = resolve_password(&profile, "lab").map(|p| p.expose_secret().to_owned());
            assert_eq!(pw.as_deref(), Some("specific"));
            Ok(())
        });
    }

    #[test]
    fn session_env_is_enough_without_password() {
        Jail::expect_with(|jail| {
            jail.set_env(SESSION_ENV, "external-sid");
            let cfg = Config::default();
            let (name, profile) = cfg.resolve_profile(None).map_err(jail_err)?;

            let conn = profile_to_connection(&profile, &name, &cfg.defaults).map_err(jail_err)?;
            assert!(conn.password.is_none());
            assert_eq!(
                conn.session_id.map(|s| s.expose_secret().to_owned()),
                Some("external-sid".to_owned())
            );
            Ok(())
        });
    }

    #[test]
    fn unknown_named_profile_is_an_error() {
        Jail::expect_with(|_jail| {
            let cfg = Config::default();
            let result = cfg.resolve_profile(Some("nope"));
            assert!(matches!(result, Err(ConfigError::UnknownProfile { .. })));
            Ok(())
        });
    }

    #[test]
    fn invalid_url_is_rejected() {
        let profile = Profile {
            url: "not a url".into(),
            password: Some("pw".into()),
            ..Profile::default()
        };
        let result = profile_to_connection(&profile, "bad", &Defaults::default());
        assert!(matches!(result, Err(ConfigError::Validation { ref field, .. }) if field == "url"));
    }

    #[test]
    fn non_pem_ca_file_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("ca.der");
        std::fs::write(&path, [0x30, 0x82, 0x01]).expect("write");

        let result = read_ca_file(&path);
        assert!(matches!(result, Err(ConfigError::Validation { ref field, .. }) if field == "ca_file"));
    }

    #[test]
    fn save_then_load_round_trips_profiles() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.profiles.insert(
            "home".into(),
            Profile {
                url: "https://pi.home".into(),
                insecure_skip_verify: Some(true),
                ..Profile::default()
            },
        );
        save_config_to(&cfg, &path).expect("save");

        let text = std::fs::read_to_string(&path).expect("read back");
        let parsed: Config = toml::from_str(&text).expect("valid toml");
        let home = parsed.profiles.get("home").expect("profile saved");
        assert_eq!(home.url, "https://pi.home");
        assert_eq!(home.insecure_skip_verify, Some(true));
    }
}
