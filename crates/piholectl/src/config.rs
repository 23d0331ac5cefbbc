//! CLI overrides on top of `pihole-config`.
//!
//! The config crate resolves file, env and keyring; this module layers
//! global flags (`--url`, `--ca-file`, `-k`, `--timeout`) over the result
//! and fills in the default User-Agent.

use pihole_config::{Config, ConfigError, Profile};
use pihole_core::ConnectionProfile;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// User-Agent sent when neither the profile nor the defaults name one.
pub fn default_user_agent() -> String {
    format!("piholectl/{}", env!("CARGO_PKG_VERSION"))
}

/// Load the config file, falling back to defaults when it does not exist.
pub fn load() -> Result<Config, CliError> {
    Ok(pihole_config::load_config()?)
}

/// Apply flag overrides to a resolved profile.
pub fn apply_overrides(mut profile: Profile, global: &GlobalOpts) -> Profile {
    if let Some(ref url) = global.url {
        profile.url.clone_from(url);
    }
    if let Some(ref ca) = global.ca_file {
        profile.ca_file = Some(ca.clone());
    }
    if global.insecure {
        profile.insecure_skip_verify = Some(true);
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }
    profile
}

/// Resolve the active profile and translate it for the core.
pub fn build_connection_profile(
    cfg: &Config,
    global: &GlobalOpts,
) -> Result<(String, ConnectionProfile), CliError> {
    let (name, profile) = cfg
        .resolve_profile(global.profile.as_deref())
        .map_err(|e| match e {
            ConfigError::UnknownProfile { name } => CliError::ProfileNotFound {
                name,
                available: available_profiles(cfg),
            },
            other => other.into(),
        })?;
    let profile = apply_overrides(profile, global);

    let mut conn = pihole_config::profile_to_connection(&profile, &name, &cfg.defaults)?;
    if conn.user_agent.is_none() {
        conn.user_agent = Some(default_user_agent());
    }
    tracing::debug!(profile = %name, url = %conn.url, "resolved connection profile");
    Ok((name, conn))
}

fn available_profiles(cfg: &Config) -> String {
    if cfg.profiles.is_empty() {
        return "(none)".into();
    }
    cfg.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::cli::Cli;

    fn global(args: &[&str]) -> GlobalOpts {
        let mut argv = vec!["piholectl"];
        argv.extend_from_slice(args);
        argv.extend_from_slice(&["dns", "list"]);
        match Cli::try_parse_from(argv) {
            Ok(cli) => cli.global,
            Err(e) => panic!("parse failed: {e}"),
        }
    }

    #[test]
    fn flags_override_profile() {
        let g = global(&["--url", "https://dns.lan", "-k", "--timeout", "5"]);
        let profile = apply_overrides(Profile::default(), &g);
        assert_eq!(profile.url, "https://dns.lan");
        assert_eq!(profile.insecure_skip_verify, Some(true));
        assert_eq!(profile.timeout, Some(5));
    }

    #[test]
    fn absent_flags_leave_profile_alone() {
        let base = Profile {
            url: "http://10.0.0.2".into(),
            insecure_skip_verify: Some(false),
            ..Profile::default()
        };
        let profile = apply_overrides(base, &global(&[]));
        assert_eq!(profile.url, "http://10.0.0.2");
        assert_eq!(profile.insecure_skip_verify, Some(false));
        assert_eq!(profile.timeout, None);
    }

    #[test]
    fn unknown_profile_lists_alternatives() {
        let mut cfg = Config::default();
        cfg.profiles.insert("home".into(), Profile::default());
        let err = build_connection_profile(&cfg, &global(&["-p", "office"]))
            .err()
            .map(|e| e.to_string());
        assert_eq!(
            err.as_deref(),
            Some("Profile 'office' not found in configuration")
        );
        assert_eq!(available_profiles(&cfg), "home");
    }

    #[test]
    fn user_agent_names_the_tool() {
        assert!(default_user_agent().starts_with("piholectl/"));
    }
}
