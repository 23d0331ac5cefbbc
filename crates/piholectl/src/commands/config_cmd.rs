//! Config subcommand handlers.

use dialoguer::{Input, Select};
use serde::Serialize;
use tabled::Tabled;

use pihole_config::{Config, Profile};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

const MASK: &str = "****";

// ── Helpers ─────────────────────────────────────────────────────────

/// Replace stored secrets with a mask.
fn redact(mut cfg: Config) -> Config {
    for profile in cfg.profiles.values_mut() {
        if profile.password.is_some() {
            profile.password = Some(MASK.into());
        }
        if profile.session_id.is_some() {
            profile.session_id = Some(MASK.into());
        }
    }
    cfg
}

/// Format an (already redacted) config as TOML-like text.
fn format_config(cfg: &Config) -> String {
    use std::fmt::Write;
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(
        out,
        "insecure_skip_verify = {}",
        cfg.defaults.insecure_skip_verify
    );
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);
    if let Some(ref ua) = cfg.defaults.user_agent {
        let _ = writeln!(out, "user_agent = \"{ua}\"");
    }

    for (name, p) in &cfg.profiles {
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "url = \"{}\"", p.url);
        if let Some(ref pw) = p.password {
            let _ = writeln!(out, "password = \"{pw}\"");
        }
        if let Some(ref env) = p.password_env {
            let _ = writeln!(out, "password_env = \"{env}\"");
        }
        if let Some(ref ca) = p.ca_file {
            let _ = writeln!(out, "ca_file = \"{}\"", ca.display());
        }
        if let Some(insecure) = p.insecure_skip_verify {
            let _ = writeln!(out, "insecure_skip_verify = {insecure}");
        }
        if let Some(ref ua) = p.user_agent {
            let _ = writeln!(out, "user_agent = \"{ua}\"");
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
        if let Some(ref sid) = p.session_id {
            let _ = writeln!(out, "session_id = \"{sid}\"");
        }
    }

    out.trim_end().to_owned()
}

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn prompt_password() -> Result<String, CliError> {
    let pass = rpassword::prompt_password("Admin password: ").map_err(prompt_err)?;
    if pass.is_empty() {
        return Err(CliError::Validation {
            field: "password".into(),
            reason: "password cannot be empty".into(),
        });
    }
    Ok(pass)
}

#[derive(Clone, Serialize, Tabled)]
struct ProfileRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "URL")]
    url: String,
    #[tabled(rename = "Default")]
    default: bool,
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            let config_path = pihole_config::config_path();
            eprintln!("piholectl configuration wizard");
            eprintln!("   Config path: {}\n", config_path.display());

            let mut cfg = config::load()?;

            let profile_name: String = Input::new()
                .with_prompt("Profile name")
                .default(cfg.profile_name(global.profile.as_deref()))
                .interact_text()
                .map_err(prompt_err)?;

            let url: String = Input::new()
                .with_prompt("Pi-hole URL")
                .default(pihole_config::DEFAULT_URL.into())
                .interact_text()
                .map_err(prompt_err)?;
            if url::Url::parse(&url).is_err() {
                return Err(CliError::Validation {
                    field: "url".into(),
                    reason: format!("invalid URL: {url}"),
                });
            }

            let password = prompt_password()?;

            let choices = &[
                "Store in system keyring (recommended)",
                "Save to config file (plaintext)",
            ];
            let selection = Select::new()
                .with_prompt("Where to store the password?")
                .items(choices)
                .default(0)
                .interact()
                .map_err(prompt_err)?;

            let plaintext = if selection == 0 {
                pihole_config::store_password(&profile_name, &password)?;
                eprintln!("   password stored in system keyring");
                None
            } else {
                Some(password)
            };

            let profile = Profile {
                url,
                password: plaintext,
                insecure_skip_verify: global.insecure.then_some(true),
                ..Profile::default()
            };
            cfg.profiles.insert(profile_name.clone(), profile);
            if cfg.default_profile.is_none() || cfg.profiles.len() == 1 {
                cfg.default_profile = Some(profile_name.clone());
            }

            let path = pihole_config::save_config(&cfg)?;
            eprintln!("\nSaved profile '{profile_name}' to {}", path.display());
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = redact(config::load()?);
            let out = output::render_single(&global.output, &cfg, format_config, format_config);
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(
                &pihole_config::config_path().display().to_string(),
                global.quiet,
            );
            Ok(())
        }

        ConfigCommand::SetPassword => {
            let cfg = config::load()?;
            let name = cfg.profile_name(global.profile.as_deref());
            let password = prompt_password()?;
            pihole_config::store_password(&name, &password)?;
            output::print_status(
                &format!("Password for profile '{name}' stored in system keyring"),
                global.quiet,
            );
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = config::load()?;
            let default = cfg.profile_name(None);
            let rows: Vec<ProfileRow> = cfg
                .profiles
                .iter()
                .map(|(name, p)| ProfileRow {
                    name: name.clone(),
                    url: p.url.clone(),
                    default: *name == default,
                })
                .collect();
            let out = output::render_list(
                &global.output,
                &rows,
                ProfileRow::clone,
                |r| r.name.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn show_masks_secrets() {
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "home".into(),
            Profile {
                url: "http://10.0.0.2".into(),
                password: Some("hunter2".into()),
                session_id: Some("abc".into()),
                ..Profile::default()
            },
        );

        let text = format_config(&redact(cfg));
        assert!(!text.contains("hunter2"));
        assert!(!text.contains("\"abc\""));
        assert!(text.contains("[profiles.home]"));
        assert!(text.contains("password = \"****\""));
    }

    #[test]
    fn show_keeps_absent_secrets_absent() {
        let mut cfg = Config::default();
        cfg.profiles.insert("lab".into(), Profile::default());
        let redacted = redact(cfg);
        assert_eq!(redacted.profiles["lab"].password, None);
    }
}
