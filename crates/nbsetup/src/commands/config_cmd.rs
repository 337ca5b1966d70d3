//! Config subcommand handlers.

use std::collections::HashMap;
use std::path::PathBuf;

use dialoguer::{Input, Select};
use secrecy::SecretString;

use nbsetup_config::{DEFAULT_TEMPLATE_DIR, Defaults, store_token};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// Format config for display, masking tokens.
fn format_config_redacted(cfg: &Config) -> String {
    use std::fmt::Write;
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "color = \"{}\"", cfg.defaults.color);
    let _ = writeln!(out, "insecure = {}", cfg.defaults.insecure);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);

    let mut names: Vec<_> = cfg.profiles.keys().collect();
    names.sort();
    for name in names {
        let p = &cfg.profiles[name];
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "url = \"{}\"", p.url);
        if p.token.is_some() {
            let _ = writeln!(out, "token = \"****\"");
        }
        if let Some(ref env) = p.token_env {
            let _ = writeln!(out, "token_env = \"{env}\"");
        }
        if let Some(ref dir) = p.template_dir {
            let _ = writeln!(out, "template_dir = \"{}\"", dir.display());
        }
        if let Some(ref ca) = p.ca_cert {
            let _ = writeln!(out, "ca_cert = \"{}\"", ca.display());
        }
        if let Some(insecure) = p.insecure {
            let _ = writeln!(out, "insecure = {insecure}");
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
    }

    out
}

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn prompt_token() -> Result<String, CliError> {
    let token = rpassword::prompt_password("API token: ").map_err(prompt_err)?;
    if token.is_empty() {
        return Err(CliError::Validation {
            field: "token".into(),
            reason: "API token cannot be empty".into(),
        });
    }
    Ok(token)
}

fn profile_not_found(cfg: &Config, name: String) -> CliError {
    CliError::ProfileNotFound {
        name,
        available: config::profile_names(cfg),
    }
}

/// Where `config init` puts the token.
enum TokenStorage {
    Keyring(String),
    Plaintext(String),
    EnvVar(String),
}

fn prompt_token_storage() -> Result<TokenStorage, CliError> {
    let choices = &[
        "Store in system keyring (recommended)",
        "Read from an environment variable",
        "Save to config file (plaintext)",
    ];
    let selection = Select::new()
        .with_prompt("Where should the API token come from?")
        .items(choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    Ok(match selection {
        0 => TokenStorage::Keyring(prompt_token()?),
        1 => TokenStorage::EnvVar(
            Input::new()
                .with_prompt("Environment variable")
                .default("NETBOX_TOKEN".into())
                .interact_text()
                .map_err(prompt_err)?,
        ),
        _ => TokenStorage::Plaintext(prompt_token()?),
    })
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init(),

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = config::load_config_or_default();
            output::print_output(&format_config_redacted(&cfg), global.quiet);
            Ok(())
        }

        // ── Profiles ────────────────────────────────────────────────
        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: nbsetup config init");
            } else {
                let mut names: Vec<_> = cfg.profiles.keys().collect();
                names.sort();
                for name in names {
                    let marker = if name == default { " *" } else { "" };
                    println!("{name}{marker}");
                }
            }
            Ok(())
        }

        // ── Use <name> ─────────────────────────────────────────────
        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();
            if !cfg.profiles.contains_key(&name) {
                return Err(profile_not_found(&cfg, name));
            }
            cfg.default_profile = Some(name.clone());
            config::save_config(&cfg)?;
            eprintln!("✓ Default profile set to '{name}'");
            Ok(())
        }

        // ── SetToken ────────────────────────────────────────────────
        ConfigCommand::SetToken => {
            let cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);
            if !cfg.profiles.contains_key(&profile_name) {
                return Err(profile_not_found(&cfg, profile_name));
            }

            let token = SecretString::from(prompt_token()?);
            store_token(&profile_name, &token)?;
            eprintln!("✓ API token for '{profile_name}' stored in system keyring");
            Ok(())
        }
    }
}

/// Interactive wizard that writes a fresh config with one profile.
fn init() -> Result<(), CliError> {
    let config_path = config::config_path();
    eprintln!("✨ nbsetup configuration wizard");
    eprintln!("   Config path: {}\n", config_path.display());

    let profile_name: String = Input::new()
        .with_prompt("Profile name")
        .default("default".into())
        .interact_text()
        .map_err(prompt_err)?;

    let url: String = Input::new()
        .with_prompt("NetBox URL")
        .default("https://netbox.local".into())
        .interact_text()
        .map_err(prompt_err)?;
    nbsetup_config::parse_url(&url)?;

    let template_dir: String = Input::new()
        .with_prompt("Device-type template directory")
        .default(DEFAULT_TEMPLATE_DIR.into())
        .interact_text()
        .map_err(prompt_err)?;

    let mut profile = Profile {
        url,
        template_dir: Some(PathBuf::from(template_dir)),
        ..Profile::default()
    };
    match prompt_token_storage()? {
        TokenStorage::Keyring(token) => {
            store_token(&profile_name, &SecretString::from(token))?;
            eprintln!("   ✓ API token stored in system keyring");
        }
        TokenStorage::EnvVar(name) => profile.token_env = Some(name),
        TokenStorage::Plaintext(token) => profile.token = Some(token),
    }

    let mut profiles = HashMap::new();
    profiles.insert(profile_name.clone(), profile);
    let cfg = Config {
        default_profile: Some(profile_name.clone()),
        defaults: Defaults::default(),
        profiles,
    };

    let written = config::save_config(&cfg)?;
    eprintln!("\n✓ Configuration written to {}", written.display());
    eprintln!("  Active profile: {profile_name}");
    eprintln!("\n  Check an input directory with: nbsetup validate <DIR>");
    Ok(())
}
