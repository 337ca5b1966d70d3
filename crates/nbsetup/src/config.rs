//! CLI configuration: thin wrapper around `nbsetup_config`.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides (--url,
//! --token, --insecure, --timeout) and the run's --template-dir.

use std::path::{Path, PathBuf};
use std::time::Duration;

use secrecy::SecretString;

use nbsetup_config::{DEFAULT_TEMPLATE_DIR, Defaults};
use nbsetup_core::{ProvisionConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use nbsetup_config::{Config, Profile, config_path, load_config_or_default, save_config};

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    config.profile_name(global.profile.as_deref())
}

/// Comma-separated profile names, sorted.
pub fn profile_names(config: &Config) -> String {
    let mut names: Vec<&str> = config.profiles.keys().map(String::as_str).collect();
    if names.is_empty() {
        return "(none)".into();
    }
    names.sort_unstable();
    names.join(", ")
}

/// Build the `ProvisionConfig` for a run from the config file, the active
/// profile, and CLI overrides.
pub fn build_provision_config(
    global: &GlobalOpts,
    template_dir: Option<&Path>,
) -> Result<ProvisionConfig, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    if let Some(profile) = cfg.profiles.get(&profile_name) {
        return resolve_profile(profile, &profile_name, &cfg.defaults, global, template_dir);
    }

    // An explicitly requested profile must exist.
    if global.profile.is_some() {
        return Err(CliError::ProfileNotFound {
            name: profile_name,
            available: profile_names(&cfg),
        });
    }

    // No profile -- fall back to flags / env vars alone.
    let url = global.url.clone().ok_or_else(|| CliError::NoConfig {
        path: config_path().display().to_string(),
    })?;
    if global.token.is_none() {
        return Err(CliError::NoToken {
            profile: profile_name,
        });
    }
    let profile = Profile {
        url,
        ..Profile::default()
    };
    resolve_profile(&profile, &profile_name, &cfg.defaults, global, template_dir)
}

/// Translate a `Profile` + global flags into a `ProvisionConfig`.
///
/// CLI flag overrides take priority over profile values, which take
/// priority over `[defaults]`.
pub fn resolve_profile(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
    global: &GlobalOpts,
    template_dir: Option<&Path>,
) -> Result<ProvisionConfig, CliError> {
    let url = nbsetup_config::parse_url(global.url.as_deref().unwrap_or(&profile.url))?;

    let token = match global.token {
        Some(ref token) => SecretString::from(token.clone()),
        None => nbsetup_config::resolve_token(profile, profile_name)?,
    };

    let tls = if global.insecure {
        TlsVerification::DangerAcceptInvalid
    } else {
        nbsetup_config::tls_for(profile, defaults)
    };

    let timeout = global
        .timeout
        .or(profile.timeout)
        .unwrap_or(defaults.timeout);

    let template_dir = template_dir
        .map(Path::to_path_buf)
        .or_else(|| profile.template_dir.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_TEMPLATE_DIR));

    Ok(ProvisionConfig {
        url,
        token,
        tls,
        timeout: Duration::from_secs(timeout),
        template_dir,
    })
}
