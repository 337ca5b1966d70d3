// ── Runtime connection configuration ──
//
// These types describe *how* to reach a NetBox instance and where the
// device-type templates live. They carry the token but never touch disk:
// the CLI builds a `ProvisionConfig` from its profile and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use nbsetup_api::{NetBoxClient, TlsMode, TransportConfig};
use secrecy::SecretString;
use url::Url;

use crate::error::CoreError;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed certs on lab instances).
    DangerAcceptInvalid,
}

/// Everything a run needs besides the input document.
#[derive(Debug, Clone)]
pub struct ProvisionConfig {
    /// NetBox URL (e.g., `https://netbox.lab:8000`).
    pub url: Url,
    /// API token.
    pub token: SecretString,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Request timeout. Expiry is fatal for the run.
    pub timeout: Duration,
    /// Directory holding device-type template files.
    pub template_dir: PathBuf,
}

impl ProvisionConfig {
    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: match &self.tls {
                TlsVerification::SystemDefaults => TlsMode::System,
                TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
                TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
            },
            timeout: self.timeout,
        }
    }

    /// Build the authenticated client for this configuration.
    pub fn connect(&self) -> Result<NetBoxClient, CoreError> {
        Ok(NetBoxClient::from_token(
            self.url.as_str(),
            &self.token,
            &self.transport(),
        )?)
    }
}
