//! Configuration for the gateway picker.
//!
//! Defaults, then an optional TOML file, then `CREAMY_GATEWAY_*`
//! environment variables, each layer overriding the last. The result is
//! translated into a [`creamy_core::SelectorConfig`] for the core and a
//! handful of server settings for the binary.

use std::net::{Ipv6Addr, SocketAddr};
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
use tracing::warn;

use creamy_core::{Credentials, Gateway, SelectorConfig, TlsVerification};

/// Prefix of every environment variable the service reads.
pub const ENV_PREFIX: &str = "CREAMY_GATEWAY_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl ConfigError {
    fn validation(field: &str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// ── Settings ────────────────────────────────────────────────────────

/// Flat settings, one field per environment variable
/// (`CREAMY_GATEWAY_REMOTE_HOST` → `remote_host`).
///
/// The password is held as a [`SecretString`]: it is redacted from
/// `Debug` output and never serialized.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Console base URL (e.g., "https://192.168.1.1").
    pub remote_host: String,
    pub remote_username: String,
    /// Console password (plaintext in file or env).
    #[serde(skip_serializing)]
    pub remote_password: SecretString,
    /// Interface whose rule table holds the steering rules, e.g. "lan".
    pub remote_interface: String,
    /// `Referer` sent with every console request. Some consoles refuse
    /// form posts without one.
    pub remote_referrer: Option<String>,
    /// Skip TLS verification. Router consoles are usually self-signed.
    pub remote_insecure: bool,
    /// Path to a CA certificate used instead of skipping verification.
    pub remote_ca_cert: Option<PathBuf>,
    /// Console request timeout, in seconds.
    pub remote_timeout: u64,

    /// Comma-separated gateway names as the console knows them.
    pub gateway_names: Option<ListValue>,
    /// Comma-separated display labels, positionally matching the names.
    pub gateway_labels: Option<ListValue>,
    /// Comma-separated status-page names, positionally matching the names.
    pub gateway_status_names: Option<ListValue>,
    /// Gateways as TOML tables. Take precedence over the lists.
    pub gateways: Vec<GatewayEntry>,

    /// Port to listen on (all interfaces).
    pub port: u16,
    /// Full listen address. Overrides `port`.
    pub listen: Option<SocketAddr>,
    /// Use the first `X-Forwarded-For` address as the client's source.
    pub trust_forwarded_headers: bool,
    /// Log every console request and response.
    pub debug: bool,
    /// Seconds to wait for in-flight requests on shutdown.
    pub shutdown_grace: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            remote_host: String::new(),
            remote_username: String::new(),
            remote_password: SecretString::default(),
            remote_interface: String::new(),
            remote_referrer: None,
            remote_insecure: true,
            remote_ca_cert: None,
            remote_timeout: 30,
            gateway_names: None,
            gateway_labels: None,
            gateway_status_names: None,
            gateways: Vec::new(),
            port: 8080,
            listen: None,
            trust_forwarded_headers: false,
            debug: false,
            shutdown_grace: 10,
        }
    }
}

/// One `[[gateways]]` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct GatewayEntry {
    pub name: String,
    pub label: Option<String>,
    pub status_name: Option<String>,
}

/// A list written either as a TOML array or as one comma-separated
/// string (the only form an environment variable can take).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ListValue {
    Items(Vec<String>),
    Joined(String),
}

impl ListValue {
    pub fn items(&self) -> Vec<String> {
        match self {
            Self::Items(items) => items.iter().map(|s| s.trim().to_owned()).collect(),
            Self::Joined(joined) => joined
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
                .collect(),
        }
    }
}

fn list(value: Option<&ListValue>) -> Vec<String> {
    value.map(ListValue::items).unwrap_or_default()
}

impl Settings {
    /// Gateways in display order.
    ///
    /// `[[gateways]]` tables win when present. Otherwise the name list is
    /// zipped with the label and status-name lists; a label list of the
    /// wrong length is ignored in favour of the names, and missing status
    /// names default to the names.
    pub fn gateway_list(&self) -> Vec<Gateway> {
        if !self.gateways.is_empty() {
            return self
                .gateways
                .iter()
                .map(|entry| {
                    let gateway = Gateway::new(
                        entry.name.clone(),
                        entry.label.clone().unwrap_or_else(|| entry.name.clone()),
                    );
                    match &entry.status_name {
                        Some(status_name) => gateway.with_status_name(status_name.clone()),
                        None => gateway,
                    }
                })
                .collect();
        }

        let names = list(self.gateway_names.as_ref());
        let mut labels = list(self.gateway_labels.as_ref());
        if labels.len() != names.len() {
            if !labels.is_empty() {
                warn!(
                    names = names.len(),
                    labels = labels.len(),
                    "gateway label and name count mismatch, using names as labels"
                );
            }
            labels.clone_from(&names);
        }

        let status_names = list(self.gateway_status_names.as_ref());
        if !status_names.is_empty() && status_names.len() != names.len() {
            warn!(
                names = names.len(),
                status_names = status_names.len(),
                "gateway status name count mismatch, unmatched gateways use their names"
            );
        }

        names
            .into_iter()
            .zip(labels)
            .enumerate()
            .map(|(i, (name, label))| {
                let gateway = Gateway::new(name, label);
                match status_names.get(i) {
                    Some(status_name) => gateway.with_status_name(status_name.clone()),
                    None => gateway,
                }
            })
            .collect()
    }

    /// Address the HTTP server binds to.
    pub fn listen_addr(&self) -> SocketAddr {
        self.listen
            .unwrap_or_else(|| SocketAddr::from((Ipv6Addr::UNSPECIFIED, self.port)))
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace)
    }

    /// Validate and translate into the core's connection config.
    pub fn selector_config(&self) -> Result<SelectorConfig, ConfigError> {
        if self.remote_host.trim().is_empty() {
            return Err(ConfigError::validation(
                "remote_host",
                format!("not set (use {ENV_PREFIX}REMOTE_HOST)"),
            ));
        }
        let url: url::Url = self.remote_host.trim().parse().map_err(|_| {
            ConfigError::validation("remote_host", format!("invalid URL: {}", self.remote_host))
        })?;

        if self.remote_interface.trim().is_empty() {
            return Err(ConfigError::validation(
                "remote_interface",
                format!("not set (use {ENV_PREFIX}REMOTE_INTERFACE)"),
            ));
        }

        let gateways = self.gateway_list();
        if gateways.is_empty() {
            return Err(ConfigError::validation(
                "gateways",
                format!("no gateways configured (use {ENV_PREFIX}GATEWAY_NAMES)"),
            ));
        }

        let tls = if let Some(ref ca_path) = self.remote_ca_cert {
            TlsVerification::CustomCa(ca_path.clone())
        } else if self.remote_insecure {
            TlsVerification::DangerAcceptInvalid
        } else {
            TlsVerification::SystemDefaults
        };

        Ok(SelectorConfig {
            url,
            credentials: Credentials::new(
                self.remote_username.clone(),
                self.remote_password.clone(),
            ),
            interface: self.remote_interface.trim().to_owned(),
            gateways,
            tls,
            timeout: Duration::from_secs(self.remote_timeout),
            referrer: self.remote_referrer.clone().filter(|r| !r.is_empty()),
        })
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the default config file path via XDG / platform conventions.
pub fn config_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "creamy-gateway", "creamy-gateway")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

// ── Loading ─────────────────────────────────────────────────────────

/// Layered figment: defaults, then `file` (or the platform config file
/// when `None`), then environment.
pub fn figment(file: Option<&Path>) -> Figment {
    let mut figment = Figment::new().merge(Serialized::defaults(Settings::default()));
    if let Some(path) = file.map(Path::to_path_buf).or_else(config_path) {
        figment = figment.merge(Toml::file(path));
    }
    figment.merge(Env::prefixed(ENV_PREFIX))
}

/// Load settings from file + environment. A missing file is not an error.
pub fn load_settings(file: Option<&Path>) -> Result<Settings, ConfigError> {
    Ok(figment(file).extract()?)
}
