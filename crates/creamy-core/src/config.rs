// ── Runtime connection configuration ──
//
// Describes *how* to reach the router console and which gateways to
// offer. Built by the binary from `creamy-config`; core never reads
// config files.

use std::time::Duration;

use creamy_api::{Credentials, TlsMode, TransportConfig};
use url::Url;

use crate::model::Gateway;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed certs). Default for router consoles.
    #[default]
    DangerAcceptInvalid,
}

/// Everything the selector needs to talk to one console.
#[derive(Debug, Clone)]
pub struct SelectorConfig {
    /// Console URL (e.g., `https://192.168.1.1`).
    pub url: Url,
    pub credentials: Credentials,
    /// Console interface whose rule table holds the steering rules.
    pub interface: String,
    /// Gateways offered to clients, in display order.
    pub gateways: Vec<Gateway>,
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
    /// `Referer` header value for console requests.
    pub referrer: Option<String>,
}

impl SelectorConfig {
    pub(crate) fn transport(&self) -> TransportConfig {
        let tls = match &self.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        };
        TransportConfig {
            tls,
            timeout: self.timeout,
            cookie_jar: None,
            referrer: self.referrer.clone(),
        }
        .with_cookie_jar()
    }
}
