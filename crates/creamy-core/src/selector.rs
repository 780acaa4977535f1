// ── Gateway selector ──
//
// The service object shared by every request. It owns the one remote
// client and the lock that serializes access to it: the console has no
// transactions, so a rule swap (delete, create, apply, confirm) holds the
// write lock from its first request to its last.

use std::collections::HashMap;
use std::net::IpAddr;

use creamy_api::{AddressMatch, ConsoleClient, FirewallRule, GatewayStatus, RuleDraft};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::config::SelectorConfig;
use crate::error::CoreError;
use crate::model::{Gateway, GatewayView};
use crate::remote::RemoteFirewall;
use crate::rules::{CLEAR_SELECTION, describe_choice, find_managed_rule};

pub struct GatewaySelector<R> {
    remote: RwLock<R>,
    interface: String,
    gateways: Vec<Gateway>,
}

impl GatewaySelector<ConsoleClient> {
    /// Build a selector backed by the router console described in `config`.
    ///
    /// Does not contact the console: the first operation logs in.
    pub fn connect(config: SelectorConfig) -> Result<Self, CoreError> {
        let transport = config.transport();
        let client = ConsoleClient::new(config.url, config.credentials, &transport)?;
        Ok(Self::new(client, config.interface, config.gateways))
    }
}

impl<R: RemoteFirewall> GatewaySelector<R> {
    pub fn new(remote: R, interface: impl Into<String>, gateways: Vec<Gateway>) -> Self {
        Self {
            remote: RwLock::new(remote),
            interface: interface.into(),
            gateways,
        }
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }

    /// Configured gateways, in display order.
    pub fn gateways(&self) -> &[Gateway] {
        &self.gateways
    }

    /// Look up a configured gateway by its rule name.
    pub fn gateway(&self, name: &str) -> Result<&Gateway, CoreError> {
        self.gateways
            .iter()
            .find(|g| g.name == name)
            .ok_or_else(|| CoreError::GatewayNotFound { name: name.into() })
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// Gateway health as the router currently reports it. Not cached.
    pub async fn gateway_status(&self) -> Result<Vec<GatewayStatus>, CoreError> {
        let remote = self.remote.read().await;
        remote.list_gateways().await
    }

    /// The managed rule steering `source`, if there is one.
    pub async fn active_rule(&self, source: IpAddr) -> Result<Option<FirewallRule>, CoreError> {
        let remote = self.remote.read().await;
        let rules = remote.list_rules(&self.interface).await?;
        Ok(find_managed_rule(&rules, &source.to_string()).cloned())
    }

    /// Every configured gateway with its status and whether `source`
    /// currently uses it.
    ///
    /// With no managed rule the active name is [`CLEAR_SELECTION`], so a
    /// configured gateway of that name represents "router default".
    pub async fn view_state(&self, source: IpAddr) -> Result<Vec<GatewayView>, CoreError> {
        let (statuses, rules) = {
            let remote = self.remote.read().await;
            let statuses = remote.list_gateways().await?;
            let rules = remote.list_rules(&self.interface).await?;
            (statuses, rules)
        };

        let active_name = find_managed_rule(&rules, &source.to_string())
            .map_or(CLEAR_SELECTION, |rule| rule.gateway.as_str());
        let statuses: HashMap<&str, &GatewayStatus> =
            statuses.iter().map(|s| (s.name.as_str(), s)).collect();

        let views = self
            .gateways
            .iter()
            .map(|gateway| {
                let status = statuses.get(gateway.status_name.as_str());
                GatewayView {
                    name: gateway.name.clone(),
                    label: gateway.label.clone(),
                    active: gateway.name == active_name,
                    known_status: status.is_some(),
                    online: status.is_some_and(|s| s.online),
                    roundtrip_time: status
                        .map(|s| s.roundtrip_time.clone())
                        .unwrap_or_default(),
                }
            })
            .collect();

        Ok(views)
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Replace `source`'s managed rule with one through `gateway`.
    ///
    /// The new rule matches `source` as a single host, never any.
    ///
    /// Deletes the existing managed rule first and stops if that fails,
    /// so a client never ends up with two. With [`CLEAR_SELECTION`] as
    /// the gateway the deletion is the whole operation and `None` is
    /// returned.
    pub async fn set_gateway(
        &self,
        source: IpAddr,
        gateway: &str,
        label: &str,
    ) -> Result<Option<FirewallRule>, CoreError> {
        let source = source.to_string();
        let remote = self.remote.write().await;

        let rules = remote.list_rules(&self.interface).await?;
        if let Some(existing) = find_managed_rule(&rules, &source) {
            info!(%source, gateway = %existing.gateway, "removing current override");
            remote.delete_rule(existing).await?;
        }

        if gateway == CLEAR_SELECTION {
            debug!(%source, "selection cleared");
            return Ok(None);
        }

        let draft = RuleDraft::to_any(
            self.interface.clone(),
            AddressMatch::Single(source.clone()),
            gateway,
            describe_choice(label, gateway),
        );
        let rule = remote.add_rule(&draft).await?;
        info!(%source, gateway, id = ?rule.id, "override active");
        Ok(Some(rule))
    }

    /// Steer `source` through the configured gateway `name`, or clear
    /// its override when `name` is [`CLEAR_SELECTION`].
    ///
    /// Unknown names fail before the router is contacted.
    pub async fn activate(
        &self,
        source: IpAddr,
        name: &str,
    ) -> Result<Option<FirewallRule>, CoreError> {
        let label = match self.gateway(name) {
            Ok(gateway) => gateway.label.clone(),
            Err(_) if name == CLEAR_SELECTION => String::new(),
            Err(e) => return Err(e),
        };
        self.set_gateway(source, name, &label).await
    }
}
