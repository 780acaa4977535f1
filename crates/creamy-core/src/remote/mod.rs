// ── Remote firewall capability ──
//
// The four things the selector needs from a router. Implemented by the
// console client and by the in-memory firewall.

pub mod console;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use creamy_api::{FirewallRule, GatewayStatus, RuleDraft};

use crate::error::CoreError;

#[async_trait]
pub trait RemoteFirewall: Send + Sync {
    /// Current gateway health as reported by the router.
    async fn list_gateways(&self) -> Result<Vec<GatewayStatus>, CoreError>;

    /// Rules of one interface, in evaluation order.
    async fn list_rules(&self, interface: &str) -> Result<Vec<FirewallRule>, CoreError>;

    /// Create a rule, make it live, and return it as read back.
    async fn add_rule(&self, draft: &RuleDraft) -> Result<FirewallRule, CoreError>;

    /// Remove a rule and make the removal live.
    async fn delete_rule(&self, rule: &FirewallRule) -> Result<(), CoreError>;
}

#[async_trait]
impl<T: RemoteFirewall + ?Sized> RemoteFirewall for Arc<T> {
    async fn list_gateways(&self) -> Result<Vec<GatewayStatus>, CoreError> {
        (**self).list_gateways().await
    }

    async fn list_rules(&self, interface: &str) -> Result<Vec<FirewallRule>, CoreError> {
        (**self).list_rules(interface).await
    }

    async fn add_rule(&self, draft: &RuleDraft) -> Result<FirewallRule, CoreError> {
        (**self).add_rule(draft).await
    }

    async fn delete_rule(&self, rule: &FirewallRule) -> Result<(), CoreError> {
        (**self).delete_rule(rule).await
    }
}
