// In-memory firewall
//
// Behaves like the console for the operations the selector uses: rules
// are kept per interface in table order, new rules are spliced in after
// the same insertion anchor, and every mutation is live immediately.
// Without an anchor the new rule is appended. It also
// counts how many mutations run at once, which is how tests observe the
// selector's locking.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use creamy_api::{FirewallRule, GatewayStatus, RuleDraft, find_insertion_anchor};
use tokio::sync::Mutex;

use super::RemoteFirewall;
use crate::error::CoreError;

#[derive(Default)]
pub struct MemoryFirewall {
    rules: Mutex<HashMap<String, Vec<FirewallRule>>>,
    gateways: Mutex<Vec<GatewayStatus>>,
    next_id: AtomicUsize,
    latency: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    fail_adds: AtomicBool,
    fail_deletes: AtomicBool,
}

impl MemoryFirewall {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every mutation by `latency`, widening the window in which
    /// unsynchronized callers would interleave.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_gateways(self, gateways: Vec<GatewayStatus>) -> Self {
        Self {
            gateways: Mutex::new(gateways),
            ..self
        }
    }

    /// Seed an interface's table with pre-existing rules, e.g. the
    /// router's own default-gateway rules.
    pub async fn seed_rules(&self, interface: &str, rules: Vec<FirewallRule>) {
        let mut tables = self.rules.lock().await;
        let table = tables.entry(interface.to_owned()).or_default();
        for mut rule in rules {
            if rule.id.is_none() {
                rule.id = Some(self.allocate_id());
            }
            rule.interface = interface.to_owned();
            table.push(rule);
        }
    }

    /// Snapshot of an interface's table.
    pub async fn rules(&self, interface: &str) -> Vec<FirewallRule> {
        self.rules
            .lock()
            .await
            .get(interface)
            .cloned()
            .unwrap_or_default()
    }

    /// Make every following `add_rule` fail with a confirmation error.
    pub fn fail_adds(&self, fail: bool) {
        self.fail_adds.store(fail, Ordering::SeqCst);
    }

    /// Make every following `delete_rule` fail with a transport error.
    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Largest number of mutations that were ever running at once.
    pub fn max_concurrent_mutations(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn allocate_id(&self) -> String {
        self.next_id.fetch_add(1, Ordering::SeqCst).to_string()
    }

    async fn enter_mutation(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if self.latency.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.latency).await;
        }
    }

    fn leave_mutation(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl RemoteFirewall for MemoryFirewall {
    async fn list_gateways(&self) -> Result<Vec<GatewayStatus>, CoreError> {
        Ok(self.gateways.lock().await.clone())
    }

    async fn list_rules(&self, interface: &str) -> Result<Vec<FirewallRule>, CoreError> {
        Ok(self.rules(interface).await)
    }

    async fn add_rule(&self, draft: &RuleDraft) -> Result<FirewallRule, CoreError> {
        self.enter_mutation().await;
        let result = if self.fail_adds.load(Ordering::SeqCst) {
            Err(CoreError::Confirmation {
                message: format!("created rule for {} not found", draft.source),
            })
        } else {
            let mut tables = self.rules.lock().await;
            let table = tables.entry(draft.interface.clone()).or_default();

            let position = find_insertion_anchor(table)
                .and_then(|anchor| table.iter().position(|r| r.id.as_deref() == Some(anchor)))
                .map_or(table.len(), |index| index + 1);

            let rule = FirewallRule {
                id: Some(self.allocate_id()),
                interface: draft.interface.clone(),
                source: draft.source.to_string(),
                destination: draft.destination.to_string(),
                gateway: draft.gateway.clone(),
                description: draft.description.clone(),
            };
            table.insert(position, rule.clone());
            Ok(rule)
        };
        self.leave_mutation();
        result
    }

    async fn delete_rule(&self, rule: &FirewallRule) -> Result<(), CoreError> {
        self.enter_mutation().await;
        let result = if self.fail_deletes.load(Ordering::SeqCst) {
            Err(CoreError::Transport {
                message: "unexpected status code 502 when submitting /firewall_rules.php".into(),
            })
        } else {
            let mut tables = self.rules.lock().await;
            let table = tables.entry(rule.interface.clone()).or_default();
            match table.iter().position(|r| r.id == rule.id && r.id.is_some()) {
                Some(index) => {
                    table.remove(index);
                    Ok(())
                }
                None => Err(CoreError::Confirmation {
                    message: format!("rule {:?} not present", rule.id),
                }),
            }
        };
        self.leave_mutation();
        result
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use creamy_api::AddressMatch;

    fn rule(gateway: &str) -> FirewallRule {
        FirewallRule {
            id: None,
            interface: "lan".into(),
            source: "LAN net".into(),
            destination: "*".into(),
            gateway: gateway.into(),
            description: String::new(),
        }
    }

    fn draft() -> RuleDraft {
        RuleDraft::to_any(
            "lan",
            AddressMatch::Single("10.0.0.5".into()),
            "WAN2",
            "override",
        )
    }

    async fn gateways_in_order(firewall: &MemoryFirewall) -> Vec<String> {
        firewall
            .rules("lan")
            .await
            .into_iter()
            .map(|r| r.gateway)
            .collect()
    }

    #[tokio::test]
    async fn new_rule_follows_leading_default_gateway_rules() {
        let firewall = MemoryFirewall::new();
        firewall
            .seed_rules("lan", vec![rule("*"), rule("WAN1")])
            .await;

        firewall.add_rule(&draft()).await.unwrap();
        assert_eq!(gateways_in_order(&firewall).await, vec!["*", "WAN2", "WAN1"]);
    }

    #[tokio::test]
    async fn new_rule_is_appended_without_an_anchor() {
        let firewall = MemoryFirewall::new();
        firewall
            .seed_rules("lan", vec![rule("WAN1"), rule("*")])
            .await;

        firewall.add_rule(&draft()).await.unwrap();
        assert_eq!(gateways_in_order(&firewall).await, vec!["WAN1", "*", "WAN2"]);
    }
}
