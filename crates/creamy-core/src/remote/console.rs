use async_trait::async_trait;
use creamy_api::{ConsoleClient, FirewallRule, GatewayStatus, RuleDraft};

use super::RemoteFirewall;
use crate::error::CoreError;

#[async_trait]
impl RemoteFirewall for ConsoleClient {
    async fn list_gateways(&self) -> Result<Vec<GatewayStatus>, CoreError> {
        Ok(ConsoleClient::list_gateways(self).await?)
    }

    async fn list_rules(&self, interface: &str) -> Result<Vec<FirewallRule>, CoreError> {
        Ok(ConsoleClient::list_rules(self, interface).await?)
    }

    async fn add_rule(&self, draft: &RuleDraft) -> Result<FirewallRule, CoreError> {
        Ok(ConsoleClient::add_rule(self, draft).await?)
    }

    async fn delete_rule(&self, rule: &FirewallRule) -> Result<(), CoreError> {
        Ok(ConsoleClient::delete_rule(self, rule).await?)
    }
}
