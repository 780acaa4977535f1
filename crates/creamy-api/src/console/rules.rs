// Firewall rule endpoints
//
// Rule edits on the console are staged: creating or deleting a rule only
// changes the saved configuration, and a separate "Apply Changes" post
// makes it live. Each mutation here runs the whole sequence and then
// re-reads the rule table to confirm the outcome.

use tracing::{debug, info};

use crate::console::client::{ConsoleClient, ConsoleRequest, Page};
use crate::console::extract::{
    CSRF_FIELD, parse_apply_token, parse_csrf_token, parse_firewall_rules,
};
use crate::console::models::{ANY, FirewallRule, RuleDraft};
use crate::error::Error;

const RULES_PATH: &str = "/firewall_rules.php";
const RULE_EDIT_PATH: &str = "/firewall_rules_edit.php";

/// Field values the edit form requires for a plain IPv4 pass rule that
/// keeps state and uses no limiters, queues, or schedules.
const PASS_RULE_DEFAULTS: &[(&str, &str)] = &[
    ("type", "pass"),
    ("ipprotocol", "inet"),
    ("proto", "any"),
    ("icmptype[]", "any"),
    ("dscp", ""),
    ("tag", ""),
    ("tagged", ""),
    ("max", ""),
    ("max-src-nodes", ""),
    ("max-src-conn", ""),
    ("max-src-states", ""),
    ("max-src-conn-rate", ""),
    ("max-src-conn-rates", ""),
    ("statetimeout", ""),
    ("statetype", "keep state"),
    ("vlanprio", ""),
    ("vlanprioset", ""),
    ("sched", ""),
    ("dnpipe", ""),
    ("pdnpipe", ""),
    ("ackqueue", ""),
    ("defaultqueue", ""),
    ("ruleid", ""),
    ("save", "Save"),
];

/// Where to splice a new gateway rule into the table.
///
/// The console evaluates rules top to bottom and stops at the first
/// match. Rules using the default gateway (`*`) at the top of the table
/// must keep precedence, so the new rule goes right after the last of
/// them and before the first rule that names a gateway. Returns `None`
/// when the table does not start with such a rule (or that rule has no
/// id); `add_rule` then submits an empty `after` and placement is up to
/// the console.
pub fn find_insertion_anchor(rules: &[FirewallRule]) -> Option<&str> {
    rules
        .iter()
        .take_while(|rule| rule.gateway == ANY)
        .last()
        .and_then(|rule| rule.id.as_deref())
}

fn same_rule(a: &FirewallRule, b: &FirewallRule) -> bool {
    a.source == b.source
        && a.destination == b.destination
        && a.gateway == b.gateway
        && a.description == b.description
}

impl ConsoleClient {
    async fn rules_page(&self, interface: &str) -> Result<Page, Error> {
        self.fetch(&ConsoleRequest::get(RULES_PATH).query("if", interface))
            .await
    }

    /// List the firewall rules of an interface, in evaluation order.
    ///
    /// `GET /firewall_rules.php?if={interface}`
    pub async fn list_rules(&self, interface: &str) -> Result<Vec<FirewallRule>, Error> {
        debug!(interface, "listing rules");
        let page = self.rules_page(interface).await?;
        parse_firewall_rules(&page.body, interface)
    }

    /// Make staged rule edits on an interface live.
    ///
    /// `POST /firewall_rules.php?if={interface}` with `apply=Apply Changes`
    pub async fn apply_changes(&self, interface: &str) -> Result<(), Error> {
        let page = self.rules_page(interface).await?;
        let csrf = parse_apply_token(&page.body)?;

        debug!(interface, "applying staged changes");
        let form = vec![
            (CSRF_FIELD.to_owned(), csrf),
            ("apply".to_owned(), "Apply Changes".to_owned()),
        ];
        self.fetch(&ConsoleRequest::post(RULES_PATH, form).query("if", interface))
            .await?;
        Ok(())
    }

    /// Create a pass rule, apply it, and return it as read back from the
    /// rule table.
    pub async fn add_rule(&self, draft: &RuleDraft) -> Result<FirewallRule, Error> {
        let interface = draft.interface.as_str();
        let rules = self.list_rules(interface).await?;
        let after = find_insertion_anchor(&rules).unwrap_or_default().to_owned();

        let edit_page = self
            .fetch(&ConsoleRequest::get(RULE_EDIT_PATH).query("if", interface))
            .await?;
        let csrf = parse_csrf_token(&edit_page.body, None)?;

        let mut form = vec![
            (CSRF_FIELD.to_owned(), csrf),
            ("interface".to_owned(), interface.to_owned()),
            ("descr".to_owned(), draft.description.clone()),
            ("gateway".to_owned(), draft.gateway.clone()),
            ("after".to_owned(), after.clone()),
        ];
        form.extend(draft.source.form_fields("src"));
        form.extend(draft.destination.form_fields("dst"));
        form.extend(
            PASS_RULE_DEFAULTS
                .iter()
                .map(|(k, v)| ((*k).to_owned(), (*v).to_owned())),
        );

        info!(
            interface,
            source = %draft.source,
            gateway = %draft.gateway,
            after = %after,
            "creating rule"
        );
        self.fetch(&ConsoleRequest::post(RULE_EDIT_PATH, form))
            .await?;

        self.apply_changes(interface).await?;

        self.list_rules(interface)
            .await?
            .into_iter()
            .find(|rule| draft.matches(rule))
            .ok_or_else(|| Error::Confirmation {
                message: format!(
                    "created rule for {} via {} not found after applying changes",
                    draft.source, draft.gateway
                ),
            })
    }

    /// Delete a rule, apply the change, and confirm it is gone.
    pub async fn delete_rule(&self, rule: &FirewallRule) -> Result<(), Error> {
        let id = rule.id.as_deref().ok_or_else(|| Error::MissingRuleId {
            description: rule.description.clone(),
        })?;
        let interface = rule.interface.as_str();

        let page = self.rules_page(interface).await?;
        let current = parse_firewall_rules(&page.body, interface)?;

        // Ids are positions in the table; make sure this one still points
        // at the rule the caller read.
        let still_there = current
            .iter()
            .any(|r| r.id.as_deref() == Some(id) && same_rule(r, rule));
        if !still_there {
            return Err(Error::Confirmation {
                message: format!("rule {id} on {interface} changed before it could be deleted"),
            });
        }
        let copies_before = current.iter().filter(|r| same_rule(r, rule)).count();

        let csrf = parse_csrf_token(&page.body, None)?;
        let form = vec![
            (CSRF_FIELD.to_owned(), csrf),
            ("act".to_owned(), "del".to_owned()),
            ("if".to_owned(), interface.to_owned()),
            ("id".to_owned(), id.to_owned()),
        ];

        info!(interface, id, source = %rule.source, "deleting rule");
        self.fetch(&ConsoleRequest::post(RULES_PATH, form).query("if", interface))
            .await?;

        self.apply_changes(interface).await?;

        let copies_after = self
            .list_rules(interface)
            .await?
            .iter()
            .filter(|r| same_rule(r, rule))
            .count();
        if copies_after >= copies_before {
            return Err(Error::Confirmation {
                message: format!("rule {id} on {interface} still present after applying changes"),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(id: Option<&str>, gateway: &str) -> FirewallRule {
        FirewallRule {
            id: id.map(str::to_owned),
            interface: "lan".into(),
            source: "*".into(),
            destination: "*".into(),
            gateway: gateway.into(),
            description: String::new(),
        }
    }

    #[test]
    fn anchor_is_last_rule_of_leading_default_gateway_run() {
        let rules = vec![
            rule(Some("0"), "*"),
            rule(Some("1"), "*"),
            rule(Some("2"), "WAN2"),
            rule(Some("3"), "*"),
        ];
        assert_eq!(find_insertion_anchor(&rules), Some("1"));
    }

    #[test]
    fn anchor_is_none_when_first_rule_names_a_gateway() {
        let rules = vec![rule(Some("0"), "WAN1"), rule(Some("1"), "*")];
        assert_eq!(find_insertion_anchor(&rules), None);
    }

    #[test]
    fn anchor_is_none_for_empty_table() {
        assert_eq!(find_insertion_anchor(&[]), None);
    }

    #[test]
    fn anchor_is_last_rule_when_all_use_default_gateway() {
        let rules = vec![rule(Some("0"), "*"), rule(Some("1"), "*")];
        assert_eq!(find_insertion_anchor(&rules), Some("1"));
    }

    #[test]
    fn anchor_is_none_when_last_default_rule_has_no_id() {
        let rules = vec![rule(Some("0"), "*"), rule(None, "*"), rule(Some("2"), "WAN1")];
        assert_eq!(find_insertion_anchor(&rules), None);
    }
}
