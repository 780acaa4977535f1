// ── Rule ownership ──
//
// The console holds many rules this system must never touch. Ours are
// recognized by a fixed marker at the start of the description, and at
// most one of them exists per (interface, source).

use creamy_api::FirewallRule;

/// Description prefix of every rule this system creates.
pub const RULE_MARKER: &str = "[creamy-gateway]";

/// Gateway name meaning "no override": remove the client's rule and
/// let the router's own policy apply.
pub const CLEAR_SELECTION: &str = "creamy-gateway-delete";

/// Description stored on a rule created for a client's choice.
pub fn describe_choice(label: &str, gateway: &str) -> String {
    format!("{RULE_MARKER} user chose \"{label}\" ({gateway})")
}

/// Whether a rule was created by this system.
pub fn is_managed(rule: &FirewallRule) -> bool {
    rule.description.starts_with(RULE_MARKER)
}

/// The managed rule for `source`, if any. Rules are in table order, so
/// this is the one the router evaluates first.
pub fn find_managed_rule<'a>(rules: &'a [FirewallRule], source: &str) -> Option<&'a FirewallRule> {
    rules
        .iter()
        .find(|rule| rule.source == source && is_managed(rule))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(id: &str, source: &str, description: &str) -> FirewallRule {
        FirewallRule {
            id: Some(id.into()),
            interface: "lan".into(),
            source: source.into(),
            destination: "*".into(),
            gateway: "WAN2".into(),
            description: description.into(),
        }
    }

    #[test]
    fn description_starts_with_marker_and_names_choice() {
        let description = describe_choice("Backup", "WAN2");
        assert_eq!(description, "[creamy-gateway] user chose \"Backup\" (WAN2)");
        assert!(description.starts_with(RULE_MARKER));
    }

    #[test]
    fn unmarked_rules_are_ignored() {
        let rules = vec![
            rule("0", "10.0.0.5", "hand-made override"),
            rule("1", "10.0.0.6", &describe_choice("Backup", "WAN2")),
            rule("2", "10.0.0.5", &describe_choice("Backup", "WAN2")),
        ];

        let found = find_managed_rule(&rules, "10.0.0.5").map(|r| r.id.as_deref());
        assert_eq!(found, Some(Some("2")));
        assert!(find_managed_rule(&rules, "10.0.0.7").is_none());
    }

    #[test]
    fn marker_must_be_a_prefix() {
        let r = rule("0", "10.0.0.5", "copied from [creamy-gateway] rule");
        assert!(!is_managed(&r));
    }
}
