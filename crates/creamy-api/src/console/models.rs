// Console record types
//
// Snapshots built from the console's server-rendered tables. All string
// fields carry the trimmed cell text exactly as the console shows it.

use std::fmt;

/// The console renders "any address" and "default gateway" as `*`.
pub const ANY: &str = "*";

/// Health of one gateway as reported by the status page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayStatus {
    pub name: String,
    pub address: String,
    pub monitor: String,
    /// Display string, e.g. `"12.3ms"`. Not guaranteed to be numeric.
    pub roundtrip_time: String,
    pub roundtrip_jitter: String,
    pub loss: String,
    /// Informational only; use [`online`](Self::online) for truth.
    pub status: String,
    pub description: String,
    /// Derived from the status cell's `bg-success` class.
    pub online: bool,
}

/// One row of the console's firewall rule table for an interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirewallRule {
    /// Console-assigned id from the row's checkbox. Built-in rules
    /// (anti-lockout, bogon blocks) have none.
    pub id: Option<String>,
    pub interface: String,
    pub source: String,
    pub destination: String,
    pub gateway: String,
    pub description: String,
}

/// Address side of a rule: either one exact address or anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressMatch {
    Any,
    Single(String),
}

impl AddressMatch {
    /// Interpret a value as shown by the rule table, where `*` means any.
    pub fn from_display(value: &str) -> Self {
        if value == ANY {
            Self::Any
        } else {
            Self::Single(value.to_owned())
        }
    }

    /// Form fields for the rule edit page: `{prefix}type` and, for
    /// single addresses, `{prefix}` itself.
    pub(crate) fn form_fields(&self, prefix: &str) -> Vec<(String, String)> {
        match self {
            Self::Any => vec![(format!("{prefix}type"), "any".into())],
            Self::Single(address) => vec![
                (format!("{prefix}type"), "single".into()),
                (prefix.to_owned(), address.clone()),
            ],
        }
    }
}

impl fmt::Display for AddressMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str(ANY),
            Self::Single(address) => f.write_str(address),
        }
    }
}

/// A pass rule to be created on an interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleDraft {
    pub interface: String,
    pub source: AddressMatch,
    pub destination: AddressMatch,
    pub gateway: String,
    pub description: String,
}

impl RuleDraft {
    /// Whether a rule read back from the table is the one this draft created.
    pub fn matches(&self, rule: &FirewallRule) -> bool {
        rule.source == self.source.to_string()
            && rule.destination == self.destination.to_string()
            && rule.gateway == self.gateway
            && rule.description == self.description
    }

    /// A draft for `source` to any destination through `gateway`.
    pub fn to_any(
        interface: impl Into<String>,
        source: AddressMatch,
        gateway: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            interface: interface.into(),
            source,
            destination: AddressMatch::Any,
            gateway: gateway.into(),
            description: description.into(),
        }
    }
}
