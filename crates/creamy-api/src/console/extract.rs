// Console page extractors
//
// Pure functions from a page body to typed records. Column positions
// are a fixed contract with the console's current page layout; when a
// page stops matching, callers get `Error::Extraction` rather than
// silently empty data.
//
// `scraper::Html` is not `Send`, so documents are parsed and dropped
// inside these synchronous functions and never held across an await.

use scraper::{ElementRef, Html, Selector};

use crate::console::models::{FirewallRule, GatewayStatus};
use crate::error::Error;

/// Name of the hidden CSRF input on every console form.
pub const CSRF_FIELD: &str = "__csrf_magic";

const LOGIN_FORM: &str = "form.login";
const APPLY_FORM: &str = ".alert-warning form.pull-right";
const GATEWAY_TABLE: &str = ".table-responsive .table";
const RULE_TABLE: &str = "#ruletable";

fn selector(css: &str) -> Result<Selector, Error> {
    Selector::parse(css).map_err(|e| Error::extraction(format!("valid selector {css:?} ({e:?})")))
}

fn text_of(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_owned()
}

/// Selectors for `td:nth-child(1..=count)`, indexed from zero.
fn column_selectors(count: usize) -> Result<Vec<Selector>, Error> {
    (1..=count)
        .map(|n| selector(&format!("td:nth-child({n})")))
        .collect()
}

fn cell<'a>(row: &ElementRef<'a>, columns: &[Selector], index: usize) -> Option<ElementRef<'a>> {
    columns.get(index).and_then(|sel| row.select(sel).next())
}

fn cell_text(row: &ElementRef<'_>, columns: &[Selector], index: usize) -> String {
    cell(row, columns, index)
        .map(|c| text_of(&c))
        .unwrap_or_default()
}

/// Whether the page is the console's login screen.
pub fn is_login_page(html: &str) -> bool {
    let document = Html::parse_document(html);
    Selector::parse(LOGIN_FORM).is_ok_and(|sel| document.select(&sel).next().is_some())
}

/// Extract the CSRF token, optionally from within the first element
/// matching `scope` (e.g. a specific form).
pub fn parse_csrf_token(html: &str, scope: Option<&str>) -> Result<String, Error> {
    let document = Html::parse_document(html);
    let input = selector(&format!("input[name=\"{CSRF_FIELD}\"]"))?;

    let found = match scope {
        Some(scope) => {
            let scope_sel = selector(scope)?;
            let container = document
                .select(&scope_sel)
                .next()
                .ok_or_else(|| Error::extraction(format!("element {scope:?}")))?;
            container
                .select(&input)
                .next()
                .and_then(|el| el.value().attr("value"))
                .map(str::to_owned)
        }
        None => document
            .select(&input)
            .next()
            .and_then(|el| el.value().attr("value"))
            .map(str::to_owned),
    };

    found.ok_or_else(|| Error::extraction("CSRF token input"))
}

/// Extract the CSRF token of the "Apply Changes" banner form shown
/// while edits are staged but not yet live.
pub fn parse_apply_token(html: &str) -> Result<String, Error> {
    match parse_csrf_token(html, Some(APPLY_FORM)) {
        Err(Error::Extraction { .. }) => Err(Error::extraction("Apply Changes form")),
        other => other,
    }
}

/// Parse the gateway status table.
///
/// Columns: name, gateway address, monitor IP, RTT, RTTsd, loss,
/// status, description.
pub fn parse_gateway_status(html: &str) -> Result<Vec<GatewayStatus>, Error> {
    let document = Html::parse_document(html);
    let table_sel = selector(GATEWAY_TABLE)?;
    let row_sel = selector("tbody tr")?;
    let columns = column_selectors(8)?;

    let table = document
        .select(&table_sel)
        .next()
        .ok_or_else(|| Error::extraction("gateway status table"))?;

    let gateways = table
        .select(&row_sel)
        .map(|row| GatewayStatus {
            name: cell_text(&row, &columns, 0),
            address: cell_text(&row, &columns, 1),
            monitor: cell_text(&row, &columns, 2),
            roundtrip_time: cell_text(&row, &columns, 3),
            roundtrip_jitter: cell_text(&row, &columns, 4),
            loss: cell_text(&row, &columns, 5),
            status: cell_text(&row, &columns, 6),
            description: cell_text(&row, &columns, 7),
            online: cell(&row, &columns, 6)
                .is_some_and(|c| c.value().classes().any(|class| class == "bg-success")),
        })
        .collect();

    Ok(gateways)
}

/// Parse the firewall rule table of one interface.
///
/// Columns: checkbox, status icons, states, protocol, source, port,
/// destination, port, gateway, queue, schedule, description, actions.
/// The interface is not shown per row, so the caller supplies it.
pub fn parse_firewall_rules(html: &str, interface: &str) -> Result<Vec<FirewallRule>, Error> {
    let document = Html::parse_document(html);
    let table_sel = selector(RULE_TABLE)?;
    let row_sel = selector("tbody tr")?;
    let checkbox_sel = selector("input[type=\"checkbox\"]")?;
    let columns = column_selectors(12)?;

    let table = document
        .select(&table_sel)
        .next()
        .ok_or_else(|| Error::extraction("firewall rule table"))?;

    let rules = table
        .select(&row_sel)
        .map(|row| FirewallRule {
            id: row
                .select(&checkbox_sel)
                .next()
                .and_then(|el| el.value().attr("value"))
                .map(str::to_owned),
            interface: interface.to_owned(),
            source: cell_text(&row, &columns, 4),
            destination: cell_text(&row, &columns, 6),
            gateway: cell_text(&row, &columns, 8),
            description: cell_text(&row, &columns, 11),
        })
        .collect();

    Ok(rules)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use pretty_assertions::assert_eq;

    use super::*;

    const GATEWAYS: &str = r#"
<html><body>
<div class="table-responsive">
  <table class="table table-striped">
    <thead><tr><th>Name</th></tr></thead>
    <tbody>
      <tr>
        <td> WAN1_DHCP </td><td>203.0.113.1</td><td>203.0.113.1</td>
        <td>12.4ms</td><td>0.8ms</td><td>0.0%</td>
        <td class="bg-success">Offline</td><td> Primary uplink </td>
      </tr>
      <tr>
        <td>WAN2_DHCP</td><td>198.51.100.1</td><td>198.51.100.1</td>
        <td>0ms</td><td>0ms</td><td>100.0%</td>
        <td class="bg-danger">Online</td><td>Backup uplink</td>
      </tr>
    </tbody>
  </table>
</div>
</body></html>"#;

    const RULES: &str = r#"
<html><body>
<div class="alert alert-warning">
  The firewall rule configuration has been changed.
  <form action="firewall_rules.php" method="post" class="pull-right">
    <input type="hidden" name="__csrf_magic" value="apply-token" />
    <button type="submit" name="apply" value="Apply Changes">Apply Changes</button>
  </form>
</div>
<form method="post">
  <input type="hidden" name="__csrf_magic" value="page-token" />
  <table id="ruletable">
    <tbody>
      <tr>
        <td></td><td></td><td>0/0 B</td><td>*</td><td>*</td><td>*</td>
        <td>LAN Address</td><td>443</td><td>*</td><td>*</td><td></td>
        <td>Anti-Lockout Rule</td><td></td>
      </tr>
      <tr>
        <td><input type="checkbox" name="rule[]" value="1" /></td><td></td><td></td>
        <td>IPv4 *</td><td>
          10.0.0.5
        </td><td>*</td><td>*</td><td>*</td><td>WAN2</td><td>none</td><td></td>
        <td>[creamy-gateway] user chose "Backup" (WAN2)</td><td></td>
      </tr>
    </tbody>
  </table>
</form>
</body></html>"#;

    #[test]
    fn online_follows_status_class_not_text() {
        let gateways = parse_gateway_status(GATEWAYS).unwrap();

        assert_eq!(gateways.len(), 2);
        assert_eq!(gateways[0].name, "WAN1_DHCP");
        assert_eq!(gateways[0].status, "Offline");
        assert!(gateways[0].online);
        assert_eq!(gateways[1].status, "Online");
        assert!(!gateways[1].online);
    }

    #[test]
    fn gateway_cells_are_trimmed() {
        let gateways = parse_gateway_status(GATEWAYS).unwrap();

        assert_eq!(gateways[0].address, "203.0.113.1");
        assert_eq!(gateways[0].roundtrip_time, "12.4ms");
        assert_eq!(gateways[0].roundtrip_jitter, "0.8ms");
        assert_eq!(gateways[0].loss, "0.0%");
        assert_eq!(gateways[0].description, "Primary uplink");
    }

    #[test]
    fn missing_gateway_table_is_an_extraction_error() {
        let err = parse_gateway_status("<html><body><p>nope</p></body></html>").unwrap_err();
        assert!(err.is_extraction(), "got {err:?}");
    }

    #[test]
    fn rules_carry_interface_and_optional_id() {
        let rules = parse_firewall_rules(RULES, "lan").unwrap();

        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].id, None);
        assert_eq!(rules[0].description, "Anti-Lockout Rule");
        assert_eq!(rules[0].gateway, "*");

        assert_eq!(
            rules[1],
            FirewallRule {
                id: Some("1".into()),
                interface: "lan".into(),
                source: "10.0.0.5".into(),
                destination: "*".into(),
                gateway: "WAN2".into(),
                description: "[creamy-gateway] user chose \"Backup\" (WAN2)".into(),
            }
        );
    }

    #[test]
    fn parsing_twice_yields_equal_records() {
        assert_eq!(
            parse_firewall_rules(RULES, "lan").unwrap(),
            parse_firewall_rules(RULES, "lan").unwrap()
        );
        assert_eq!(
            parse_gateway_status(GATEWAYS).unwrap(),
            parse_gateway_status(GATEWAYS).unwrap()
        );
    }

    #[test]
    fn csrf_token_respects_scope() {
        assert_eq!(parse_csrf_token(RULES, None).unwrap(), "apply-token");
        assert!(
            parse_csrf_token(RULES, Some("#ruletable"))
                .unwrap_err()
                .is_extraction()
        );
        assert_eq!(parse_apply_token(RULES).unwrap(), "apply-token");
    }

    #[test]
    fn apply_token_missing_without_banner() {
        let page = r#"<form><input type="hidden" name="__csrf_magic" value="x" /></form>"#;
        match parse_apply_token(page) {
            Err(Error::Extraction { what }) => assert_eq!(what, "Apply Changes form"),
            other => panic!("expected Extraction error, got {other:?}"),
        }
    }

    #[test]
    fn detects_login_form() {
        let login = r#"<form class="login" method="post">
            <input type="hidden" name="__csrf_magic" value="sid:abc" />
            <input name="usernamefld" /></form>"#;
        assert!(is_login_page(login));
        assert!(!is_login_page(RULES));
        assert_eq!(parse_csrf_token(login, None).unwrap(), "sid:abc");
    }
}
