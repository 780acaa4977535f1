// creamy-api: Async client for the router's HTML administration console
//
// The console has no structured API. Everything here is built on
// session cookies, hidden CSRF fields, and server-rendered tables.

pub mod console;
pub mod error;
pub mod transport;

pub use console::client::{ConsoleClient, ConsoleRequest, Credentials, Method, Page};
pub use console::extract::{
    is_login_page, parse_apply_token, parse_csrf_token, parse_firewall_rules,
    parse_gateway_status,
};
pub use console::models::{AddressMatch, FirewallRule, GatewayStatus, RuleDraft};
pub use console::rules::find_insertion_anchor;
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
