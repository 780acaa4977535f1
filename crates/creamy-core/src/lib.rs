//! Gateway selection for clients behind a router managed through its
//! HTML console.
//!
//! - **[`GatewaySelector`]**: the service object. Owns the remote
//!   console client behind a single read/write lock and exposes the two
//!   operations the web front end needs: [`view_state`](GatewaySelector::view_state)
//!   and [`activate`](GatewaySelector::activate).
//!
//! - **[`RemoteFirewall`]**: the capability seam between orchestration
//!   and the console: list gateways, list/add/delete rules. Implemented
//!   for [`creamy_api::ConsoleClient`] and for the in-memory
//!   [`MemoryFirewall`].
//!
//! - **Rule ownership** ([`rules`]): rules this system creates carry
//!   [`RULE_MARKER`] at the start of their description; nothing else is
//!   ever touched.

pub mod config;
pub mod error;
pub mod model;
pub mod remote;
pub mod rules;
pub mod selector;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{SelectorConfig, TlsVerification};
pub use error::CoreError;
pub use model::{Gateway, GatewayView};
pub use remote::RemoteFirewall;
pub use remote::memory::MemoryFirewall;
pub use rules::{CLEAR_SELECTION, RULE_MARKER, describe_choice, find_managed_rule, is_managed};
pub use selector::GatewaySelector;

pub use creamy_api::{
    AddressMatch, ConsoleClient, Credentials, FirewallRule, GatewayStatus, RuleDraft,
};
