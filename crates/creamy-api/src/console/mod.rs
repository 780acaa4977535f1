// Console client
//
// `client` holds transport mechanics and the login flow, `extract` the
// page parsers, and `gateways` / `rules` the endpoint operations built
// on top of them.

pub mod client;
pub mod extract;
pub mod gateways;
pub mod models;
pub mod rules;
