// ── Domain types ──

/// A locally configured gateway a client may choose.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gateway {
    /// Value sent to the console as the rule's gateway.
    pub name: String,
    /// Human-readable name, shown on the page and stored in the rule description.
    pub label: String,
    /// Name of this gateway on the console's status page.
    pub status_name: String,
}

impl Gateway {
    /// A gateway whose status-page name is the same as its rule name.
    pub fn new(name: impl Into<String>, label: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            status_name: name.clone(),
            label: label.into(),
            name,
        }
    }

    pub fn with_status_name(mut self, status_name: impl Into<String>) -> Self {
        self.status_name = status_name.into();
        self
    }
}

/// One configured gateway as seen by one client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayView {
    pub name: String,
    pub label: String,
    /// This client's traffic currently goes through this gateway.
    pub active: bool,
    /// The console's status page lists this gateway.
    pub known_status: bool,
    pub online: bool,
    pub roundtrip_time: String,
}
