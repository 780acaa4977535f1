use thiserror::Error;

/// Top-level error type for the `creamy-api` crate.
///
/// Every failure against the console falls into one of four classes:
/// transport (network and status codes), authentication (the login flow),
/// extraction (the page no longer looks the way we expect), and
/// confirmation (a mutation did not show up on re-read).
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The console answered with a status outside the accepted set.
    #[error("unexpected status code {status} when {operation}")]
    UnexpectedStatus { operation: String, status: u16 },

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// A configured header value is not valid HTTP.
    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    // ── Authentication ──────────────────────────────────────────────
    /// Login failed (missing CSRF field, rejected credentials, etc.)
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// Expected markup is missing: the console's page layout changed.
    #[error("could not find {what} in console page")]
    Extraction { what: String },

    /// A rule without a console-assigned id cannot be addressed.
    #[error("rule {description:?} has no id and cannot be deleted")]
    MissingRuleId { description: String },

    // ── Mutation ────────────────────────────────────────────────────
    /// A mutation's read-back did not show the expected result.
    #[error("Confirmation failed: {message}")]
    Confirmation { message: String },
}

impl Error {
    pub(crate) fn extraction(what: impl Into<String>) -> Self {
        Self::Extraction { what: what.into() }
    }

    pub(crate) fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    /// Returns `true` for network and status-code failures.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Transport(_)
                | Self::UnexpectedStatus { .. }
                | Self::InvalidUrl(_)
                | Self::Tls(_)
                | Self::InvalidHeader(_)
        )
    }

    /// Returns `true` if the console page did not have the expected shape.
    pub fn is_extraction(&self) -> bool {
        matches!(self, Self::Extraction { .. } | Self::MissingRuleId { .. })
    }
}
