// ── Core error types ──
//
// What callers of the selector see. The `From<creamy_api::Error>` impl
// folds console failures into four classes; none of them is retried,
// because after a partial failure the console's state is unknown.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Remote errors ────────────────────────────────────────────────
    #[error("Cannot reach router console: {message}")]
    Transport { message: String },

    #[error("Router console login failed: {message}")]
    Authentication { message: String },

    #[error("Router console page layout not understood: {message}")]
    Extraction { message: String },

    #[error("Router console did not confirm the change: {message}")]
    Confirmation { message: String },

    // ── Local errors ─────────────────────────────────────────────────
    #[error("Gateway not found: {name}")]
    GatewayNotFound { name: String },

    #[error("Configuration error: {message}")]
    Config { message: String },
}

// ── Conversion from console errors ───────────────────────────────────

impl From<creamy_api::Error> for CoreError {
    fn from(err: creamy_api::Error) -> Self {
        let message = err.to_string();
        match err {
            creamy_api::Error::Authentication { message } => CoreError::Authentication { message },
            creamy_api::Error::Confirmation { message } => CoreError::Confirmation { message },
            creamy_api::Error::Extraction { .. } | creamy_api::Error::MissingRuleId { .. } => {
                CoreError::Extraction { message }
            }
            creamy_api::Error::Transport(_)
            | creamy_api::Error::UnexpectedStatus { .. }
            | creamy_api::Error::InvalidUrl(_)
            | creamy_api::Error::Tls(_)
            | creamy_api::Error::InvalidHeader(_) => CoreError::Transport { message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn console_errors_keep_their_class() {
        let err: CoreError = creamy_api::Error::UnexpectedStatus {
            operation: "fetching /status_gateways.php".into(),
            status: 502,
        }
        .into();
        match err {
            CoreError::Transport { message } => assert!(message.contains("502")),
            other => panic!("expected Transport, got {other:?}"),
        }

        let err: CoreError = creamy_api::Error::Extraction {
            what: "firewall rule table".into(),
        }
        .into();
        assert!(matches!(err, CoreError::Extraction { .. }));

        let err: CoreError = creamy_api::Error::Authentication {
            message: "credentials rejected".into(),
        }
        .into();
        assert!(matches!(err, CoreError::Authentication { ref message } if message == "credentials rejected"));
    }
}
