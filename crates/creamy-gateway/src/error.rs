//! Error types for the server binary.
//!
//! [`AppError`] is what a request handler fails with; every variant is a
//! 500 with a short text body. [`StartupError`] carries miette
//! diagnostics for failures before the server is listening.

use std::net::SocketAddr;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use miette::Diagnostic;
use thiserror::Error;
use tracing::error;

use creamy_config::ConfigError;
use creamy_core::CoreError;

// ── Request errors ──────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum AppError {
    #[error("could not get gateways with state: {0}")]
    View(#[source] CoreError),

    #[error("gateway not found: {0}")]
    UnknownGateway(String),

    #[error("failed to set gateway: {0}")]
    Activate(#[source] CoreError),
}

impl AppError {
    /// Classify a failed activation.
    pub fn activation(err: CoreError) -> Self {
        match err {
            CoreError::GatewayNotFound { name } => Self::UnknownGateway(name),
            other => Self::Activate(other),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!(error = %self, "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
    }
}

// ── Startup errors ──────────────────────────────────────────────────

#[derive(Debug, Error, Diagnostic)]
pub enum StartupError {
    #[error("Configuration is invalid")]
    #[diagnostic(
        code(creamy_gateway::config),
        help(
            "Settings come from the config file and CREAMY_GATEWAY_* variables.\n\
             Required: REMOTE_HOST, REMOTE_USERNAME, REMOTE_PASSWORD,\n\
             REMOTE_INTERFACE and GATEWAY_NAMES (or [[gateways]] tables)."
        )
    )]
    Config(#[from] ConfigError),

    #[error("Could not set up the router console client")]
    #[diagnostic(
        code(creamy_gateway::client),
        help("Check remote_ca_cert and remote_referrer.")
    )]
    Client(#[from] CoreError),

    #[error("Could not listen on {addr}")]
    #[diagnostic(
        code(creamy_gateway::bind),
        help("Is another process using the port? Set CREAMY_GATEWAY_PORT or --listen.")
    )]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Server failed")]
    #[diagnostic(code(creamy_gateway::serve))]
    Serve(#[source] std::io::Error),
}
