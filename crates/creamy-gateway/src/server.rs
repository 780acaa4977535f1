// HTTP server
//
// Two routes on `/`. Handlers resolve the caller's source address, call
// the selector and either render the page or redirect back to it.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Form, State};
use axum::http::HeaderMap;
use axum::response::{Html, Redirect};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use creamy_core::{GatewaySelector, RemoteFirewall};

use crate::error::AppError;
use crate::render::render_page;
use crate::source::resolve_source;

/// Shared per-request state.
pub struct AppState<R> {
    pub selector: Arc<GatewaySelector<R>>,
    /// Take the client address from `X-Forwarded-For`.
    pub trust_forwarded_headers: bool,
}

impl<R> AppState<R> {
    pub fn new(selector: Arc<GatewaySelector<R>>, trust_forwarded_headers: bool) -> Self {
        Self {
            selector,
            trust_forwarded_headers,
        }
    }
}

impl<R> Clone for AppState<R> {
    fn clone(&self) -> Self {
        Self {
            selector: Arc::clone(&self.selector),
            trust_forwarded_headers: self.trust_forwarded_headers,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ActivateForm {
    #[serde(default)]
    pub gateway: String,
}

pub fn router<R: RemoteFirewall + 'static>(state: AppState<R>) -> Router {
    Router::new()
        .route("/", get(view_gateways::<R>).post(set_gateway::<R>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn view_gateways<R: RemoteFirewall + 'static>(
    State(state): State<AppState<R>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Result<Html<String>, AppError> {
    let source = resolve_source(peer, &headers, state.trust_forwarded_headers);
    debug!(%source, "rendering gateways");

    let gateways = state
        .selector
        .view_state(source)
        .await
        .map_err(AppError::View)?;
    Ok(Html(render_page(&source.to_string(), &gateways)))
}

async fn set_gateway<R: RemoteFirewall + 'static>(
    State(state): State<AppState<R>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Form(form): Form<ActivateForm>,
) -> Result<Redirect, AppError> {
    let source = resolve_source(peer, &headers, state.trust_forwarded_headers);
    info!(%source, gateway = %form.gateway, "gateway requested");

    state
        .selector
        .activate(source, &form.gateway)
        .await
        .map_err(AppError::activation)?;
    Ok(Redirect::to("/"))
}

/// Serve `router` on `listener` until `shutdown` resolves, then wait for
/// in-flight requests.
pub async fn serve<F>(listener: TcpListener, router: Router, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await
}
