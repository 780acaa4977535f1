use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use creamy_config::{Settings, load_settings};
use creamy_core::GatewaySelector;
use creamy_gateway::{AppState, StartupError, router, serve};

/// Let each client on the network pick its own outbound gateway.
#[derive(Parser)]
#[command(name = "creamy-gateway")]
#[command(version)]
struct Args {
    /// Configuration file (default: platform config dir)
    #[arg(short, long, env = "CREAMY_GATEWAY_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address, overriding the configured port
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Log as JSON lines
    #[arg(long)]
    json_logs: bool,
}

fn init_tracing(verbosity: u8, debug: bool, json: bool) {
    let level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let directives = if debug {
        format!("{level},creamy_api=trace")
    } else {
        level.to_owned()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives));

    let subscriber = tracing_subscriber::registry().with(filter);
    if json {
        subscriber
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        subscriber
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .init();
    }
}

/// Resolves on Ctrl-C or SIGTERM.
async fn interrupted() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let settings = match load_settings(args.config.as_deref()) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("{:?}", miette::Report::new(StartupError::from(err)));
            return ExitCode::FAILURE;
        }
    };

    init_tracing(args.verbose, settings.debug, args.json_logs);

    match run(&settings, args.listen).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{:?}", miette::Report::new(err));
            ExitCode::FAILURE
        }
    }
}

async fn run(settings: &Settings, listen: Option<SocketAddr>) -> Result<(), StartupError> {
    let config = settings.selector_config()?;
    info!(
        console = %config.url,
        interface = %config.interface,
        gateways = config.gateways.len(),
        "gateway selector configured"
    );

    let selector = Arc::new(GatewaySelector::connect(config)?);
    let app = router(AppState::new(selector, settings.trust_forwarded_headers));

    let addr = listen.unwrap_or_else(|| settings.listen_addr());
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| StartupError::Bind { addr, source })?;
    info!(%addr, "listening");

    let shutdown = CancellationToken::new();
    let mut server = tokio::spawn(serve(listener, app, shutdown.clone().cancelled_owned()));

    tokio::select! {
        joined = &mut server => return finished(joined),
        () = interrupted() => {}
    }

    let grace = settings.shutdown_grace();
    info!(grace_secs = grace.as_secs(), "interrupt received, shutting down");
    shutdown.cancel();

    tokio::select! {
        joined = &mut server => {
            finished(joined)?;
            info!("graceful shutdown finished");
        }
        () = tokio::time::sleep(grace) => {
            warn!("in-flight requests did not finish in time, exiting");
        }
        () = interrupted() => {
            warn!("second interrupt, exiting without waiting");
        }
    }
    Ok(())
}

fn finished(
    joined: Result<std::io::Result<()>, tokio::task::JoinError>,
) -> Result<(), StartupError> {
    match joined {
        Ok(result) => result.map_err(StartupError::Serve),
        Err(e) => {
            error!(error = %e, "server task failed");
            Err(StartupError::Serve(std::io::Error::other(e)))
        }
    }
}
