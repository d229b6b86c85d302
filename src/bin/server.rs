use std::{
    env::{self},
    fs::OpenOptions,
    net::SocketAddr,
    process::ExitCode,
    sync::Arc,
    time::Duration,
};

use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware,
};
use axum_server::Handle;
use clap::Parser;
use tower_http::trace::TraceLayer;

#[cfg(debug_assertions)]
use tower_livereload::LiveReloadLayer;

use tracing_subscriber::{EnvFilter, Layer, filter, layer::SubscriberExt, util::SubscriberInitExt};

use buzon_quejas::{
    ApiClient, AppState, ComplaintStore, DEFAULT_API_URL, DEFAULT_REFRESH_INTERVAL,
    DEFAULT_REQUEST_TIMEOUT, RefreshScheduler, build_router, graceful_shutdown,
    logging_middleware,
};

/// The administration console for the citizen complaints service.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// The base URL of the remote complaints API.
    #[arg(long, env = "API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// The port to serve the console from.
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// Seconds between refreshes of the complaint list.
    #[arg(
        long,
        default_value_t = DEFAULT_REFRESH_INTERVAL.as_secs(),
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    refresh_secs: u64,

    /// Seconds to wait for the remote API before giving up on a request.
    #[arg(
        long,
        default_value_t = DEFAULT_REQUEST_TIMEOUT.as_secs(),
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    request_timeout_secs: u64,

    /// The canonical name of the local timezone, e.g. "America/Mexico_City".
    #[arg(long, env = "TIMEZONE", default_value = "America/Mexico_City")]
    timezone: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(error) = setup_logging() {
        eprintln!("Could not set up logging: {error}");
        return ExitCode::FAILURE;
    }

    let args = Args::parse();

    let Ok(secret) = env::var("SECRET") else {
        tracing::error!("The environment variable 'SECRET' must be set");
        return ExitCode::FAILURE;
    };

    let gateway = match ApiClient::new(
        &args.api_url,
        Duration::from_secs(args.request_timeout_secs),
    ) {
        Ok(gateway) => gateway,
        Err(error) => {
            tracing::error!("Invalid API URL {}: {error}", args.api_url);
            return ExitCode::FAILURE;
        }
    };

    let store = ComplaintStore::shared();
    let state = match AppState::new(&secret, &args.timezone, gateway.clone(), store.clone()) {
        Ok(state) => state,
        Err(error) => {
            tracing::error!("Could not create app state: {error}");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!("Using the complaints API at {}", gateway.base_url());
    let mut scheduler = RefreshScheduler::new(Duration::from_secs(args.refresh_secs));
    scheduler.start(gateway, store);

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = add_tracing_layer(
        build_router(state).layer(middleware::from_fn(logging_middleware)),
    );

    #[cfg(debug_assertions)]
    let router = router.layer(LiveReloadLayer::new());

    let addr = SocketAddr::from(([127, 0, 0, 1], args.port));
    tracing::info!("HTTP server listening on {}", addr);
    let result = axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await;

    scheduler.stop().await;

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!("Server error: {error}");
            ExitCode::FAILURE
        }
    }
}

fn setup_logging() -> Result<(), std::io::Error> {
    let stdout_log = tracing_subscriber::fmt::layer().pretty();

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open("debug.log")?;

    let debug_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_writer(Arc::new(log_file));

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(
            stdout_log
                .with_filter(filter::LevelFilter::INFO)
                .and_then(debug_log)
                .with_filter(env_filter),
        )
        .init();

    Ok(())
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // By default, `TraceLayer` will log 5xx responses but we're doing our specific
        // logging of errors so disable that
        .on_failure(());

    router.layer(tracing_layer)
}
