use std::process::ExitCode;

use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware,
};
use axum_server::Handle;
use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use budget_bubbles::{
    AppState, Backend, Config, Error, build_router, graceful_shutdown, logging_middleware,
    store::{DocumentStore, RestTableStore, SQLiteStore, Store},
};

#[tokio::main]
async fn main() -> ExitCode {
    setup_logging();

    let config = Config::parse();

    if let Err(error) = config.validate() {
        tracing::error!("{error}");
        return ExitCode::FAILURE;
    }

    let result = match config.backend {
        Backend::Sqlite => match SQLiteStore::open(&config.datastore_url) {
            Ok(store) => serve(store, &config).await,
            Err(error) => Err(error),
        },
        Backend::Rest => match RestTableStore::new(
            &config.datastore_url,
            config.datastore_key.as_deref().unwrap_or_default(),
        ) {
            Ok(store) => serve(store, &config).await,
            Err(error) => Err(error),
        },
        Backend::Document => match DocumentStore::open(&config.datastore_url) {
            Ok(store) => serve(store, &config).await,
            Err(error) => Err(error),
        },
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!("The server stopped with an error: {error}");
            ExitCode::FAILURE
        }
    }
}

/// Prepare `store`, serve the API until a shutdown signal arrives, then
/// close the store.
async fn serve<S: Store>(store: S, config: &Config) -> Result<(), Error> {
    store.ensure_collections().await?;

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = build_router(AppState::new(store.clone()))
        .layer(middleware::from_fn(logging_middleware));
    let router = add_tracing_layer(router);

    let addr = config.address();
    tracing::info!(
        "HTTP server listening on {addr} with the {:?} backend",
        config.backend
    );
    axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await?;

    tracing::info!("Server stopped, closing the datastore");
    store.close().await
}

fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().pretty())
        .init();
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
        // Errors are logged where they are converted to responses.
        .on_failure(());

    router.layer(tracing_layer)
}
