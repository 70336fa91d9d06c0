//! Herald API server binary entrypoint.

use std::sync::Arc;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use herald_common::config::AppConfig;
use herald_engine::directory::StaticDirectory;

use herald_api::logging::init_logging;
use herald_api::routes::create_router;
use herald_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = AppConfig::from_env()?;

    // Initialize tracing
    let _log_guard = init_logging(config.log_dir.as_deref())?;

    tracing::info!("Starting Herald API server...");

    // Build application state
    let directory = Arc::new(StaticDirectory::seeded());
    tracing::info!(
        programs = directory.program_count(),
        "Recipient directory loaded"
    );
    let state = AppState::from_config(&config, directory)?;
    let dispatcher = state.dispatcher.clone();

    // Build router
    let app = create_router(state).layer(TraceLayer::new_for_http());

    // Start one server per listen address, all sharing the same dispatcher
    let shutdown = CancellationToken::new();
    let mut servers = JoinSet::new();
    for (index, addr) in config.listen_addrs.iter().enumerate() {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!(listener = index, %addr, "API server listening");

        let app = app.clone();
        let token = shutdown.clone();
        servers.spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(token.cancelled_owned())
                .await
        });
    }

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received shutdown signal, stopping gracefully...");
        }
        Some(result) = servers.join_next() => {
            tracing::error!(?result, "A listener exited unexpectedly, stopping the rest");
        }
    }

    shutdown.cancel();
    while let Some(result) = servers.join_next().await {
        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!(error = %e, "Listener exited with error"),
            Err(e) => tracing::error!(error = %e, "Listener task failed"),
        }
    }

    dispatcher.shutdown().await;
    tracing::info!("Herald API server stopped.");
    Ok(())
}
