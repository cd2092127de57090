use std::sync::Arc;

use lingua_backend_rust::config::Config;
use lingua_backend_rust::logging::{init_tracing, LogSettings};
use lingua_backend_rust::qlearn::AdaptiveSelector;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();
    let _log_guard = init_tracing(&LogSettings::from_env(&config.log_level));

    let selector = lingua_backend_rust::create_selector(&config);
    let app = lingua_backend_rust::create_app(Arc::clone(&selector));

    let addr = config.bind_addr();
    tracing::info!(%addr, qtable = %config.qtable_path.display(), "adaptive selector listening");

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, %addr, "bind listener failed");
            std::process::exit(1);
        }
    };

    let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());

    if let Err(e) = server.await {
        tracing::error!(error = %e, "server error");
    }

    tracing::info!("HTTP server stopped, flushing value table");
    flush_on_shutdown(&selector);
    tracing::info!("Graceful shutdown complete");
}

fn flush_on_shutdown(selector: &AdaptiveSelector) {
    match selector.flush() {
        Ok(true) => tracing::info!("unsaved value table written"),
        Ok(false) => {}
        Err(e) => tracing::error!(error = %e, "value table could not be written on shutdown"),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
