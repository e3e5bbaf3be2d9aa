#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static ALLOC: jemallocator::Jemalloc = jemallocator::Jemalloc;

use tanimart::{AppError, app, config::AppConfig};
use tokio::{net::TcpListener, signal};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "TaniMart server exited with error");
        std::process::exit(1);
    }

    tracing::info!("Server stopped gracefully");
}

async fn run() -> tanimart::Result<()> {
    let config = AppConfig::from_env()?;
    tracing::info!(
        delivery_fee = %config.checkout.delivery_fee,
        max_connections = config.database.max_connections,
        "Configuration loaded"
    );

    let app = app::build(&config).await?;

    let addr = config.server_address();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to bind to {}: {}", addr, e)))?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal()?)
        .await
        .map_err(|e| AppError::InternalError(format!("Server error: {}", e)))
}

/// Installs the signal listeners up front so a failure aborts startup.
fn shutdown_signal() -> tanimart::Result<impl Future<Output = ()> + Send + 'static> {
    #[cfg(unix)]
    let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
        .map_err(|e| AppError::InternalError(format!("Failed to install SIGTERM handler: {}", e)))?;

    Ok(async move {
        #[cfg(unix)]
        let terminate = async move {
            sigterm.recv().await;
        };
        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        wait_for_shutdown(signal::ctrl_c(), terminate).await;
    })
}

async fn wait_for_shutdown<C, T>(ctrl_c: C, terminate: T)
where
    C: Future<Output = std::io::Result<()>>,
    T: Future<Output = ()>,
{
    tokio::select! {
        result = ctrl_c => match result {
            Ok(()) => tracing::info!("Ctrl+C received, draining connections"),
            Err(e) => tracing::warn!("Ctrl+C listener failed, shutting down: {}", e),
        },
        _ = terminate => tracing::info!("SIGTERM received, draining connections"),
    }
}
