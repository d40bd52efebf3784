use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use revq_core::store::ReviewStore;
use revq_gateway::config::GatewayConfig;
use revq_gateway::router::build_app_router;
use revq_gateway::state::AppState;
use revq_queue::{ReviewEvents, ReviewQueueController, UpdateDetector};
use revq_rag::RagApi;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "revq_gateway=debug,revq_queue=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = GatewayConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = config.port,
        backend = %config.backend_base_url,
        poll_interval_secs = config.poll_interval_secs,
        "Loaded gateway configuration",
    );

    // --- Backend client ---
    let store: Arc<dyn ReviewStore> = Arc::new(
        RagApi::new(&config.backend_base_url, &config.backend_token)
            .with_timeout(Duration::from_secs(config.backend_timeout_secs)),
    );

    // --- Queue state machine ---
    let events = ReviewEvents::default();
    let detector = Arc::new(UpdateDetector::new(Arc::clone(&store), events.clone()));
    let controller = Arc::new(ReviewQueueController::new(
        Arc::clone(&store),
        Arc::clone(&detector),
        events.clone(),
        config.page_size,
        Duration::from_secs(config.poll_interval_secs),
    ));

    let event_logger = spawn_event_logger(&events);

    // Initial load, then start polling if the preconditions hold.
    controller.reload().await;
    controller.resync_polling().await;
    let snapshot = controller.snapshot().await;
    if snapshot.stale {
        tracing::warn!("Initial review load failed; serving an empty queue until a reload succeeds");
    } else {
        tracing::info!(total_items = snapshot.total_items, "Initial review load complete");
    }

    // --- App state / router ---
    let state = AppState {
        config: Arc::new(config.clone()),
        store,
        controller,
        detector: Arc::clone(&detector),
        events,
    };
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting gateway");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    detector.stop();
    event_logger.abort();

    tracing::info!("Graceful shutdown complete");
}

/// Log every review event; useful operational breadcrumbs for a queue
/// whose interesting transitions happen on a background timer.
fn spawn_event_logger(events: &ReviewEvents) -> tokio::task::JoinHandle<()> {
    let mut rx = events.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => tracing::info!(?event, "Review event"),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event logger lagged behind");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the gateway
/// shuts down cleanly whether stopped interactively or by a process
/// manager (e.g. systemd, Docker, Kubernetes).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
