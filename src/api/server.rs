//! HTTP API server

use super::handlers::*;
use crate::service::Tracker;
use axum::{
    routing::{delete, get},
    Router,
};
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// Server address
    pub addr: SocketAddr,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            addr: ([127, 0, 0, 1], 5000).into(),
        }
    }
}

/// API server state
#[derive(Clone)]
pub struct AppState {
    pub tracker: Tracker,
}

/// Build the dashboard router
pub fn build_router(tracker: Tracker) -> Router {
    Router::new()
        // Probes
        .route("/api/test", get(test_handler))
        .route("/api/health", get(health_handler))
        // Friends
        .route(
            "/api/friends",
            get(list_friends_handler).post(create_friend_handler),
        )
        .route(
            "/api/friends/:id",
            get(get_friend_handler)
                .patch(update_friend_handler)
                .delete(delete_friend_handler),
        )
        .route(
            "/api/friends/:id/interactions",
            get(friend_interactions_handler),
        )
        // Interactions
        .route(
            "/api/interactions",
            get(list_interactions_handler).post(log_interaction_handler),
        )
        .route("/api/interactions/:id", delete(delete_interaction_handler))
        // Statistics
        .route("/api/stats/overview", get(overview_stats_handler))
        .route("/api/stats/weekly", get(weekly_stats_handler))
        // State
        .with_state(AppState { tracker })
        // Middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// API server
pub struct ApiServer {
    config: ApiServerConfig,
    tracker: Tracker,
}

impl ApiServer {
    /// Create new API server
    pub fn new(config: ApiServerConfig, tracker: Tracker) -> Self {
        Self { config, tracker }
    }

    pub fn addr(&self) -> SocketAddr {
        self.config.addr
    }

    /// Serve until Ctrl-C
    pub async fn serve(self) -> anyhow::Result<()> {
        let router = build_router(self.tracker);

        let listener = match tokio::net::TcpListener::bind(self.config.addr).await {
            Ok(listener) => listener,
            Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => {
                return Err(anyhow::anyhow!(
                    "Address {} is already in use. Pass --addr or set server.addr to another port.",
                    self.config.addr
                ));
            }
            Err(e) => return Err(e.into()),
        };

        info!("API server listening on http://{}", self.config.addr);

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("API server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
