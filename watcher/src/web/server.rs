// File: watcher/src/web/server.rs
use anyhow::Result;
use axum::{
    routing::{delete, get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::web::{handlers, AppState};

pub async fn start_web_server(state: AppState) -> Result<()> {
    let addr = format!("{}:{}", state.config.host, state.config.port);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server running on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(handlers::liveness))
        .route("/api/help", get(handlers::help))
        .route("/api/watches", post(handlers::add_watch))
        .route(
            "/api/watches/{subscriber_id}",
            get(handlers::list_watches),
        )
        .route(
            "/api/watches/{subscriber_id}/{host}",
            delete(handlers::delete_watch),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
