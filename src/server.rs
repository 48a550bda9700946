use std::{net::SocketAddr, sync::Arc, time::SystemTime};

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::{config::DeviceDescriptor, data_aquisition::core::DeviceProber, topology::discover};

/// Shared by all requests. Every `/stp-graph` call probes the whole inventory again.
#[derive(Clone)]
pub struct AppState {
    pub prober: Arc<dyn DeviceProber>,
    pub inventory: Arc<Vec<DeviceDescriptor>>,
    pub max_workers: usize,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/stp-graph", get(stp_graph))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(listen: SocketAddr, state: AppState) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(listen).await?;
    info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(state)).await
}

async fn root() -> Json<serde_json::Value> {
    Json(json!({
        "message": "App is up and running",
        "time": humantime::format_rfc3339_seconds(SystemTime::now()).to_string(),
    }))
}

async fn stp_graph(State(state): State<AppState>) -> Response {
    let response = discover(state.prober.as_ref(), &state.inventory, state.max_workers).await;
    if response.error {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "detail": response.error_description })),
        )
            .into_response();
    }
    Json(response).into_response()
}
