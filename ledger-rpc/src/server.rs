//! HTTP server and router

use crate::methods::dispatch;
use crate::types::{RpcRequest, RpcResponse, JSONRPC_VERSION};
use crate::RpcError;
use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use ledger_chain::{ChainManager, ChainMetrics};
use ledger_txpool::NoncePool;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// State shared by every request handler.
///
/// The chain manager sits behind one mutex, which serializes all appends.
#[derive(Clone)]
pub struct ApiState {
    pub chain: Arc<Mutex<ChainManager>>,
    pub pool: Arc<NoncePool>,
    pub metrics: ChainMetrics,
}

impl ApiState {
    pub fn new(chain: ChainManager, pool: Arc<NoncePool>) -> Self {
        let metrics = chain.metrics().clone();
        Self {
            chain: Arc::new(Mutex::new(chain)),
            pool,
            metrics,
        }
    }
}

/// Build the router with the RPC, health and metrics endpoints
pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/rpc", post(handle_rpc))
        .route("/health", get(health_check))
        .route("/metrics", get(render_metrics))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve the router on `listener` until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, state: ApiState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!("RPC server listening on http://{}", addr);
    }

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn handle_rpc(State(state): State<ApiState>, body: Bytes) -> Json<RpcResponse> {
    let value: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(e) => {
            return Json(RpcResponse::failure(
                Value::Null,
                &RpcError::Parse(e.to_string()),
            ))
        }
    };

    let id = value.get("id").cloned().unwrap_or(Value::Null);
    let request: RpcRequest = match serde_json::from_value(value) {
        Ok(request) => request,
        Err(e) => {
            return Json(RpcResponse::failure(
                id,
                &RpcError::InvalidRequest(e.to_string()),
            ))
        }
    };

    if let Some(version) = request.jsonrpc.as_deref() {
        if version != JSONRPC_VERSION {
            let error = RpcError::InvalidRequest(format!("unsupported version {}", version));
            return Json(RpcResponse::failure(request.id, &error));
        }
    }

    match dispatch(&state, &request.method, request.params).await {
        Ok(result) => Json(RpcResponse::success(request.id, result)),
        Err(e) => {
            warn!(method = %request.method, "RPC call failed: {}", e);
            Json(RpcResponse::failure(request.id, &e))
        }
    }
}

async fn health_check(State(state): State<ApiState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "chain_height": state.metrics.chain_height.get(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn render_metrics(State(state): State<ApiState>) -> Response {
    match state.metrics.render() {
        Ok(text) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}
