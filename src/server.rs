//! HTTP surface: `GET /resort-status` and a health check.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};
use axum::http::Method;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::db::{RequestInfo, SnapshotStore};
use crate::fetch::Fetcher;
use crate::model::ResortSnapshot;
use crate::service::StatusService;

const STATUS_PATH: &str = "/resort-status";
const HEALTHZ_PATH: &str = "/healthz";

const NO_CACHE_HEADERS: &[(&str, &str)] = &[
    ("cache-control", "no-store, no-cache, must-revalidate, proxy-revalidate"),
    ("pragma", "no-cache"),
    ("expires", "0"),
    ("surrogate-control", "no-store"),
];

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("allowed origin `{origin}` is not a valid header value")]
    InvalidOrigin { origin: String },
    #[error("failed to bind to {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
    #[error("axum server error: {source}")]
    Serve {
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Serialize)]
struct HealthzResponse {
    status: &'static str,
}

pub fn build_router<F, S>(service: Arc<StatusService<F, S>>, config: &AppConfig) -> Result<Router, ServerError>
where
    F: Fetcher + 'static,
    S: SnapshotStore + 'static,
{
    let mut router = Router::new()
        .route(STATUS_PATH, get(resort_status::<F, S>))
        .route(HEALTHZ_PATH, get(healthz))
        .with_state(service)
        .layer(build_cors_layer(&config.allowed_origins)?);

    for &(name, value) in NO_CACHE_HEADERS {
        router = router.layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        ));
    }
    Ok(router.layer(TraceLayer::new_for_http()))
}

fn build_cors_layer(origins: &[String]) -> Result<CorsLayer, ServerError> {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin).map_err(|_| ServerError::InvalidOrigin {
                origin: origin.clone(),
            })
        })
        .collect::<Result<_, _>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]))
}

async fn resort_status<F, S>(
    State(service): State<Arc<StatusService<F, S>>>,
    Query(params): Query<Vec<(String, String)>>,
    headers: HeaderMap,
) -> Json<ResortSnapshot>
where
    F: Fetcher + 'static,
    S: SnapshotStore + 'static,
{
    let header_text = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let request = RequestInfo {
        force: forced(&params),
        origin: header_text(header::ORIGIN),
        user_agent: header_text(header::USER_AGENT),
    };
    let snapshot = service.obtain(request.force, &request).await;
    info!(source = snapshot.provenance.source(), force = request.force, "resort status served");
    Json(snapshot)
}

/// Only a literal `force=true` forces; repeats are allowed.
fn forced(params: &[(String, String)]) -> bool {
    params.iter().any(|(key, value)| key == "force" && value == "true")
}

async fn healthz() -> Json<HealthzResponse> {
    Json(HealthzResponse { status: "ok" })
}

pub async fn serve<F, S>(service: Arc<StatusService<F, S>>, config: &AppConfig) -> Result<(), ServerError>
where
    F: Fetcher + 'static,
    S: SnapshotStore + 'static,
{
    let router = build_router(service, config)?;
    let listener = TcpListener::bind(config.listen)
        .await
        .map_err(|source| ServerError::Bind {
            address: config.listen.to_string(),
            source,
        })?;
    info!(addr = %config.listen, "resort status service listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|source| ServerError::Serve { source })?;
    info!("server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            warn!(%error, "failed to capture Ctrl+C signal");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(error) => {
                warn!(%error, "failed to capture SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Ctrl+C received, shutting down"),
        _ = sigterm => info!("SIGTERM received, shutting down"),
    }
}
