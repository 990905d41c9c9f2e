//! Axum server setup, shared application state, and graceful shutdown.
//!
//! Contains [`AppState`] (the `Arc`-shared state holding the forwarder,
//! outcome counters, and uptime), [`build_router`] for the webhook and
//! health routes, [`build_http_client`] for the connection-pooled hyper
//! client used by the record API, and [`shutdown_signal`] for
//! SIGTERM / Ctrl+C handling.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::Instrument;

use crate::forwarder::notification::RuntimeEvent;
use crate::forwarder::{Forwarder, InvocationReply, Outcome};
use crate::health::health_handler;

#[derive(Debug)]
pub struct Stats {
    pub inserted: AtomicU64,
    pub ignored: AtomicU64,
    pub failed: AtomicU64,
}

impl Default for Stats {
    fn default() -> Self {
        Self::new()
    }
}

impl Stats {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inserted: AtomicU64::new(0),
            ignored: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }

    pub fn record(&self, outcome: &Outcome) {
        let counter = match outcome {
            Outcome::Inserted => &self.inserted,
            Outcome::Ignored => &self.ignored,
            Outcome::InsertFailed { .. } | Outcome::Misconfigured | Outcome::InternalError => {
                &self.failed
            }
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

pub type HttpsConnector =
    hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>;
pub type HttpClient = Client<HttpsConnector, http_body_util::Full<bytes::Bytes>>;

pub struct AppState {
    pub forwarder: Forwarder,
    pub start_time: Instant,
    pub stats: Stats,
}

#[must_use]
pub fn build_http_client() -> HttpClient {
    // Already installed on repeat calls.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let https = hyper_rustls::HttpsConnectorBuilder::new()
        .with_webpki_roots()
        .https_or_http()
        .enable_http1()
        .build();
    Client::builder(TokioExecutor::new())
        .pool_idle_timeout(Duration::from_secs(30))
        .build(https)
}

pub fn build_router(state: Arc<AppState>, max_body: usize) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/submission-created", post(submission_handler))
        .route("/invoke", post(invoke_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(max_body)),
        )
        .with_state(state)
}

fn invocation_id(headers: &HeaderMap) -> String {
    headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| uuid::Uuid::new_v4().to_string(), String::from)
}

/// Run one invocation inside its own span and count the outcome.
pub async fn invoke(state: &AppState, id: &str, body: Option<&str>) -> Outcome {
    let span = tracing::info_span!("invocation", invocation_id = %id);
    let outcome = state.forwarder.handle(body).instrument(span.clone()).await;
    state.stats.record(&outcome);
    span.in_scope(|| {
        tracing::info!(
            outcome = outcome.label(),
            status = outcome.status_code().as_u16(),
            "invocation finished"
        );
    });
    outcome
}

/// `POST /submission-created`: the request body is the notification itself.
pub async fn submission_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Outcome {
    let id = invocation_id(&headers);
    match std::str::from_utf8(&body) {
        Ok(text) => invoke(&state, &id, Some(text)).await,
        Err(e) => {
            tracing::error!(invocation_id = %id, error = %e, "notification body is not UTF-8");
            state.stats.record(&Outcome::InternalError);
            Outcome::InternalError
        }
    }
}

/// `POST /invoke`: the request body is a runtime event wrapping the
/// notification in a `body` string; the outcome travels in the reply.
pub async fn invoke_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Json<InvocationReply> {
    let id = invocation_id(&headers);
    let outcome = match serde_json::from_slice::<RuntimeEvent>(&body) {
        Ok(event) => invoke(&state, &id, event.body.as_deref()).await,
        Err(e) => {
            tracing::error!(invocation_id = %id, error = %e, "invalid runtime event");
            state.stats.record(&Outcome::InternalError);
            Outcome::InternalError
        }
    };
    Json(outcome.reply())
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
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
        () = ctrl_c => tracing::info!("received Ctrl+C"),
        () = terminate => tracing::info!("received SIGTERM"),
    }
}
