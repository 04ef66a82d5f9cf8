//! HTTP surface of the store.
//!
//! | Route | Handler |
//! |-------|---------|
//! | `GET /api/catalog?page=N` | [`routes::catalog_handler`] |
//! | `GET /api/materials` | [`routes::materials_handler`] |
//! | `POST /api/send-email` | [`routes::send_email_handler`] |
//! | `POST /api/orders` | [`routes::order_handler`] |
//! | `POST /api/3d-orders` | [`routes::print_order_handler`] |

use std::{sync::Arc, time::Duration};

use axum::{
    extract::DefaultBodyLimit,
    http::{header::CONTENT_TYPE, Method},
    routing::{get, post},
    Router,
};
use signal::ctrl_c;
#[cfg(unix)]
use signal::unix::{signal, SignalKind};
use tokio::{net::TcpListener, signal};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

pub mod error;
pub mod payloads;
pub mod routes;
pub mod state;

use crate::actors::Limits;
use routes::{catalog_handler, materials_handler, order_handler, print_order_handler, send_email_handler};
use state::State;

/// Contact requests carry a few text fields only.
pub const CONTACT_BODY_LIMIT: usize = 1024 * 1024;

/// Body cap for `/api/3d-orders`: a base64 model at the size limit plus room
/// for the other fields.
pub fn model_body_limit(limits: &Limits) -> usize {
    let encoded = limits.max_model_bytes.saturating_mul(4) / 3 + 1024 * 1024;
    usize::try_from(encoded).unwrap_or(usize::MAX)
}

/// Body cap for `/api/orders`.
pub fn order_body_limit(limits: &Limits) -> usize {
    usize::try_from(limits.max_request_bytes).unwrap_or(usize::MAX)
}

/// Body cap for `/api/send-email`, never above the order cap.
pub fn contact_body_limit(limits: &Limits) -> usize {
    CONTACT_BODY_LIMIT.min(order_body_limit(limits))
}

pub fn router(state: Arc<State>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    let limits = state.limits;
    Router::new()
        .route("/api/catalog", get(catalog_handler))
        .route("/api/materials", get(materials_handler))
        .route(
            "/api/send-email",
            post(send_email_handler).layer(DefaultBodyLimit::max(contact_body_limit(&limits))),
        )
        .route(
            "/api/orders",
            post(order_handler).layer(DefaultBodyLimit::max(order_body_limit(&limits))),
        )
        .route(
            "/api/3d-orders",
            post(print_order_handler).layer(DefaultBodyLimit::max(model_body_limit(&limits))),
        )
        .layer(cors)
        .with_state(state)
}

pub async fn start_server(port: u16, state: Arc<State>) -> Result<(), String> {
    let app = router(state);

    let address = format!("0.0.0.0:{port}");
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address)
        .await
        .map_err(|e| format!("Failed to bind {address}: {e}"))?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| format!("Server error: {e}"))?;

    info!("Server shutting down...");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!(error = %e, "Failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!(error = %e, "Failed to install signal handler");
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
