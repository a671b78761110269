//! API routes.

pub mod health;
pub mod proxy;
pub mod status;
pub mod waiting_page;

use axum::{middleware::from_fn_with_state, routing::get, Router};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::middleware::gate;
use crate::state::AppState;

/// Path of the status endpoint polled by the waiting page.
pub const STATUS_PATH: &str = "/waiting_room/status";

/// Creates the router: waiting room endpoints are open, everything else is
/// gated and forwarded to the origin.
pub fn router(state: AppState) -> Router {
    let mut open = Router::new()
        .route("/health", get(health::health_handler))
        .route("/health/ready", get(health::ready_handler))
        .route("/health/live", get(health::live_handler))
        .route("/metrics", get(health::metrics_handler))
        .route(STATUS_PATH, get(status::status_handler));

    // Absolute URLs point at an externally hosted page
    let waiting_page = state.room().waiting_page.clone();
    if waiting_page.starts_with('/') && waiting_page != STATUS_PATH {
        open = open.route(&waiting_page, get(waiting_page::waiting_page_handler));
    }

    let gated = Router::new()
        .fallback(proxy::proxy_handler)
        .layer(from_fn_with_state(state.clone(), gate));

    open.merge(gated)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}
