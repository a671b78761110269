//! Common test setup functions.

use api::{router, AppState, OriginClient};
use axum::{
    http::{Method, Uri},
    Router,
};
use bytes::Bytes;
use controller::AdmissionController;
use room_core::{FailurePolicy, RoomConfig};
use state_store::{MemoryStore, SharedStore};
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::mocks::FailingStore;

/// Capacity used unless a test asks for another.
pub const TEST_CAPACITY: i64 = 3;

/// Test context with the real router, an in-process store and a stub origin.
///
/// This exercises the production code paths end to end:
/// - The real Axum router with the gate middleware
/// - The real admission controller over [`MemoryStore`]
/// - A real HTTP origin on a local port, reached through the proxy
pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub router: Router,
    pub origin_url: String,
    _origin: JoinHandle<()>,
}

impl TestContext {
    /// Capacity 3, default TTLs, fail closed.
    pub async fn new() -> Self {
        Self::with_config(RoomConfig::with_capacity(TEST_CAPACITY)).await
    }

    pub async fn with_config(room: RoomConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let (origin_url, origin) = spawn_origin().await;
        let router = build_router(
            store.clone(),
            room,
            FailurePolicy::Closed,
            &origin_url,
        );

        Self {
            store,
            router,
            origin_url,
            _origin: origin,
        }
    }
}

/// Test context whose store can be taken down.
pub struct OutageContext {
    pub store: FailingStore,
    pub router: Router,
    _origin: JoinHandle<()>,
}

impl OutageContext {
    /// Store starts out failing.
    pub async fn new(failure_policy: FailurePolicy) -> Self {
        let store = FailingStore::new();
        let (origin_url, origin) = spawn_origin().await;
        let router = build_router(
            Arc::new(store.clone()),
            RoomConfig::with_capacity(TEST_CAPACITY),
            failure_policy,
            &origin_url,
        );

        Self {
            store,
            router,
            _origin: origin,
        }
    }
}

fn build_router(
    store: SharedStore,
    room: RoomConfig,
    failure_policy: FailurePolicy,
    origin_url: &str,
) -> Router {
    let controller =
        AdmissionController::new(store, room).expect("Failed to create admission controller");
    let origin = OriginClient::new(origin_url).expect("Failed to create origin client");
    router(AppState::new(controller, failure_policy, origin))
}

/// Origin response body: `"<METHOD> <path?query>"`, plus the request body if any.
async fn echo(method: Method, uri: Uri, body: Bytes) -> String {
    if body.is_empty() {
        format!("{} {}", method, uri)
    } else {
        format!("{} {} {}", method, uri, String::from_utf8_lossy(&body))
    }
}

/// Starts the stub origin on an ephemeral port.
pub async fn spawn_origin() -> (String, JoinHandle<()>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind stub origin");
    let addr = listener.local_addr().expect("Stub origin has no address");

    let app = Router::new().fallback(echo);
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    (format!("http://{}", addr), handle)
}
