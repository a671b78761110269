//! Waiting Room
//!
//! Admission gate in front of an origin with a hard concurrency ceiling:
//! - Admits sessions up to `max_active_users`, each with a sliding TTL
//! - Queues everyone else in strict arrival order
//! - Promotes the head of the line as slots free
//! - Coordinates every instance through one shared Redis store

use std::net::SocketAddr;
use std::str::FromStr;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};

use api::{router, AppState, OriginClient};
use controller::{AdmissionController, PromotionWorker};
use room_core::{Error as RoomError, FailurePolicy, RoomConfig};
use state_store::{health::check_connection, StoreBackend, StoreConfig};
use telemetry::{health, init_tracing_from_env};

/// Prefix for every environment override.
const ENV_PREFIX: &str = "WAITING_ROOM";

/// Application configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct Config {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,

    /// Origin that admitted requests are forwarded to
    #[serde(default = "default_origin_url")]
    origin_url: String,

    /// Behavior when the store is unreachable
    #[serde(default)]
    failure_policy: FailurePolicy,

    #[serde(default)]
    room: RoomConfig,

    #[serde(default)]
    store: StoreConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_origin_url() -> String {
    "http://127.0.0.1:3000".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            origin_url: default_origin_url(),
            failure_policy: FailurePolicy::default(),
            room: RoomConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing_from_env();

    info!("Starting Waiting Room v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config()?;

    // Capacity and TTL mistakes abort startup, never a request
    config.room.validate_config().map_err(|e| match e {
        RoomError::CapacityMisconfigured(n) => {
            anyhow::anyhow!("max_active_users must be >= 1, got {}", n)
        }
        other => anyhow::Error::new(other).context("Invalid room configuration"),
    })?;

    info!(
        max_active_users = config.room.max_active_users,
        active_ttl_secs = config.room.active_ttl_secs,
        queue_ttl_secs = config.room.queue_ttl_secs,
        admission_policy = ?config.room.admission_policy,
        failure_policy = ?config.failure_policy,
        store = ?config.store.backend,
        origin = %config.origin_url,
        "Loaded waiting room config"
    );

    if config.store.backend == StoreBackend::Memory {
        warn!("In-process store selected: capacity is enforced per instance, not globally");
    }

    let store = state_store::connect(&config.store)
        .await
        .context("Failed to connect to state store")?;

    if check_connection(store.as_ref()).await {
        health().store.set_healthy();
        info!("Store connection: healthy");
    } else {
        health().store.set_unhealthy("Connection failed");
        error!("Store connection: unhealthy");
    }

    let controller = AdmissionController::new(store, config.room.clone())
        .context("Failed to create admission controller")?;

    let _promotion_handle = config.room.promotion_interval().map(|interval| {
        PromotionWorker::new(controller.scheduler().clone(), interval).start()
    });

    let origin = OriginClient::new(&config.origin_url).context("Invalid origin")?;
    let state = AppState::new(controller, config.failure_policy, origin);

    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid server address")?;

    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutdown complete");
    Ok(())
}

/// Load configuration from files and environment.
fn load_config() -> Result<Config> {
    let config = config::Config::builder()
        // Start with defaults
        .add_source(config::Config::try_from(&Config::default())?)
        // Load from config file if exists
        .add_source(
            config::File::with_name("config/default")
                .required(false)
                .format(config::FileFormat::Toml),
        )
        // Override with environment variables (WAITING_ROOM__ROOM__MAX_ACTIVE_USERS=...)
        .add_source(
            config::Environment::default()
                .separator("__")
                .prefix(ENV_PREFIX)
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    let mut config: Config = config
        .try_deserialize()
        .context("Failed to deserialize configuration")?;

    // Flat overrides for the settings operators touch most. The nested form
    // does not work reliably with underscored field names.
    if let Some(max) = env_override("MAX_ACTIVE_USERS")? {
        config.room.max_active_users = max;
    }
    if let Some(ttl) = env_override("ACTIVE_TTL_SECS")? {
        config.room.active_ttl_secs = ttl;
    }
    if let Some(ttl) = env_override("QUEUE_TTL_SECS")? {
        config.room.queue_ttl_secs = ttl;
    }
    if let Some(page) = env_override("WAITING_PAGE")? {
        config.room.waiting_page = page;
    }
    if let Some(name) = env_override("COOKIE_NAME")? {
        config.room.cookie_name = name;
    }
    if let Some(policy) = env_override("ADMISSION_POLICY")? {
        config.room.admission_policy = policy;
    }
    if let Some(secs) = env_override("PROMOTION_INTERVAL_SECS")? {
        config.room.promotion_interval_secs = Some(secs);
    }
    if let Some(policy) = env_override("FAILURE_POLICY")? {
        config.failure_policy = policy;
    }
    if let Some(url) = env_override("ORIGIN_URL")? {
        config.origin_url = url;
    }
    if let Some(url) = env_override::<String>("REDIS_URL")? {
        config.store.url = url;
        config.store.backend = StoreBackend::Redis;
    }
    if let Some(prefix) = env_override("KEY_PREFIX")? {
        config.store.key_prefix = prefix;
    }

    Ok(config)
}

/// Reads and parses `WAITING_ROOM_<name>` if set.
fn env_override<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let key = format!("{}_{}", ENV_PREFIX, name);
    match std::env::var(&key) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .map_err(|e| anyhow::anyhow!("Invalid {}: {}", key, e)),
        Err(_) => Ok(None),
    }
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received terminate signal");
        }
    }
}
