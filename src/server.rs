//! Process initialization and runtime setup.
//!
//! Connects the backends the role needs, starts the bus consumers, and runs
//! the Axum server until SIGINT/SIGTERM.

use crate::application::consumers::{AnalyticsEventHandler, RedirectPropagationHandler};
use crate::application::services::{AnalyticsService, MappingService, RedirectService};
use crate::config::{Config, Role};
use crate::domain::bus::MessageBus;
use crate::domain::repositories::{AnalyticsRepository, MappingRepository, RedirectRepository};
use crate::infrastructure::bus::{ConsumerHandle, MemoryBus, RedisBus, consumer};
use crate::infrastructure::cache::{CacheService, MemoryCache, NullCache, RedisCache};
use crate::infrastructure::persistence::{
    MemoryAnalyticsRepository, MemoryMappingRepository, MemoryRedirectRepository,
    PgAnalyticsRepository, PgMappingRepository, PgRedirectRepository,
};
use crate::routes::app_router;
use crate::state::AppState;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};

/// Storage, cache and bus handles shared by the services.
#[derive(Clone)]
pub struct Backends {
    pub mapping: Arc<dyn MappingRepository>,
    pub redirect: Arc<dyn RedirectRepository>,
    pub analytics: Arc<dyn AnalyticsRepository>,
    pub cache: Arc<dyn CacheService>,
    pub bus: Arc<dyn MessageBus>,
    pub db: Option<PgPool>,
}

impl Backends {
    /// In-memory stores, cache and bus for single-process mode.
    pub fn in_memory() -> Self {
        Self {
            mapping: Arc::new(MemoryMappingRepository::new()),
            redirect: Arc::new(MemoryRedirectRepository::new()),
            analytics: Arc::new(MemoryAnalyticsRepository::new()),
            cache: Arc::new(MemoryCache::new()),
            bus: Arc::new(MemoryBus::new()),
            db: None,
        }
    }
}

/// The three services wired to one set of backends.
#[derive(Clone)]
pub struct Services {
    pub mapping: Arc<MappingService>,
    pub redirect: Arc<RedirectService>,
    pub analytics: Arc<AnalyticsService>,
}

impl Services {
    pub fn new(backends: &Backends, config: &Config) -> Self {
        let queues = config.queue_names();

        Self {
            mapping: Arc::new(MappingService::new(
                Arc::clone(&backends.mapping),
                Arc::clone(&backends.bus),
                queues.clone(),
            )),
            redirect: Arc::new(RedirectService::new(
                Arc::clone(&backends.redirect),
                Arc::clone(&backends.cache),
                Arc::clone(&backends.bus),
                queues.analytic,
                config.cache_ttl(),
            )),
            analytics: Arc::new(AnalyticsService::new(Arc::clone(&backends.analytics))),
        }
    }
}

/// Builds the handler state for `config.role`.
pub fn build_state(
    backends: &Backends,
    services: &Services,
    config: &Config,
    metrics: PrometheusHandle,
) -> AppState {
    AppState {
        role: config.role,
        mapping_service: Arc::clone(&services.mapping),
        redirect_service: Arc::clone(&services.redirect),
        analytics_service: Arc::clone(&services.analytics),
        cache: Arc::clone(&backends.cache),
        bus: Arc::clone(&backends.bus),
        db: backends.db.clone(),
        metrics,
    }
}

/// Declares the queues and starts the consumers the role owns.
///
/// # Errors
///
/// Returns an error if a queue cannot be declared.
pub async fn start_consumers(
    backends: &Backends,
    services: &Services,
    config: &Config,
) -> Result<Vec<ConsumerHandle>> {
    let queues = config.queue_names();
    for queue in [&queues.redirect, &queues.analytic] {
        backends
            .bus
            .declare_queue(queue)
            .await
            .with_context(|| format!("Failed to declare queue '{}'", queue))?;
    }

    let options = config.consumer_options();
    let mut handles = Vec::new();

    if config.role.runs_redirect() {
        handles.push(consumer::spawn(
            Arc::clone(&backends.bus),
            queues.redirect.clone(),
            Arc::new(RedirectPropagationHandler::new(Arc::clone(
                &services.redirect,
            ))),
            options.clone(),
        ));
    }

    if config.role.runs_analytics() {
        handles.push(consumer::spawn(
            Arc::clone(&backends.bus),
            queues.analytic.clone(),
            Arc::new(AnalyticsEventHandler::new(Arc::clone(&services.analytics))),
            options,
        ));
    }

    Ok(handles)
}

fn retry_strategy(attempts: usize) -> impl Iterator<Item = Duration> {
    ExponentialBackoff::from_millis(100)
        .max_delay(Duration::from_secs(5))
        .map(jitter)
        .take(attempts.saturating_sub(1))
}

/// Connects to PostgreSQL with exponential backoff and applies migrations.
///
/// # Errors
///
/// Returns an error if every attempt fails or a migration fails.
pub async fn connect_database(config: &Config, url: &str) -> Result<PgPool> {
    let options = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime));

    let pool = Retry::spawn(retry_strategy(config.connect_retries), || {
        let options = options.clone();
        async move {
            options.connect(url).await.inspect_err(|e| {
                tracing::warn!("Database connection attempt failed: {}", e);
            })
        }
    })
    .await
    .context("Failed to connect to database")?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Migrations applied");

    Ok(pool)
}

/// Connects every backend named in `config`, falling back to in-memory ones
/// where nothing is configured.
///
/// A configured cache that cannot be reached degrades to [`NullCache`]; a
/// configured database or bus that cannot be reached is fatal.
///
/// # Errors
///
/// Returns an error if the database or the bus cannot be reached.
pub async fn connect_backends(config: &Config) -> Result<Backends> {
    let mut backends = Backends::in_memory();

    if let Some(ref url) = config.database_url {
        let pool = connect_database(config, url).await?;
        let shared = Arc::new(pool.clone());
        backends.mapping = Arc::new(PgMappingRepository::new(shared.clone()));
        backends.redirect = Arc::new(PgRedirectRepository::new(shared.clone()));
        backends.analytics = Arc::new(PgAnalyticsRepository::new(shared));
        backends.db = Some(pool);
    } else {
        tracing::warn!("DATABASE_URL not set, stores are in memory");
    }

    backends.cache = match config.redis_url {
        Some(ref url) => {
            match Retry::spawn(retry_strategy(config.connect_retries), || {
                RedisCache::connect(url)
            })
            .await
            {
                Ok(redis) => {
                    tracing::info!("Cache enabled (Redis)");
                    Arc::new(redis)
                }
                Err(e) => {
                    tracing::warn!("Failed to connect to Redis: {}. Using NullCache.", e);
                    Arc::new(NullCache::new())
                }
            }
        }
        None if config.role == Role::All && config.database_url.is_none() => {
            tracing::info!("Cache in memory");
            Arc::clone(&backends.cache)
        }
        None => {
            tracing::info!("Cache disabled (NullCache)");
            Arc::new(NullCache::new())
        }
    };

    if let Some(ref url) = config.bus_url {
        let bus = Retry::spawn(retry_strategy(config.connect_retries), || {
            RedisBus::connect(url)
        })
        .await
        .context("Failed to connect to message bus")?;
        backends.bus = Arc::new(bus);
    } else {
        tracing::warn!("BUS_URL not set, queues are in memory and lost on exit");
    }

    Ok(backends)
}

/// Runs the process with the given configuration.
///
/// Initializes:
/// - Prometheus recorder
/// - Backends (PostgreSQL + migrations, Redis cache, Redis bus, or in-memory)
/// - Bus consumers for the role
/// - Axum HTTP server with graceful shutdown
///
/// # Errors
///
/// Returns an error if:
/// - A required backend cannot be reached
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let metrics = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;

    let backends = connect_backends(&config).await?;
    let services = Services::new(&backends, &config);
    let consumers = start_consumers(&backends, &services, &config).await?;

    let state = build_state(&backends, &services, &config, metrics);
    let app = app_router(state);

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(role = %config.role, "Listening on http://{addr}");

    axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("HTTP server stopped, draining consumers");
    for handle in consumers {
        handle.shutdown().await;
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
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
                tracing::error!("Failed to listen for SIGTERM: {}", e);
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

    tracing::info!("Shutdown signal received");
}
