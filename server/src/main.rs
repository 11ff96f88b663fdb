use std::{future::IntoFuture, pin::pin, sync::Arc, time::Duration};

use anyhow::Context;
use redis_connection::{
    CacheService, MemoryCache, MemoryConfig, RedisCache, connect_redis_db,
    ping_redis,
};
use sql_connection::connect_postgres_db;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use user_cache_server::{HealthState, ServerConfig, build_app};
use user_cached_store::CachedUserStore;
use user_dao::UserDao;
use user_store::UserStore;

const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;

    info!("Initializing connection pools...");

    let db = connect_postgres_db(&config.database)
        .await
        .context("Failed to connect to PostgreSQL")?;
    info!("PostgreSQL connection pool initialized");

    let cache: Arc<dyn CacheService> = match &config.redis {
        Some(redis_config) => {
            let pool = connect_redis_db(redis_config).await?;
            if ping_redis(&pool, config.cache.cache_timeout()).await {
                info!("Redis connection pool initialized");
            }
            else {
                warn!(
                    "Redis did not answer PING; serving from the database \
                     until the cache recovers"
                );
            }
            Arc::new(RedisCache::new(pool))
        }
        None => {
            info!("REDIS_URL not set, using the in-process cache");
            Arc::new(MemoryCache::new(MemoryConfig::default()))
        }
    };

    let users: Arc<dyn UserStore> = Arc::new(CachedUserStore::new(
        UserDao::new(db.clone()),
        cache.clone(),
        config.cache.clone(),
    ));

    let app = build_app(users, HealthState {
        db: Some(db),
        cache,
    });

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("User cache server listening on {}", addr);

    let (stopping_tx, stopping_rx) = watch::channel(false);
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            info!("Shutdown signal received, draining connections");
            let _ = stopping_tx.send(true);
        })
        .into_future();
    let server = pin!(server);

    tokio::select! {
        result = server => result?,
        () = drain_deadline(stopping_rx) => {
            warn!("Connections still open after {:?}, exiting", DRAIN_TIMEOUT);
        }
    }

    info!("Server stopped");
    Ok(())
}

/// Resolves `DRAIN_TIMEOUT` after shutdown starts; never resolves before.
async fn drain_deadline(mut stopping: watch::Receiver<bool>) {
    if stopping.wait_for(|stopping| *stopping).await.is_ok() {
        tokio::time::sleep(DRAIN_TIMEOUT).await;
    }
    else {
        std::future::pending::<()>().await;
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(
            tokio::signal::unix::SignalKind::terminate(),
        ) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
