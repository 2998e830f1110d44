/// Auth Service - Main entry point
/// Serves the REST API for registration, login and session management
use actix_middleware::{CorrelationIdMiddleware, Logging};
use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use redis_utils::RedisPool;
use session_auth::{
    MemorySessionLedger, RedisSessionLedger, SessionLedger, SessionManager, TokenCodec,
};
use std::sync::Arc;
use tracing::{info, warn};

use auth_service::{
    config::{LedgerBackend, Settings},
    db::MemoryUserRepository,
    routes,
    security::init_dummy_hash,
    AppState,
};

#[actix_web::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "auth_service=info,info".into()),
        )
        .with_target(false)
        .json()
        .init();

    info!("Starting Auth Service");

    // Load configuration
    let settings = Settings::load().context("Failed to load configuration")?;

    init_dummy_hash();

    let codec = TokenCodec::new(&settings.jwt.secret).context("Invalid JWT_SECRET")?;

    let ledger: Arc<dyn SessionLedger> = match settings.redis.ledger {
        LedgerBackend::Redis => {
            let pool = RedisPool::connect(&settings.redis.url)
                .await
                .context("Failed to connect to Redis")?;
            pool.ping(settings.redis.response_timeout)
                .await
                .context("Redis did not answer PING")?;
            info!("Redis session ledger initialized");
            Arc::new(RedisSessionLedger::new(
                pool.manager(),
                settings.redis.response_timeout,
            ))
        }
        LedgerBackend::Memory => {
            warn!("Using in-memory session ledger; sessions are lost on restart");
            Arc::new(MemorySessionLedger::new())
        }
    };

    let users = Arc::new(MemoryUserRepository::new());
    let sessions = SessionManager::new(
        Arc::new(codec),
        ledger,
        users.clone(),
        settings.session.session_config(),
    );

    let state = AppState {
        sessions,
        users,
        request_timeout: settings.session.request_timeout,
    };

    let bind_address = format!("{}:{}", settings.server.host, settings.server.port);
    info!(address = %bind_address, workers = settings.server.workers, "HTTP server listening");

    HttpServer::new(move || {
        let state = state.clone();
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(Logging)
            .wrap(CorrelationIdMiddleware)
            .configure(move |cfg| routes::configure(cfg, &state))
    })
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {}", bind_address))?
    .workers(settings.server.workers)
    .run()
    .await
    .context("HTTP server error")?;

    info!("Auth Service stopped");
    Ok(())
}
