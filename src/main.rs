use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;

use kartixa::{
    auth::build_auth_services,
    config::{AppConfig, validate::security_warnings},
    db::{UserStore, connection::connect, dao::{DaoBase, UserDao}},
    logging::{init_tracing, startup_failure},
    rate_limit::{FixedWindowRateLimiter, PURGE_INTERVAL},
    routes::app,
    state::AppState,
};

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        // The subscriber may not be installed yet when config loading fails.
        eprintln!("{}", startup_failure(&err));
        tracing::error!("server failed: {err:?}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cfg = AppConfig::from_env().context("invalid configuration")?;
    init_tracing(&cfg.rust_log);
    tracing::info!(config = ?cfg, "configuration loaded");
    for warning in security_warnings(&cfg) {
        tracing::warn!("[SECURITY] {warning}");
    }

    let db = connect(&cfg).await?;
    let store: Arc<dyn UserStore> = Arc::new(UserDao::new(&db));
    let auth = build_auth_services(&cfg, store)?;

    let limiter = Arc::new(FixedWindowRateLimiter::from_config(&cfg));
    limiter.spawn_purge_task(PURGE_INTERVAL);

    let addr: SocketAddr = format!("{}:{}", cfg.host, cfg.port)
        .parse()
        .context("invalid HOST/PORT")?;

    let state = AppState::new(cfg, auth, limiter, Arc::new(db));
    let router = app(state);

    tracing::info!("listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}
