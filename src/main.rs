use std::net::SocketAddr;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use exam_gate::{config::Config, routes, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::info!("✅ Configuration loaded successfully");

    let state = AppState::new(&config)?;
    let app = routes::router(state.clone())?;

    let sweep_every = Duration::from_secs(config.session_sweep_seconds.max(1));
    let api_timeout = Duration::from_secs(config.api_timeout_seconds);
    let grace = chrono::Duration::seconds(config.session_sweep_seconds as i64);
    let sessions = state.sessions.clone();
    let clear_ledger = state.clear_ledger.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(sweep_every).await;
            let removed = sessions.sweep(grace).await;
            if removed > 0 {
                tracing::info!("🧹 Swept {} finished sessions", removed);
            }
            let forgotten = clear_ledger.prune(sweep_every.max(api_timeout * 2));
            if forgotten > 0 {
                tracing::debug!("🧹 Forgot {} old credential clears", forgotten);
            }
        }
    });

    tracing::info!("🚀 Server listening on http://{}", config.bind_addr);
    tracing::info!("✅ Session sweep job started (every {:?})", sweep_every);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
