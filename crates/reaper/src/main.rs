use cinerail_bus::EventBus;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cinerail_reaper=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting cinerail reaper...");

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = cinerail_db::create_pool(&database_url).await?;
    tracing::info!("database connection established");

    // Horizontal scale uses a shared cache/pub-sub. The reaper is its
    // own OS process (mirroring a separate api/jobs binary split), so
    // its releases only reach the API process's subscribers when both
    // are wired to the same Redis instance.
    let bus = match std::env::var("REDIS_HOST").ok() {
        Some(host) => {
            let port = std::env::var("REDIS_PORT").unwrap_or_else(|_| "6379".to_string());
            let password = std::env::var("REDIS_PASSWORD").ok();
            let auth = password.map(|p| format!(":{p}@")).unwrap_or_default();
            let url = format!("redis://{auth}{host}:{port}");
            let bus = EventBus::redis(&url)?;
            bus.spawn_forwarder();
            tracing::info!(%host, %port, "reaper publishing through redis-backed event bus");
            bus
        }
        None => {
            tracing::warn!(
                "REDIS_HOST not set: reaper will sweep the database but its seat_released \
                 events won't reach any other process's subscribers"
            );
            EventBus::local()
        }
    };

    tracing::info!(
        period_secs = cinerail_core::reaper::TICK_PERIOD.as_secs(),
        "reaper running"
    );

    cinerail_core::reaper::run_forever(pool, bus).await
}
