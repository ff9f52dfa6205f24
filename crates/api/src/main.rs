mod middleware;
mod response;
mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use cinerail_bus::{EventBus, SessionRegistry};
use cinerail_core::{Config, PaymentOrchestrator, ReservationService, TicketIssuer};
use cinerail_gateway::qr::QrSigner;
use cinerail_gateway::vnpay::VnpayConfig;
use cinerail_gateway::{Notifier, SmtpConfig};
use middleware::AppState;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cinerail_api=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting cinerail API server...");

    let config = Config::from_env()?;

    let pool = cinerail_db::create_pool(&config.database_url).await?;
    tracing::info!("database connection established");

    let bus = match &config.redis_host {
        Some(host) => {
            let port = config.redis_port.unwrap_or(6379);
            let auth = config.redis_password.as_deref().map(|p| format!(":{p}@")).unwrap_or_default();
            let url = format!("redis://{auth}{host}:{port}/{}", config.redis_db.unwrap_or(0));
            let bus = EventBus::redis(&url)?;
            bus.spawn_forwarder();
            tracing::info!(%host, %port, "event bus backed by redis");
            bus
        }
        None => {
            tracing::warn!(
                "REDIS_HOST not set: running with an in-process event bus; the standalone reaper process cannot reach these subscribers"
            );
            EventBus::local()
        }
    };

    let notifier = match Notifier::new(&SmtpConfig {
        host: config.smtp_host.clone(),
        port: config.smtp_port,
        username: config.smtp_username.clone(),
        password: config.smtp_password.clone(),
        from_address: config.smtp_sender.clone(),
    }) {
        Ok(notifier) => Some(notifier),
        Err(e) => {
            tracing::warn!(error = %e, "smtp transport unavailable, booking confirmations will be skipped");
            None
        }
    };

    let qr = QrSigner::new(&config.jwt_secret);
    let ticket_issuer = TicketIssuer::new(bus.clone(), qr);

    let vnpay = VnpayConfig {
        tmn_code: config.vnpay_tmn_code.clone(),
        hash_secret: config.vnpay_hash_secret.clone(),
        payment_url: config.vnpay_payment_url.clone(),
        return_url: config.vnpay_return_url.clone(),
    };

    let reservations = ReservationService::new(pool.clone(), bus.clone(), config.hold_ttl);
    let payments = Arc::new(PaymentOrchestrator::new(pool.clone(), bus.clone(), vnpay, ticket_issuer, notifier));
    let registry = SessionRegistry::new();

    let state = AppState {
        pool,
        reservations,
        payments,
        registry,
        bus,
        jwt_secret: config.jwt_secret.clone(),
    };

    let cors = if config.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(AllowOrigin::any())
            .allow_methods(tower_http::cors::Any)
            .allow_headers(tower_http::cors::Any)
    } else {
        let origins: Vec<axum::http::HeaderValue> =
            config.cors_origins.iter().filter_map(|o| o.parse().ok()).collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(tower_http::cors::Any)
            .allow_headers(tower_http::cors::Any)
    };

    let app = Router::new()
        .route("/health", axum::routing::get(health_check))
        .merge(routes::reservations::router())
        .merge(routes::payments::router())
        .merge(routes::ws::router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    let port: u16 = std::env::var("API_PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(3000);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;

    tracing::info!(%addr, "server listening");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;

    Ok(())
}

async fn health_check() -> &'static str {
    "OK"
}
