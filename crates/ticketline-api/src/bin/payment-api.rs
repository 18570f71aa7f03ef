//! Payment processor server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use ticketline_api::error::AppError;
use ticketline_api::routes;
use ticketline_api::state::PaymentState;
use ticketline_client::HttpBookingClient;
use ticketline_core::clock::SystemClock;
use ticketline_core::retry::RetryPolicy;
use ticketline_payment::service::PaymentService;
use ticketline_store::{PgPaymentRepository, PgReconciliationStore};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting payment processor server");

    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| AppError::Config("DATABASE_URL environment variable must be set".into()))?;
    let booking_service_url = std::env::var("BOOKING_SERVICE_URL")
        .unwrap_or_else(|_| "http://localhost:8081".to_string());
    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "8083".to_string())
        .parse()
        .map_err(|e| AppError::Config(format!("PORT must be a valid u16: {e}")))?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await?;
    ticketline_store::run_migrations(&pool).await?;

    let service = Arc::new(PaymentService::new(
        Arc::new(PgPaymentRepository::new(pool.clone())),
        Arc::new(HttpBookingClient::new(booking_service_url)?),
        Arc::new(PgReconciliationStore::new(pool)),
        Arc::new(SystemClock),
        RetryPolicy::default(),
    ));

    let app = Router::new()
        .merge(routes::health::router())
        .nest("/api/payments", routes::payments::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(PaymentState::new(service));

    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
