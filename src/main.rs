use std::sync::{Arc, Mutex};

use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use ridesphere::config::AppConfig;
use ridesphere::db;
use ridesphere::handlers;
use ridesphere::services::payments::PaymentLedger;
use ridesphere::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;

    let payments = PaymentLedger::new(config.payment_token_ttl_secs, config.allow_token_reuse);
    if config.allow_token_reuse {
        tracing::warn!("payment token reuse enabled; tokens are not single-use");
    }

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: config.clone(),
        payments,
    });

    let app = Router::new()
        .route("/api/health", get(handlers::health::health))
        .route("/api/signup", post(handlers::auth::signup))
        .route("/api/login", post(handlers::auth::login))
        .route("/api/me", get(handlers::auth::me))
        .route("/api/routes", get(handlers::catalog::list_routes))
        .route("/api/schedules", get(handlers::catalog::list_schedules))
        .route(
            "/api/schedules/:id/seats",
            get(handlers::seats::reserved_seats),
        )
        .route(
            "/api/schedule/:id/seats",
            get(handlers::seats::reserved_seats),
        )
        .route("/api/seats", get(handlers::seats::reserved_seats_query))
        .route("/api/pay", post(handlers::payments::request_payment))
        .route("/api/book", post(handlers::bookings::create_booking))
        .route("/api/mybookings", get(handlers::bookings::my_bookings))
        .route(
            "/api/booking_qr/:id",
            get(handlers::bookings::booking_proof),
        )
        .route(
            "/api/cancel_booking/:id",
            post(handlers::bookings::cancel_booking),
        )
        .route(
            "/api/cancel_booking",
            post(handlers::bookings::cancel_booking_by_body),
        )
        .route(
            "/api/bookings/:id",
            delete(handlers::bookings::cancel_booking_delete),
        )
        .route("/api/rate_booking", post(handlers::ratings::rate_booking))
        .route(
            "/api/bookings/:id/rating",
            post(handlers::ratings::rate_booking_by_path),
        )
        .route("/api/app_rating", post(handlers::ratings::submit_app_rating))
        .route("/api/feedback", post(handlers::ratings::submit_app_rating))
        .route("/api/admin/routes", post(handlers::admin::add_route))
        .route(
            "/api/admin/routes/:id",
            put(handlers::admin::update_route).delete(handlers::admin::delete_route),
        )
        .route("/api/admin/schedules", post(handlers::admin::add_schedule))
        .route(
            "/api/admin/schedules/:id",
            put(handlers::admin::update_schedule).delete(handlers::admin::delete_schedule),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
