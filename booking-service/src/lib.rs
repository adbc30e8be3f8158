pub mod config;
pub mod dtos;
pub mod handlers;
pub mod models;
pub mod services;

use axum::middleware::from_fn;
use axum::{
    Router,
    routing::{get, post},
};
use secrecy::ExposeSecret;
use service_core::error::AppError;
use service_core::middleware::request_id_middleware;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use config::Config;
use services::{BookingStore, PgBookingStore, RazorpayClient};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn BookingStore>,
    pub razorpay: RazorpayClient,
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application against Postgres: connect the pool, run
    /// migrations, and verify connectivity before serving.
    pub async fn build(config: Config) -> Result<Self, AppError> {
        let store = PgBookingStore::new(
            config.database.url.expose_secret(),
            config.database.max_connections,
            config.database.min_connections,
        )
        .await?;
        store.run_migrations().await?;
        store.health_check().await?;

        Self::build_with_store(config, Arc::new(store)).await
    }

    /// Build the application with an injected booking store
    /// (tests, database-less runs).
    pub async fn build_with_store(
        config: Config,
        store: Arc<dyn BookingStore>,
    ) -> Result<Self, AppError> {
        let razorpay =
            RazorpayClient::new(config.razorpay.clone()).map_err(AppError::ConfigError)?;
        if razorpay.is_configured() {
            tracing::info!("Razorpay client initialized");
        } else {
            tracing::warn!("Razorpay credentials not configured - bookings cannot be paid");
        }

        let state = AppState {
            config: config.clone(),
            store,
            razorpay,
        };

        let router = Router::new()
            .route("/health", get(handlers::health_check))
            .route("/ready", get(handlers::readiness_check))
            // Catalog endpoints
            .route("/api/nakshatras", get(handlers::catalog::list_nakshatras))
            .route("/api/poojas", get(handlers::catalog::get_pooja_by_name))
            .route(
                "/api/poojas/:category_id",
                get(handlers::catalog::list_poojas_by_category),
            )
            // Booking endpoints
            .route("/api/bookings", post(handlers::bookings::create_booking))
            .route(
                "/api/bookings/create",
                post(handlers::bookings::create_booking),
            )
            .route(
                "/api/bookings/verify",
                post(handlers::bookings::verify_payment),
            )
            .route(
                "/api/bookings/payment/callback",
                get(handlers::bookings::payment_callback),
            )
            .route("/api/bookings/:id", get(handlers::bookings::get_booking))
            .layer(CorsLayer::permissive())
            .layer(from_fn(request_id_middleware))
            .layer(
                TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                    let request_id = request
                        .headers()
                        .get("x-request-id")
                        .and_then(|value| value.to_str().ok())
                        .unwrap_or("-");

                    tracing::info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = %request.method(),
                        uri = %request.uri(),
                        version = ?request.version(),
                    )
                }),
            )
            .with_state(state);

        // Port 0 binds a random free port, used by the test harness.
        let addr = format!("{}:{}", config.server.host, config.server.port);
        let listener = TcpListener::bind(&addr).await?;
        let port = listener.local_addr()?.port();

        tracing::info!("Booking service listening on port {}", port);

        Ok(Self {
            port,
            listener,
            router,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router).await
    }
}
