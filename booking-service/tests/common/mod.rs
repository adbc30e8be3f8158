//! Common test utilities for booking-service integration tests.
//!
//! Spawns the application on a random port with an in-memory booking store
//! and a wiremock server standing in for the Razorpay Orders API.

use booking_service::Application;
use booking_service::config::{Config, DatabaseConfig, RazorpayConfig, ServerConfig};
use booking_service::services::{BookingStore, InMemoryBookingStore};
use hmac::{Hmac, Mac};
use rust_decimal::Decimal;
use secrecy::Secret;
use sha2::Sha256;
use std::sync::{Arc, Once};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TEST_KEY_ID: &str = "rzp_test_key";
pub const TEST_KEY_SECRET: &str = "rzp_test_secret";

static INIT: Once = Once::new();

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,booking_service=debug")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
    pub store: Arc<InMemoryBookingStore>,
    pub razorpay_server: MockServer,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let store = Self::seeded_store().await;
        Self::spawn_with_store(store.clone(), store).await
    }

    /// Seeded in-memory store used by `spawn`; exposed so tests can wrap it
    /// (e.g. to inject storage failures) before handing it to the app.
    pub async fn seeded_store() -> Arc<InMemoryBookingStore> {
        let store = Arc::new(InMemoryBookingStore::new());
        store
            .seed_pooja(
                "Ganapathi Homam",
                1,
                Decimal::new(500, 0),
                Some("Daily homam for removing obstacles"),
            )
            .await;
        store
            .seed_pooja("Satyanarayana Pooja", 2, Decimal::new(1500, 0), None)
            .await;
        store.seed_nakshatra("Ashwini").await;
        store.seed_nakshatra("Bharani").await;
        store
    }

    /// Spawn the app against `app_store` while keeping `store` for direct
    /// seeding and assertions.
    pub async fn spawn_with_store(
        store: Arc<InMemoryBookingStore>,
        app_store: Arc<dyn BookingStore>,
    ) -> Self {
        init_tracing();

        let razorpay_server = MockServer::start().await;

        let config = Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Random port
            },
            database: DatabaseConfig {
                url: Secret::new("postgres://unused-in-tests".to_string()),
                max_connections: 2,
                min_connections: 1,
            },
            razorpay: RazorpayConfig {
                key_id: TEST_KEY_ID.to_string(),
                key_secret: Secret::new(TEST_KEY_SECRET.to_string()),
                api_base_url: razorpay_server.uri(),
                request_timeout_secs: 5,
            },
            service_name: "booking-service-test".to_string(),
        };

        let app = Application::build_with_store(config, app_store)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server to be ready by polling the health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            client,
            store,
            razorpay_server,
        }
    }

    /// Mount a successful order-creation mock that only matches requests
    /// carrying the expected minor-unit amount.
    pub async fn mock_order(&self, order_id: &str, amount_minor: u64) {
        Mock::given(method("POST"))
            .and(path("/orders"))
            .and(body_partial_json(serde_json::json!({
                "amount": amount_minor,
                "currency": "INR"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": order_id,
                "entity": "order",
                "amount": amount_minor,
                "amount_paid": 0,
                "amount_due": amount_minor,
                "currency": "INR",
                "receipt": null,
                "status": "created",
                "attempts": 0,
                "created_at": 0
            })))
            .mount(&self.razorpay_server)
            .await;
    }

    /// Mount a failing order-creation mock.
    pub async fn mock_order_failure(&self) {
        Mock::given(method("POST"))
            .and(path("/orders"))
            .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
                "error": { "code": "SERVER_ERROR", "description": "order creation failed" }
            })))
            .mount(&self.razorpay_server)
            .await;
    }

    pub async fn create_booking(&self, body: serde_json::Value) -> reqwest::Response {
        self.client
            .post(format!("{}/api/bookings", self.address))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn verify_payment(&self, body: serde_json::Value) -> reqwest::Response {
        self.client
            .post(format!("{}/api/bookings/verify", self.address))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn get_booking(&self, booking_id: i64) -> reqwest::Response {
        self.client
            .get(format!("{}/api/bookings/{}", self.address, booking_id))
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Compute the signature Razorpay would send for this order/payment pair.
    pub fn sign(&self, order_id: &str, payment_id: &str) -> String {
        type HmacSha256 = Hmac<Sha256>;
        let mut mac =
            HmacSha256::new_from_slice(TEST_KEY_SECRET.as_bytes()).expect("HMAC key length");
        mac.update(format!("{}|{}", order_id, payment_id).as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}
