//! Booking store: durable persistence of bookings and the ritual catalog.

use crate::models::{Booking, Nakshatra, NewBooking, PaymentStatus, Pooja};
use async_trait::async_trait;
use service_core::error::AppError;
use sqlx::Row;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use std::time::Duration;
use tracing::{info, warn};

/// Storage contract for bookings and the ritual catalog.
///
/// One concrete Postgres backend serves production; an in-memory backend
/// backs tests and database-less development runs.
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Insert a new booking with `payment_status = pending` and return its
    /// store-assigned id. Field validation happens at the boundary before
    /// this is called.
    async fn create_pending_booking(&self, booking: NewBooking) -> Result<i64, AppError>;

    /// Attach the gateway order reference to a booking. Idempotent; updates
    /// the order-reference field only.
    async fn attach_gateway_order(&self, booking_id: i64, order_id: &str) -> Result<(), AppError>;

    /// Remove a pending booking whose gateway order could not be created,
    /// so no orphaned pending-without-order booking persists. Bookings in a
    /// terminal state are never deleted.
    async fn delete_booking(&self, booking_id: i64) -> Result<(), AppError>;

    /// Transition a booking's payment status and, on `paid`, record the
    /// gateway payment reference. A no-op (logged, not an error) when the
    /// booking does not exist or is already in a terminal state, so a late
    /// `failed` callback cannot clobber an already-`paid` booking.
    async fn set_payment_status(
        &self,
        booking_id: i64,
        status: PaymentStatus,
        gateway_payment_id: Option<&str>,
    ) -> Result<(), AppError>;

    async fn get_booking(&self, booking_id: i64) -> Result<Option<Booking>, AppError>;

    async fn list_nakshatras(&self) -> Result<Vec<Nakshatra>, AppError>;

    async fn list_poojas_by_category(&self, category_id: i64) -> Result<Vec<Pooja>, AppError>;

    async fn get_pooja_by_name(&self, name: &str) -> Result<Option<Pooja>, AppError>;
}

/// Postgres-backed booking store over a bounded connection pool.
#[derive(Clone)]
pub struct PgBookingStore {
    pool: PgPool,
}

impl PgBookingStore {
    /// Create a new store with a bounded connection pool.
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health.
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }

    /// Run database migrations.
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }
}

fn booking_from_row(row: &PgRow) -> Result<Booking, AppError> {
    let status: String = row
        .try_get("payment_status")
        .map_err(|e| AppError::DatabaseError(e.into()))?;
    let payment_status = PaymentStatus::parse(&status).ok_or_else(|| {
        AppError::DatabaseError(anyhow::anyhow!("Unknown payment status '{}'", status))
    })?;

    let get = |e: sqlx::Error| AppError::DatabaseError(e.into());

    Ok(Booking {
        id: row.try_get("id").map_err(get)?,
        pooja_id: row.try_get("pooja_id").map_err(get)?,
        full_name: row.try_get("full_name").map_err(get)?,
        email: row.try_get("email").map_err(get)?,
        phone: row.try_get("phone").map_err(get)?,
        nakshatra: row.try_get("nakshatra").map_err(get)?,
        gotra: row.try_get("gotra").map_err(get)?,
        preferred_date: row.try_get("preferred_date").map_err(get)?,
        preferred_time: row.try_get("preferred_time").map_err(get)?,
        sankalpam: row.try_get("sankalpam").map_err(get)?,
        amount: row.try_get("amount").map_err(get)?,
        razorpay_order_id: row.try_get("razorpay_order_id").map_err(get)?,
        razorpay_payment_id: row.try_get("razorpay_payment_id").map_err(get)?,
        payment_status,
        created_at: row.try_get("created_at").map_err(get)?,
        updated_at: row.try_get("updated_at").map_err(get)?,
    })
}

fn pooja_from_row(row: &PgRow) -> Result<Pooja, AppError> {
    let get = |e: sqlx::Error| AppError::DatabaseError(e.into());
    Ok(Pooja {
        id: row.try_get("id").map_err(get)?,
        name: row.try_get("name").map_err(get)?,
        category_id: row.try_get("category_id").map_err(get)?,
        price: row.try_get("price").map_err(get)?,
        description: row.try_get("description").map_err(get)?,
    })
}

#[async_trait]
impl BookingStore for PgBookingStore {
    async fn create_pending_booking(&self, booking: NewBooking) -> Result<i64, AppError> {
        let booking_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO bookings (
                pooja_id, full_name, email, phone, nakshatra, gotra,
                preferred_date, preferred_time, sankalpam, amount, payment_status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 'pending')
            RETURNING id
            "#,
        )
        .bind(booking.pooja_id)
        .bind(&booking.full_name)
        .bind(&booking.email)
        .bind(&booking.phone)
        .bind(&booking.nakshatra)
        .bind(&booking.gotra)
        .bind(booking.preferred_date)
        .bind(&booking.preferred_time)
        .bind(&booking.sankalpam)
        .bind(booking.amount)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                AppError::ValidationError(format!("Unknown pooja_id {}", booking.pooja_id))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to create booking: {}", e)),
        })?;

        info!(
            booking_id = booking_id,
            pooja_id = booking.pooja_id,
            amount = %booking.amount,
            "Booking created in pending state"
        );

        Ok(booking_id)
    }

    async fn attach_gateway_order(&self, booking_id: i64, order_id: &str) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE bookings
            SET razorpay_order_id = $2, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(booking_id)
        .bind(order_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to attach order: {}", e)))?;

        Ok(())
    }

    async fn delete_booking(&self, booking_id: i64) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            DELETE FROM bookings
            WHERE id = $1 AND payment_status = 'pending'
            "#,
        )
        .bind(booking_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to delete booking: {}", e)))?;

        if result.rows_affected() == 0 {
            warn!(booking_id = booking_id, "Rollback delete matched no pending booking");
        }

        Ok(())
    }

    async fn set_payment_status(
        &self,
        booking_id: i64,
        status: PaymentStatus,
        gateway_payment_id: Option<&str>,
    ) -> Result<(), AppError> {
        // Only a pending booking may transition; paid and failed are terminal.
        let result = sqlx::query(
            r#"
            UPDATE bookings
            SET payment_status = $2,
                razorpay_payment_id = COALESCE($3, razorpay_payment_id),
                updated_at = now()
            WHERE id = $1 AND payment_status = 'pending'
            "#,
        )
        .bind(booking_id)
        .bind(status.as_str())
        .bind(gateway_payment_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update status: {}", e)))?;

        if result.rows_affected() == 0 {
            warn!(
                booking_id = booking_id,
                status = status.as_str(),
                "Payment status update skipped: booking missing or already terminal"
            );
        } else {
            info!(
                booking_id = booking_id,
                status = status.as_str(),
                "Payment status updated"
            );
        }

        Ok(())
    }

    async fn get_booking(&self, booking_id: i64) -> Result<Option<Booking>, AppError> {
        let row = sqlx::query(
            r#"
            SELECT id, pooja_id, full_name, email, phone, nakshatra, gotra,
                   preferred_date, preferred_time, sankalpam, amount,
                   razorpay_order_id, razorpay_payment_id, payment_status,
                   created_at, updated_at
            FROM bookings
            WHERE id = $1
            "#,
        )
        .bind(booking_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get booking: {}", e)))?;

        row.as_ref().map(booking_from_row).transpose()
    }

    async fn list_nakshatras(&self) -> Result<Vec<Nakshatra>, AppError> {
        let rows = sqlx::query("SELECT id, name FROM nakshatras ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to list nakshatras: {}", e))
            })?;

        let get = |e: sqlx::Error| AppError::DatabaseError(e.into());
        rows.iter()
            .map(|row| {
                Ok(Nakshatra {
                    id: row.try_get("id").map_err(get)?,
                    name: row.try_get("name").map_err(get)?,
                })
            })
            .collect()
    }

    async fn list_poojas_by_category(&self, category_id: i64) -> Result<Vec<Pooja>, AppError> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, category_id, price, description
            FROM poojas
            WHERE category_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(category_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list poojas: {}", e)))?;

        rows.iter().map(pooja_from_row).collect()
    }

    async fn get_pooja_by_name(&self, name: &str) -> Result<Option<Pooja>, AppError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, category_id, price, description
            FROM poojas
            WHERE name = $1
            LIMIT 1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get pooja: {}", e)))?;

        row.as_ref().map(pooja_from_row).transpose()
    }
}
