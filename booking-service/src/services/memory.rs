//! In-memory booking store for tests and database-less development runs.
//!
//! Mirrors the Postgres backend's semantics, including the terminal-state
//! guard on payment status updates.

use crate::models::{Booking, Nakshatra, NewBooking, PaymentStatus, Pooja};
use crate::services::repository::BookingStore;
use async_trait::async_trait;
use service_core::error::AppError;
use std::collections::BTreeMap;
use tokio::sync::Mutex;
use tracing::warn;

#[derive(Default)]
struct Inner {
    next_booking_id: i64,
    next_catalog_id: i64,
    bookings: BTreeMap<i64, Booking>,
    poojas: Vec<Pooja>,
    nakshatras: Vec<Nakshatra>,
}

#[derive(Default)]
pub struct InMemoryBookingStore {
    inner: Mutex<Inner>,
}

impl InMemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pooja to the catalog, returning its assigned id.
    pub async fn seed_pooja(
        &self,
        name: &str,
        category_id: i64,
        price: rust_decimal::Decimal,
        description: Option<&str>,
    ) -> i64 {
        let mut inner = self.inner.lock().await;
        inner.next_catalog_id += 1;
        let id = inner.next_catalog_id;
        inner.poojas.push(Pooja {
            id,
            name: name.to_string(),
            category_id,
            price,
            description: description.map(str::to_string),
        });
        id
    }

    /// Add a nakshatra to the catalog, returning its assigned id.
    pub async fn seed_nakshatra(&self, name: &str) -> i64 {
        let mut inner = self.inner.lock().await;
        inner.next_catalog_id += 1;
        let id = inner.next_catalog_id;
        inner.nakshatras.push(Nakshatra {
            id,
            name: name.to_string(),
        });
        id
    }
}

#[async_trait]
impl BookingStore for InMemoryBookingStore {
    async fn create_pending_booking(&self, booking: NewBooking) -> Result<i64, AppError> {
        let mut inner = self.inner.lock().await;
        inner.next_booking_id += 1;
        let id = inner.next_booking_id;
        let now = chrono::Utc::now();
        inner.bookings.insert(
            id,
            Booking {
                id,
                pooja_id: booking.pooja_id,
                full_name: booking.full_name,
                email: booking.email,
                phone: booking.phone,
                nakshatra: booking.nakshatra,
                gotra: booking.gotra,
                preferred_date: booking.preferred_date,
                preferred_time: booking.preferred_time,
                sankalpam: booking.sankalpam,
                amount: booking.amount,
                razorpay_order_id: None,
                razorpay_payment_id: None,
                payment_status: PaymentStatus::Pending,
                created_at: now,
                updated_at: now,
            },
        );
        Ok(id)
    }

    async fn attach_gateway_order(&self, booking_id: i64, order_id: &str) -> Result<(), AppError> {
        let mut inner = self.inner.lock().await;
        if let Some(booking) = inner.bookings.get_mut(&booking_id) {
            booking.razorpay_order_id = Some(order_id.to_string());
            booking.updated_at = chrono::Utc::now();
        }
        Ok(())
    }

    async fn delete_booking(&self, booking_id: i64) -> Result<(), AppError> {
        let mut inner = self.inner.lock().await;
        let removable = inner
            .bookings
            .get(&booking_id)
            .is_some_and(|b| b.payment_status == PaymentStatus::Pending);
        if removable {
            inner.bookings.remove(&booking_id);
        } else {
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
        let mut inner = self.inner.lock().await;
        match inner.bookings.get_mut(&booking_id) {
            Some(booking) if !booking.payment_status.is_terminal() => {
                booking.payment_status = status;
                if let Some(payment_id) = gateway_payment_id {
                    booking.razorpay_payment_id = Some(payment_id.to_string());
                }
                booking.updated_at = chrono::Utc::now();
            }
            _ => {
                warn!(
                    booking_id = booking_id,
                    status = status.as_str(),
                    "Payment status update skipped: booking missing or already terminal"
                );
            }
        }
        Ok(())
    }

    async fn get_booking(&self, booking_id: i64) -> Result<Option<Booking>, AppError> {
        let inner = self.inner.lock().await;
        Ok(inner.bookings.get(&booking_id).cloned())
    }

    async fn list_nakshatras(&self) -> Result<Vec<Nakshatra>, AppError> {
        let inner = self.inner.lock().await;
        Ok(inner.nakshatras.clone())
    }

    async fn list_poojas_by_category(&self, category_id: i64) -> Result<Vec<Pooja>, AppError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .poojas
            .iter()
            .filter(|p| p.category_id == category_id)
            .cloned()
            .collect())
    }

    async fn get_pooja_by_name(&self, name: &str) -> Result<Option<Pooja>, AppError> {
        let inner = self.inner.lock().await;
        Ok(inner.poojas.iter().find(|p| p.name == name).cloned())
    }
}
