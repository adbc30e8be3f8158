//! Request and response types for the HTTP surface.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{Booking, PaymentStatus, Pooja};

/// Request to create a new booking.
#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub pooja_id: Option<i64>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub nakshatra: Option<String>,
    pub gotra: Option<String>,
    pub preferred_date: Option<String>,
    pub preferred_time: Option<String>,
    pub sankalpam: Option<String>,
    /// Major currency units (rupees); accepts a JSON number or numeric string.
    pub amount: Option<serde_json::Value>,
}

/// Response after creating a booking and its gateway order.
#[derive(Debug, Serialize)]
pub struct CreateBookingResponse {
    pub success: bool,
    pub booking_id: i64,
    /// Razorpay order ID (use this in frontend checkout).
    pub order_id: String,
    /// Amount in smallest currency unit, as created at the gateway.
    pub amount: u64,
    pub currency: String,
    /// Razorpay key ID (for frontend initialization).
    pub key_id: String,
}

/// Request to verify a payment after checkout.
#[derive(Debug, Deserialize)]
pub struct VerifyPaymentRequest {
    pub razorpay_order_id: Option<String>,
    pub razorpay_payment_id: Option<String>,
    pub razorpay_signature: Option<String>,
    pub booking_id: Option<i64>,
}

/// Response after verifying a payment.
#[derive(Debug, Serialize)]
pub struct VerifyPaymentResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub booking_id: Option<i64>,
}

/// Booking view returned by the status lookup endpoint.
#[derive(Debug, Serialize)]
pub struct BookingResponse {
    pub id: i64,
    pub pooja_id: i64,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub nakshatra: Option<String>,
    pub gotra: Option<String>,
    pub preferred_date: Option<NaiveDate>,
    pub preferred_time: Option<String>,
    pub sankalpam: Option<String>,
    pub amount: Decimal,
    pub razorpay_order_id: Option<String>,
    pub razorpay_payment_id: Option<String>,
    pub payment_status: PaymentStatus,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Booking> for BookingResponse {
    fn from(b: Booking) -> Self {
        Self {
            id: b.id,
            pooja_id: b.pooja_id,
            full_name: b.full_name,
            email: b.email,
            phone: b.phone,
            nakshatra: b.nakshatra,
            gotra: b.gotra,
            preferred_date: b.preferred_date,
            preferred_time: b.preferred_time,
            sankalpam: b.sankalpam,
            amount: b.amount,
            razorpay_order_id: b.razorpay_order_id,
            razorpay_payment_id: b.razorpay_payment_id,
            payment_status: b.payment_status,
            created_at: b.created_at.to_rfc3339(),
            updated_at: b.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PoojaListResponse {
    pub success: bool,
    pub data: Vec<Pooja>,
}

#[derive(Debug, Deserialize)]
pub struct PoojaLookupParams {
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PoojaLookupResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Pooja>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
