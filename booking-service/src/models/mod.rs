use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One ritual-booking request and its payment lifecycle.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Booking {
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
    /// Amount in major currency units (rupees). Minor units exist only at
    /// the gateway boundary.
    pub amount: Decimal,
    pub razorpay_order_id: Option<String>,
    pub razorpay_payment_id: Option<String>,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated input for a new booking row.
#[derive(Debug, Clone)]
pub struct NewBooking {
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
}

/// Payment lifecycle state of a booking.
///
/// `pending` is the only non-terminal state: the allowed transitions are
/// `pending -> paid` (verified signature) and `pending -> failed` (invalid
/// signature). Nothing leaves `paid` or `failed`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(PaymentStatus::Pending),
            "paid" => Some(PaymentStatus::Paid),
            "failed" => Some(PaymentStatus::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }
}

/// A bookable ritual offering from the catalog.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Pooja {
    pub id: i64,
    pub name: String,
    pub category_id: i64,
    pub price: Decimal,
    pub description: Option<String>,
}

/// Astrological attribute selectable on a booking.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Nakshatra {
    pub id: i64,
    pub name: String,
}
