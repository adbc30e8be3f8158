//! Booking creation and payment verification handlers.
//!
//! `create_booking` persists a pending booking and opens a matching Razorpay
//! order; `verify_payment` validates the checkout redirect signature and
//! settles the booking's payment status.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use service_core::error::AppError;
use validator::ValidateEmail;

use crate::{
    AppState,
    dtos::{
        BookingResponse, CallbackParams, CreateBookingRequest, CreateBookingResponse,
        VerifyPaymentRequest, VerifyPaymentResponse,
    },
    models::{NewBooking, PaymentStatus},
    services::razorpay::{PaymentVerification, to_minor_units},
};

fn parse_amount(value: &serde_json::Value) -> Option<Decimal> {
    use std::str::FromStr;
    let text = match value {
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(s) => s.trim().to_string(),
        _ => return None,
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn validate_booking_request(payload: CreateBookingRequest) -> Result<NewBooking, AppError> {
    let mut missing = Vec::new();
    if payload.pooja_id.is_none() {
        missing.push("pooja_id");
    }
    if payload
        .full_name
        .as_deref()
        .is_none_or(|s| s.trim().is_empty())
    {
        missing.push("full_name");
    }
    if payload.email.as_deref().is_none_or(|s| s.trim().is_empty()) {
        missing.push("email");
    }
    if payload.amount.is_none() {
        missing.push("amount");
    }
    if !missing.is_empty() {
        return Err(AppError::ValidationError(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )));
    }

    let (Some(pooja_id), Some(full_name), Some(email), Some(amount_raw)) = (
        payload.pooja_id,
        payload.full_name,
        payload.email,
        payload.amount,
    ) else {
        return Err(AppError::ValidationError(
            "Missing required fields".to_string(),
        ));
    };

    let email = email.trim().to_string();
    if !email.validate_email() {
        return Err(AppError::ValidationError(
            "Invalid email address.".to_string(),
        ));
    }

    let amount = parse_amount(&amount_raw)
        .filter(|a| *a > Decimal::ZERO)
        .ok_or_else(|| AppError::ValidationError("Invalid amount.".to_string()))?;

    let preferred_date = match clean(payload.preferred_date) {
        Some(s) => Some(NaiveDate::parse_from_str(&s, "%Y-%m-%d").map_err(|_| {
            AppError::ValidationError("Invalid preferred_date, expected YYYY-MM-DD.".to_string())
        })?),
        None => None,
    };

    Ok(NewBooking {
        pooja_id,
        full_name: full_name.trim().to_string(),
        email,
        phone: clean(payload.phone),
        nakshatra: clean(payload.nakshatra),
        gotra: clean(payload.gotra),
        preferred_date,
        preferred_time: clean(payload.preferred_time),
        sankalpam: clean(payload.sankalpam),
        amount,
    })
}

/// Create a booking and a matching Razorpay order.
///
/// The booking row is inserted first (`pending`), then the gateway order is
/// created for the amount in minor units, then the order id is attached.
/// If order creation or the attach write fails, the booking insert is rolled
/// back so no orphaned pending-without-order booking persists. The failure
/// log carries both ids so the stray gateway order can be reconciled.
pub async fn create_booking(
    State(state): State<AppState>,
    Json(payload): Json<CreateBookingRequest>,
) -> Result<Json<CreateBookingResponse>, AppError> {
    let new_booking = validate_booking_request(payload)?;

    let amount_minor = to_minor_units(new_booking.amount)
        .ok_or_else(|| AppError::ValidationError("Invalid amount.".to_string()))?;

    tracing::info!(
        pooja_id = new_booking.pooja_id,
        amount = %new_booking.amount,
        "Creating booking"
    );

    let booking_id = state.store.create_pending_booking(new_booking).await?;

    let order = match state
        .razorpay
        .create_order(amount_minor, "INR", Some(format!("booking_{}", booking_id)))
        .await
    {
        Ok(order) => order,
        Err(e) => {
            tracing::error!(
                booking_id = booking_id,
                error = %e,
                "Gateway order creation failed, rolling back booking"
            );
            state.store.delete_booking(booking_id).await?;
            return Err(AppError::GatewayError(e));
        }
    };

    if let Err(e) = state
        .store
        .attach_gateway_order(booking_id, &order.id)
        .await
    {
        tracing::error!(
            booking_id = booking_id,
            order_id = %order.id,
            error = %e,
            "Failed to attach gateway order, rolling back booking"
        );
        state.store.delete_booking(booking_id).await?;
        return Err(e);
    }

    tracing::info!(
        booking_id = booking_id,
        order_id = %order.id,
        amount_minor = amount_minor,
        "Booking created with gateway order"
    );

    Ok(Json(CreateBookingResponse {
        success: true,
        booking_id,
        order_id: order.id,
        amount: amount_minor,
        currency: "INR".to_string(),
        key_id: state.razorpay.key_id().to_string(),
    }))
}

/// Verify the Razorpay checkout signature and settle the booking.
///
/// A signature mismatch marks the booking `failed` and reports an
/// authenticity failure to the caller; it is never a server error.
pub async fn verify_payment(
    State(state): State<AppState>,
    Json(payload): Json<VerifyPaymentRequest>,
) -> Result<Json<VerifyPaymentResponse>, AppError> {
    let mut missing = Vec::new();
    if payload
        .razorpay_order_id
        .as_deref()
        .is_none_or(str::is_empty)
    {
        missing.push("razorpay_order_id");
    }
    if payload
        .razorpay_payment_id
        .as_deref()
        .is_none_or(str::is_empty)
    {
        missing.push("razorpay_payment_id");
    }
    if payload
        .razorpay_signature
        .as_deref()
        .is_none_or(str::is_empty)
    {
        missing.push("razorpay_signature");
    }
    if payload.booking_id.is_none() {
        missing.push("booking_id");
    }
    if !missing.is_empty() {
        return Err(AppError::ValidationError(format!(
            "Missing payment details: {}",
            missing.join(", ")
        )));
    }

    let (Some(order_id), Some(payment_id), Some(signature), Some(booking_id)) = (
        payload.razorpay_order_id,
        payload.razorpay_payment_id,
        payload.razorpay_signature,
        payload.booking_id,
    ) else {
        return Err(AppError::ValidationError(
            "Missing payment details".to_string(),
        ));
    };

    let booking = state
        .store
        .get_booking(booking_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Booking not found")))?;

    if booking.razorpay_order_id.as_deref() != Some(order_id.as_str()) {
        tracing::warn!(
            booking_id = booking_id,
            expected_order_id = ?booking.razorpay_order_id,
            received_order_id = %order_id,
            "Order ID mismatch"
        );
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Order ID does not match booking"
        )));
    }

    let verification = PaymentVerification {
        razorpay_order_id: order_id,
        razorpay_payment_id: payment_id.clone(),
        razorpay_signature: signature,
    };

    let is_valid = state
        .razorpay
        .verify_payment_signature(&verification)
        .map_err(AppError::InternalError)?;

    if !is_valid {
        state
            .store
            .set_payment_status(booking_id, PaymentStatus::Failed, None)
            .await?;
        return Err(AppError::AuthenticityError);
    }

    state
        .store
        .set_payment_status(booking_id, PaymentStatus::Paid, Some(&payment_id))
        .await?;

    tracing::info!(
        booking_id = booking_id,
        payment_id = %payment_id,
        "Payment verified"
    );

    Ok(Json(VerifyPaymentResponse {
        success: true,
        message: "Payment verified successfully!".to_string(),
    }))
}

/// Plain-text confirmation page target for gateway redirects.
///
/// Reports the booking's current payment status; it never mutates it, since
/// the redirect carries no signature to verify.
pub async fn payment_callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Result<String, AppError> {
    let booking_id = params
        .booking_id
        .ok_or_else(|| AppError::ValidationError("booking_id is required.".to_string()))?;

    let booking = state
        .store
        .get_booking(booking_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Booking not found")))?;

    let message = match booking.payment_status {
        PaymentStatus::Paid => "Payment received. Thank you for your donation.",
        PaymentStatus::Pending => "Payment is still pending for this booking.",
        PaymentStatus::Failed => "Payment for this booking failed.",
    };

    Ok(message.to_string())
}

/// Get a booking by ID (for status checking).
pub async fn get_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<i64>,
) -> Result<Json<BookingResponse>, AppError> {
    let booking = state
        .store
        .get_booking(booking_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Booking not found")))?;

    Ok(Json(BookingResponse::from(booking)))
}
