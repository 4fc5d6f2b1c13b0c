//! Reservations, simulated checkout and inquiries

use crate::{
    AppState,
    error::Result,
    models::ApiResponse,
};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Serialize;
use tracing::info;
use wayfare::{InquiryRequest, Reservation, ReservationRequest};
use wayfare_backend::InquiryOutcome;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/reservations", post(create_reservation))
        .route("/checkout/{id}", get(get_checkout))
        .route("/checkout/{id}/pay", post(pay_checkout))
        .route("/inquiries", post(submit_inquiry))
}

/// A reservation and where its checkout step lives
#[derive(Debug, Serialize)]
struct CheckoutResponse {
    reservation: Reservation,
    checkout_path: String,
}

impl From<Reservation> for CheckoutResponse {
    fn from(reservation: Reservation) -> Self {
        Self {
            checkout_path: reservation.checkout_path(),
            reservation,
        }
    }
}

async fn create_reservation(
    State(state): State<AppState>,
    Json(request): Json<ReservationRequest>,
) -> Result<impl IntoResponse> {
    info!("Reservation requested for service {}", request.service_id);
    let reservation = state.backend.booking.checkout(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(CheckoutResponse::from(reservation))),
    ))
}

async fn get_checkout(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<CheckoutResponse>>> {
    let reservation = state.backend.booking.reservation(&id).await?;
    Ok(Json(ApiResponse::new(reservation.into())))
}

/// Simulated payment confirmation
async fn pay_checkout(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Reservation>>> {
    let reservation = state.backend.booking.confirm_payment(&id).await?;
    Ok(Json(ApiResponse::with_message(
        reservation,
        "Payment confirmed".to_string(),
    )))
}

/// Save an inquiry; email problems come back as the response message
async fn submit_inquiry(
    State(state): State<AppState>,
    Json(request): Json<InquiryRequest>,
) -> Result<impl IntoResponse> {
    let outcome = state.backend.booking.submit_inquiry(request).await?;

    let response = match outcome.warning.clone() {
        Some(warning) => ApiResponse::with_message(outcome, warning),
        None => ApiResponse::new(outcome),
    };
    Ok((StatusCode::CREATED, Json::<ApiResponse<InquiryOutcome>>(response)))
}
