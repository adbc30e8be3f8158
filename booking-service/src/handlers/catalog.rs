//! Read-only catalog handlers: ritual offerings and nakshatras.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use service_core::error::AppError;

use crate::{
    AppState,
    dtos::{PoojaListResponse, PoojaLookupParams, PoojaLookupResponse},
    models::Nakshatra,
};

/// List all nakshatras.
pub async fn list_nakshatras(
    State(state): State<AppState>,
) -> Result<Json<Vec<Nakshatra>>, AppError> {
    let nakshatras = state.store.list_nakshatras().await?;
    Ok(Json(nakshatras))
}

/// List poojas in a category, ordered by id.
pub async fn list_poojas_by_category(
    State(state): State<AppState>,
    Path(category_id): Path<i64>,
) -> Result<Json<PoojaListResponse>, AppError> {
    let data = state.store.list_poojas_by_category(category_id).await?;
    Ok(Json(PoojaListResponse {
        success: true,
        data,
    }))
}

/// Look up a single pooja by name.
pub async fn get_pooja_by_name(
    State(state): State<AppState>,
    Query(params): Query<PoojaLookupParams>,
) -> Result<Json<PoojaLookupResponse>, AppError> {
    let name = params
        .name
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| AppError::ValidationError("Missing name".to_string()))?;

    match state.store.get_pooja_by_name(name.trim()).await? {
        Some(pooja) => Ok(Json(PoojaLookupResponse {
            success: true,
            data: Some(pooja),
            message: None,
        })),
        None => Ok(Json(PoojaLookupResponse {
            success: false,
            data: None,
            message: Some("Pooja not found".to_string()),
        })),
    }
}
