//! Logistics request handlers: trucks, structure deliveries, pallets and panels.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use pvlog_core::logistics;
use pvlog_core::models::logistics::{
    Pallet, PalletInput, Panel, Structure, StructureInput, Truck, TruckInput,
};
use tracing::info;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::extract::JsonBody;
use crate::models::OkResponse;

/// Numeric path id; anything else is a 400.
fn parse_id(raw: &str) -> AppResult<i64> {
    raw.parse()
        .map_err(|_| AppError::Validation(format!("Invalid id: {raw}")))
}

// -- trucks --

/// `GET /camiones`
pub async fn list_trucks_handler(State(state): State<AppState>) -> AppResult<Json<Vec<Truck>>> {
    Ok(Json(logistics::list_trucks(&state.pool).await?))
}

/// `GET /camiones/{id}`
pub async fn get_truck_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Truck>> {
    let id = parse_id(&id)?;
    Ok(Json(logistics::get_truck(&state.pool, id).await?))
}

/// `POST /camiones`
pub async fn create_truck_handler(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<TruckInput>,
) -> AppResult<(StatusCode, Json<Truck>)> {
    let truck = logistics::create_truck(&state.pool, &body).await?;
    info!(id = truck.id, "truck registered");
    Ok((StatusCode::CREATED, Json(truck)))
}

/// `PUT /camiones/{id}`
pub async fn update_truck_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<TruckInput>,
) -> AppResult<Json<OkResponse>> {
    let id = parse_id(&id)?;
    logistics::update_truck(&state.pool, id, &body).await?;
    Ok(Json(OkResponse::ok()))
}

/// `DELETE /camiones/{id}`
pub async fn delete_truck_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<OkResponse>> {
    let id = parse_id(&id)?;
    logistics::delete_truck(&state.pool, id).await?;
    Ok(Json(OkResponse::ok()))
}

// -- structure deliveries --

/// `GET /estructura`
pub async fn list_structures_handler(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<Structure>>> {
    Ok(Json(logistics::list_structures(&state.pool).await?))
}

/// `GET /estructura/{id}`
pub async fn get_structure_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Structure>> {
    let id = parse_id(&id)?;
    Ok(Json(logistics::get_structure(&state.pool, id).await?))
}

/// `POST /estructura`
pub async fn create_structure_handler(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<StructureInput>,
) -> AppResult<(StatusCode, Json<Structure>)> {
    let structure = logistics::create_structure(&state.pool, &body).await?;
    info!(id = structure.id, "structure delivery registered");
    Ok((StatusCode::CREATED, Json(structure)))
}

/// `PUT /estructura/{id}`
pub async fn update_structure_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<StructureInput>,
) -> AppResult<Json<OkResponse>> {
    let id = parse_id(&id)?;
    logistics::update_structure(&state.pool, id, &body).await?;
    Ok(Json(OkResponse::ok()))
}

/// `DELETE /estructura/{id}`
pub async fn delete_structure_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<OkResponse>> {
    let id = parse_id(&id)?;
    logistics::delete_structure(&state.pool, id).await?;
    Ok(Json(OkResponse::ok()))
}

// -- pallets --

/// `GET /pallets`
pub async fn list_pallets_handler(State(state): State<AppState>) -> AppResult<Json<Vec<Pallet>>> {
    Ok(Json(logistics::list_pallets(&state.pool).await?))
}

/// `GET /pallets/{id}`
pub async fn get_pallet_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Pallet>> {
    Ok(Json(logistics::get_pallet(&state.pool, &id).await?))
}

/// `POST /pallets`
pub async fn create_pallet_handler(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<PalletInput>,
) -> AppResult<(StatusCode, Json<Pallet>)> {
    let pallet = logistics::create_pallet(&state.pool, &body).await?;
    info!(id = %pallet.id, "pallet registered");
    Ok((StatusCode::CREATED, Json(pallet)))
}

/// `PUT /pallets/{id}`
pub async fn update_pallet_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<PalletInput>,
) -> AppResult<Json<OkResponse>> {
    logistics::update_pallet(&state.pool, &id, &body).await?;
    Ok(Json(OkResponse::ok()))
}

/// `DELETE /pallets/{id}`
pub async fn delete_pallet_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<OkResponse>> {
    logistics::delete_pallet(&state.pool, &id).await?;
    Ok(Json(OkResponse::ok()))
}

// -- panels --

/// `GET /paneles/{sn}`
pub async fn get_panel_handler(
    State(state): State<AppState>,
    Path(sn): Path<String>,
) -> AppResult<Json<Panel>> {
    Ok(Json(logistics::get_panel(&state.pool, &sn).await?))
}
