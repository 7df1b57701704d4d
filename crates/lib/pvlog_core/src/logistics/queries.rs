//! Logistics queries.

use sqlx::PgPool;

use super::LogisticsError;
use crate::models::logistics::{
    Pallet, PalletInput, Panel, Structure, StructureInput, Truck, TruckInput,
};

const TRUCK_COLUMNS: &str = "id, driver_document, plate, yard_location, unloaded_at, \
     container, delivery_note, driver_name, updated_at";

const STRUCTURE_COLUMNS: &str = "id, driver_document, driver_name, plate, supplier, \
     packing_list, delivery_note, unloaded_at, updated_at";

const PALLET_COLUMNS: &str = "id, unloading, defective, updated_at";

// -- trucks --

/// All trucks, oldest first.
pub async fn list_trucks(pool: &PgPool) -> Result<Vec<Truck>, LogisticsError> {
    let rows =
        sqlx::query_as::<_, Truck>(&format!("SELECT {TRUCK_COLUMNS} FROM trucks ORDER BY id"))
            .fetch_all(pool)
            .await?;
    Ok(rows)
}

pub async fn get_truck(pool: &PgPool, id: i64) -> Result<Truck, LogisticsError> {
    sqlx::query_as::<_, Truck>(&format!("SELECT {TRUCK_COLUMNS} FROM trucks WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| LogisticsError::NotFound(format!("Truck {id}")))
}

pub async fn create_truck(pool: &PgPool, input: &TruckInput) -> Result<Truck, LogisticsError> {
    let row = sqlx::query_as::<_, Truck>(&format!(
        r#"
        INSERT INTO trucks
            (driver_document, plate, yard_location, unloaded_at, container, delivery_note, driver_name)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {TRUCK_COLUMNS}
        "#
    ))
    .bind(&input.driver_document)
    .bind(&input.plate)
    .bind(&input.yard_location)
    .bind(input.unloaded_at)
    .bind(&input.container)
    .bind(&input.delivery_note)
    .bind(&input.driver_name)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// Overwrite the provided fields and bump `updated_at`.
pub async fn update_truck(
    pool: &PgPool,
    id: i64,
    input: &TruckInput,
) -> Result<Truck, LogisticsError> {
    sqlx::query_as::<_, Truck>(&format!(
        r#"
        UPDATE trucks SET
            driver_document = COALESCE($2, driver_document),
            plate           = COALESCE($3, plate),
            yard_location   = COALESCE($4, yard_location),
            unloaded_at     = COALESCE($5, unloaded_at),
            container       = COALESCE($6, container),
            delivery_note   = COALESCE($7, delivery_note),
            driver_name     = COALESCE($8, driver_name),
            updated_at      = now()
        WHERE id = $1
        RETURNING {TRUCK_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(&input.driver_document)
    .bind(&input.plate)
    .bind(&input.yard_location)
    .bind(input.unloaded_at)
    .bind(&input.container)
    .bind(&input.delivery_note)
    .bind(&input.driver_name)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| LogisticsError::NotFound(format!("Truck {id}")))
}

/// Delete a truck. Deleting a missing id is not an error.
pub async fn delete_truck(pool: &PgPool, id: i64) -> Result<(), LogisticsError> {
    sqlx::query("DELETE FROM trucks WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

// -- structure deliveries --

pub async fn list_structures(pool: &PgPool) -> Result<Vec<Structure>, LogisticsError> {
    let rows = sqlx::query_as::<_, Structure>(&format!(
        "SELECT {STRUCTURE_COLUMNS} FROM structures ORDER BY id"
    ))
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get_structure(pool: &PgPool, id: i64) -> Result<Structure, LogisticsError> {
    sqlx::query_as::<_, Structure>(&format!(
        "SELECT {STRUCTURE_COLUMNS} FROM structures WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| LogisticsError::NotFound(format!("Structure delivery {id}")))
}

pub async fn create_structure(
    pool: &PgPool,
    input: &StructureInput,
) -> Result<Structure, LogisticsError> {
    let row = sqlx::query_as::<_, Structure>(&format!(
        r#"
        INSERT INTO structures
            (driver_document, driver_name, plate, supplier, packing_list, delivery_note, unloaded_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {STRUCTURE_COLUMNS}
        "#
    ))
    .bind(&input.driver_document)
    .bind(&input.driver_name)
    .bind(&input.plate)
    .bind(&input.supplier)
    .bind(&input.packing_list)
    .bind(&input.delivery_note)
    .bind(input.unloaded_at)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

pub async fn update_structure(
    pool: &PgPool,
    id: i64,
    input: &StructureInput,
) -> Result<Structure, LogisticsError> {
    sqlx::query_as::<_, Structure>(&format!(
        r#"
        UPDATE structures SET
            driver_document = COALESCE($2, driver_document),
            driver_name     = COALESCE($3, driver_name),
            plate           = COALESCE($4, plate),
            supplier        = COALESCE($5, supplier),
            packing_list    = COALESCE($6, packing_list),
            delivery_note   = COALESCE($7, delivery_note),
            unloaded_at     = COALESCE($8, unloaded_at),
            updated_at      = now()
        WHERE id = $1
        RETURNING {STRUCTURE_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(&input.driver_document)
    .bind(&input.driver_name)
    .bind(&input.plate)
    .bind(&input.supplier)
    .bind(&input.packing_list)
    .bind(&input.delivery_note)
    .bind(input.unloaded_at)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| LogisticsError::NotFound(format!("Structure delivery {id}")))
}

pub async fn delete_structure(pool: &PgPool, id: i64) -> Result<(), LogisticsError> {
    sqlx::query("DELETE FROM structures WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

// -- pallets --

pub async fn list_pallets(pool: &PgPool) -> Result<Vec<Pallet>, LogisticsError> {
    let rows =
        sqlx::query_as::<_, Pallet>(&format!("SELECT {PALLET_COLUMNS} FROM pallets ORDER BY id"))
            .fetch_all(pool)
            .await?;
    Ok(rows)
}

pub async fn get_pallet(pool: &PgPool, id: &str) -> Result<Pallet, LogisticsError> {
    sqlx::query_as::<_, Pallet>(&format!("SELECT {PALLET_COLUMNS} FROM pallets WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| LogisticsError::NotFound(format!("Pallet {id}")))
}

/// Insert a pallet. The serial comes from the client and must be present.
pub async fn create_pallet(pool: &PgPool, input: &PalletInput) -> Result<Pallet, LogisticsError> {
    let id = pallet_id(input)?;
    sqlx::query_as::<_, Pallet>(&format!(
        "INSERT INTO pallets (id, unloading, defective) VALUES ($1, $2, $3) \
         RETURNING {PALLET_COLUMNS}"
    ))
    .bind(id)
    .bind(input.unloading)
    .bind(input.defective)
    .fetch_one(pool)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => {
            LogisticsError::Validation(format!("Pallet {id} already exists"))
        }
        other => LogisticsError::DbError(other),
    })
}

pub async fn update_pallet(
    pool: &PgPool,
    id: &str,
    input: &PalletInput,
) -> Result<Pallet, LogisticsError> {
    sqlx::query_as::<_, Pallet>(&format!(
        r#"
        UPDATE pallets SET
            unloading  = COALESCE($2, unloading),
            defective  = COALESCE($3, defective),
            updated_at = now()
        WHERE id = $1
        RETURNING {PALLET_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(input.unloading)
    .bind(input.defective)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| LogisticsError::NotFound(format!("Pallet {id}")))
}

pub async fn delete_pallet(pool: &PgPool, id: &str) -> Result<(), LogisticsError> {
    sqlx::query("DELETE FROM pallets WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// The client-supplied serial, stored as sent. Blank serials are rejected.
fn pallet_id(input: &PalletInput) -> Result<&str, LogisticsError> {
    input
        .id
        .as_deref()
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| LogisticsError::Validation("Pallet id is required".into()))
}

// -- panels --

/// Look up a panel by serial number.
pub async fn get_panel(pool: &PgPool, serial: &str) -> Result<Panel, LogisticsError> {
    sqlx::query_as::<_, Panel>(
        "SELECT serial, power, pallet_serial FROM panels WHERE serial = $1",
    )
    .bind(serial)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| LogisticsError::NotFound(format!("Panel {serial}")))
}
