//! Logistics domain models.
//!
//! Column names are English snake_case; the serde names are the field names
//! the frontend has always sent and read, so they stay as they are.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Truck unloaded at the yard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Truck {
    pub id: i64,
    #[serde(rename = "DNI")]
    pub driver_document: Option<String>,
    #[serde(rename = "Matricula")]
    pub plate: Option<String>,
    #[serde(rename = "UbicacionCampa")]
    pub yard_location: Option<String>,
    #[serde(rename = "FechaDescarga")]
    pub unloaded_at: Option<DateTime<Utc>>,
    #[serde(rename = "Container")]
    pub container: Option<String>,
    #[serde(rename = "Albaran")]
    pub delivery_note: Option<String>,
    #[serde(rename = "NombreConductor")]
    pub driver_name: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Writable truck fields. Absent fields are left untouched on update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TruckInput {
    #[serde(rename = "DNI")]
    pub driver_document: Option<String>,
    #[serde(rename = "Matricula")]
    pub plate: Option<String>,
    #[serde(rename = "UbicacionCampa")]
    pub yard_location: Option<String>,
    #[serde(rename = "FechaDescarga")]
    pub unloaded_at: Option<DateTime<Utc>>,
    #[serde(rename = "Container")]
    pub container: Option<String>,
    #[serde(rename = "Albaran")]
    pub delivery_note: Option<String>,
    #[serde(rename = "NombreConductor")]
    pub driver_name: Option<String>,
}

/// Delivery of mounting structures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Structure {
    pub id: i64,
    #[serde(rename = "DNI")]
    pub driver_document: Option<String>,
    #[serde(rename = "Conductor")]
    pub driver_name: Option<String>,
    #[serde(rename = "Matricula")]
    pub plate: Option<String>,
    #[serde(rename = "Proveedor")]
    pub supplier: Option<String>,
    #[serde(rename = "PackingList")]
    pub packing_list: Option<String>,
    #[serde(rename = "Albaran")]
    pub delivery_note: Option<String>,
    #[serde(rename = "FechaDescarga")]
    pub unloaded_at: Option<DateTime<Utc>>,
    #[serde(rename = "modified_at")]
    pub updated_at: DateTime<Utc>,
}

/// Writable structure-delivery fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StructureInput {
    #[serde(rename = "DNI")]
    pub driver_document: Option<String>,
    #[serde(rename = "Conductor")]
    pub driver_name: Option<String>,
    #[serde(rename = "Matricula")]
    pub plate: Option<String>,
    #[serde(rename = "Proveedor")]
    pub supplier: Option<String>,
    #[serde(rename = "PackingList")]
    pub packing_list: Option<String>,
    #[serde(rename = "Albaran")]
    pub delivery_note: Option<String>,
    #[serde(rename = "FechaDescarga")]
    pub unloaded_at: Option<DateTime<Utc>>,
}

/// Pallet of panels. The id is the pallet serial printed on the label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Pallet {
    pub id: String,
    /// Numeric id of the unloading the pallet arrived with.
    #[serde(rename = "Descarga")]
    pub unloading: Option<i64>,
    #[serde(rename = "Defecto")]
    pub defective: Option<bool>,
    pub updated_at: DateTime<Utc>,
}

/// Writable pallet fields. `id` is required on create and ignored on update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PalletInput {
    pub id: Option<String>,
    #[serde(rename = "Descarga")]
    pub unloading: Option<i64>,
    #[serde(rename = "Defecto")]
    pub defective: Option<bool>,
}

/// Single panel, keyed by serial number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Panel {
    #[serde(rename = "SN")]
    pub serial: String,
    #[serde(rename = "Potencia")]
    pub power: Option<f64>,
    #[serde(rename = "SNPallet")]
    pub pallet_serial: Option<String>,
}
