use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// Raw POST body. Every field is optional so that absence is reported as
/// `MissingFields` rather than a deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingPayload {
    pub food_type: Option<String>,
    pub location: Option<LocationPayload>,
    pub price: Option<f64>,
    pub quantity: Option<i64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocationPayload {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

/// Validated submission, ready to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewListing {
    pub food_type: String,
    pub location: GeoPoint,
    pub price: f64,
    pub quantity: i32,
    pub notes: Option<String>,
}

/// Row shape returned by the listing tables, with the point split into columns.
#[derive(Debug, Clone, FromRow)]
pub struct ListingRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub food_type: String,
    pub lat: f64,
    pub lng: f64,
    pub price: f64,
    pub quantity: i32,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub food_type: String,
    pub location: GeoPoint,
    pub price: f64,
    pub quantity: i32,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<ListingRow> for ListingRecord {
    fn from(row: ListingRow) -> Self {
        ListingRecord {
            id: row.id,
            user_id: row.user_id,
            food_type: row.food_type,
            location: GeoPoint {
                lat: row.lat,
                lng: row.lng,
            },
            price: row.price,
            quantity: row.quantity,
            status: row.status,
            notes: row.notes,
            created_at: row.created_at,
            deleted_at: row.deleted_at,
        }
    }
}

/// Dashboard figures over a caller's own records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingSummary {
    pub role: super::Role,
    pub total: usize,
    pub active: usize,
    pub total_quantity: i64,
    pub average_price: f64,
}

pub const STATUS_ACTIVE: &str = "active";
