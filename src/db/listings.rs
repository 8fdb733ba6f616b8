use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{ListingRecord, ListingRow, NewListing, StorageTarget, STATUS_ACTIVE};

/// Filter for records surfaced to another role.
#[derive(Debug, Clone)]
pub struct MatchQuery {
    /// Caller's own rows are never offered back to them.
    pub exclude_user: Uuid,
    /// Case-insensitive exact match on `food_type`.
    pub food_type: Option<String>,
    pub limit: i64,
}

#[axum::async_trait]
pub trait ListingStore: Send + Sync {
    /// Inserts one row and returns it with the store-assigned id and timestamp.
    async fn insert(
        &self,
        target: StorageTarget,
        user_id: Uuid,
        listing: &NewListing,
    ) -> AppResult<ListingRecord>;

    /// The owner's rows without a deletion marker, newest first.
    async fn list_own(&self, target: StorageTarget, user_id: Uuid)
        -> AppResult<Vec<ListingRecord>>;

    /// Active, non-deleted rows of other users, newest first.
    async fn list_matches(
        &self,
        target: StorageTarget,
        query: &MatchQuery,
    ) -> AppResult<Vec<ListingRecord>>;
}

const COLUMNS: &str = "id, user_id, food_type, \
     ST_Y(location::geometry) AS lat, ST_X(location::geometry) AS lng, \
     price, quantity, status, notes, created_at, deleted_at";

#[derive(Clone)]
pub struct PgListingStore {
    pool: PgPool,
}

impl PgListingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[axum::async_trait]
impl ListingStore for PgListingStore {
    async fn insert(
        &self,
        target: StorageTarget,
        user_id: Uuid,
        listing: &NewListing,
    ) -> AppResult<ListingRecord> {
        let sql = format!(
            "INSERT INTO {} (user_id, food_type, location, price, quantity, notes) \
             VALUES ($1, $2, ST_SetSRID(ST_MakePoint($3, $4), 4326)::geography, $5, $6, $7) \
             RETURNING {}",
            target.table(),
            COLUMNS
        );

        let row: ListingRow = sqlx::query_as(&sql)
            .bind(user_id)
            .bind(&listing.food_type)
            .bind(listing.location.lng)
            .bind(listing.location.lat)
            .bind(listing.price)
            .bind(listing.quantity)
            .bind(listing.notes.as_deref())
            .fetch_one(&self.pool)
            .await?;

        tracing::info!(
            "Inserted {} row {} for user {}",
            target.table(),
            row.id,
            user_id
        );
        Ok(row.into())
    }

    async fn list_own(
        &self,
        target: StorageTarget,
        user_id: Uuid,
    ) -> AppResult<Vec<ListingRecord>> {
        let sql = format!(
            "SELECT {} FROM {} \
             WHERE user_id = $1 AND deleted_at IS NULL \
             ORDER BY created_at DESC",
            COLUMNS,
            target.table()
        );

        let rows: Vec<ListingRow> = sqlx::query_as(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_matches(
        &self,
        target: StorageTarget,
        query: &MatchQuery,
    ) -> AppResult<Vec<ListingRecord>> {
        let sql = format!(
            "SELECT {} FROM {} \
             WHERE user_id <> $1 AND deleted_at IS NULL AND status = $2 \
             AND ($3::text IS NULL OR lower(food_type) = lower($3)) \
             ORDER BY created_at DESC \
             LIMIT $4",
            COLUMNS,
            target.table()
        );

        let rows: Vec<ListingRow> = sqlx::query_as(&sql)
            .bind(query.exclude_user)
            .bind(STATUS_ACTIVE)
            .bind(query.food_type.as_deref())
            .bind(query.limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
