use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::listings::{ListingStore, MatchQuery};
use crate::clock::Clock;
use crate::error::AppResult;
use crate::models::{ListingRecord, NewListing, StorageTarget, STATUS_ACTIVE};

/// In-process stand-in for the listing tables.
pub struct MemoryListingStore {
    clock: Arc<dyn Clock>,
    tables: Mutex<HashMap<StorageTarget, Vec<ListingRecord>>>,
}

impl MemoryListingStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            tables: Mutex::new(HashMap::new()),
        }
    }

    fn with_table<T>(
        &self,
        target: StorageTarget,
        f: impl FnOnce(&mut Vec<ListingRecord>) -> T,
    ) -> T {
        let mut tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        f(tables.entry(target).or_default())
    }

    /// Every row in `target`, deleted or not, in insertion order.
    pub fn rows(&self, target: StorageTarget) -> Vec<ListingRecord> {
        self.with_table(target, |rows| rows.clone())
    }

    /// Sets the deletion marker. Returns false if no such row exists.
    pub fn soft_delete(&self, target: StorageTarget, id: Uuid, at: DateTime<Utc>) -> bool {
        self.with_table(target, |rows| {
            rows.iter_mut()
                .find(|r| r.id == id)
                .map(|r| r.deleted_at = Some(at))
                .is_some()
        })
    }

    pub fn set_status(&self, target: StorageTarget, id: Uuid, status: &str) -> bool {
        self.with_table(target, |rows| {
            rows.iter_mut()
                .find(|r| r.id == id)
                .map(|r| r.status = status.to_string())
                .is_some()
        })
    }
}

/// Newest first; rows sharing a timestamp keep reverse insertion order.
fn newest_first(mut rows: Vec<ListingRecord>) -> Vec<ListingRecord> {
    rows.reverse();
    rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    rows
}

#[axum::async_trait]
impl ListingStore for MemoryListingStore {
    async fn insert(
        &self,
        target: StorageTarget,
        user_id: Uuid,
        listing: &NewListing,
    ) -> AppResult<ListingRecord> {
        let record = ListingRecord {
            id: Uuid::new_v4(),
            user_id,
            food_type: listing.food_type.clone(),
            location: listing.location,
            price: listing.price,
            quantity: listing.quantity,
            status: STATUS_ACTIVE.to_string(),
            notes: listing.notes.clone(),
            created_at: self.clock.now(),
            deleted_at: None,
        };
        self.with_table(target, |rows| rows.push(record.clone()));
        Ok(record)
    }

    async fn list_own(
        &self,
        target: StorageTarget,
        user_id: Uuid,
    ) -> AppResult<Vec<ListingRecord>> {
        let rows = self.with_table(target, |rows| {
            rows.iter()
                .filter(|r| r.user_id == user_id && r.deleted_at.is_none())
                .cloned()
                .collect()
        });
        Ok(newest_first(rows))
    }

    async fn list_matches(
        &self,
        target: StorageTarget,
        query: &MatchQuery,
    ) -> AppResult<Vec<ListingRecord>> {
        let rows = self.with_table(target, |rows| {
            rows.iter()
                .filter(|r| {
                    r.user_id != query.exclude_user
                        && r.deleted_at.is_none()
                        && r.status == STATUS_ACTIVE
                        && query
                            .food_type
                            .as_deref()
                            .map_or(true, |f| r.food_type.to_lowercase() == f.to_lowercase())
                })
                .cloned()
                .collect()
        });
        let limit = usize::try_from(query.limit).unwrap_or(0);
        Ok(newest_first(rows).into_iter().take(limit).collect())
    }
}
