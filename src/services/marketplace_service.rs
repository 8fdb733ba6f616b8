use std::sync::Arc;

use crate::db::{ListingStore, MatchQuery};
use crate::error::AppResult;
use crate::middleware::AuthenticatedUser;
use crate::models::{ListingPayload, ListingRecord, ListingSummary, STATUS_ACTIVE};
use crate::rate_limit::SubmissionLimiter;
use crate::services::validation::validate_listing;

/// Matches returned per request.
pub const MATCH_LIMIT: i64 = 50;

pub struct MarketplaceService {
    listings: Arc<dyn ListingStore>,
    limiter: Option<SubmissionLimiter>,
}

impl MarketplaceService {
    pub fn new(listings: Arc<dyn ListingStore>, limiter: Option<SubmissionLimiter>) -> Self {
        Self { listings, limiter }
    }

    /// Validates and stores one submission in the table owned by the caller's role.
    pub async fn create(
        &self,
        user: &AuthenticatedUser,
        payload: ListingPayload,
    ) -> AppResult<ListingRecord> {
        if let Some(limiter) = &self.limiter {
            limiter.check(user.user_id)?;
        }

        let listing = validate_listing(payload)?;
        self.listings
            .insert(user.role.target(), user.user_id, &listing)
            .await
    }

    pub async fn list_own(&self, user: &AuthenticatedUser) -> AppResult<Vec<ListingRecord>> {
        self.listings
            .list_own(user.role.target(), user.user_id)
            .await
    }

    pub async fn matches(
        &self,
        user: &AuthenticatedUser,
        food_type: Option<String>,
    ) -> AppResult<Vec<ListingRecord>> {
        let query = MatchQuery {
            exclude_user: user.user_id,
            food_type: food_type.filter(|f| !f.trim().is_empty()),
            limit: MATCH_LIMIT,
        };
        self.listings
            .list_matches(user.role.match_target(), &query)
            .await
    }

    pub async fn summary(&self, user: &AuthenticatedUser) -> AppResult<ListingSummary> {
        let records = self.list_own(user).await?;
        Ok(summarize(user, &records))
    }
}

fn summarize(user: &AuthenticatedUser, records: &[ListingRecord]) -> ListingSummary {
    let total = records.len();
    let average_price = if total == 0 {
        0.0
    } else {
        records.iter().map(|r| r.price).sum::<f64>() / total as f64
    };

    ListingSummary {
        role: user.role,
        total,
        active: records.iter().filter(|r| r.status == STATUS_ACTIVE).count(),
        total_quantity: records.iter().map(|r| i64::from(r.quantity)).sum(),
        average_price,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::db::MemoryListingStore;
    use crate::error::MarketError;
    use crate::models::{LocationPayload, Role, StorageTarget};
    use chrono::Utc;
    use uuid::Uuid;

    fn payload(food_type: &str, price: f64, quantity: i64) -> ListingPayload {
        ListingPayload {
            food_type: Some(food_type.to_string()),
            location: Some(LocationPayload {
                lat: Some(1.0),
                lng: Some(2.0),
            }),
            price: Some(price),
            quantity: Some(quantity),
            notes: None,
        }
    }

    fn user(role: Role) -> AuthenticatedUser {
        AuthenticatedUser {
            user_id: Uuid::new_v4(),
            role,
        }
    }

    fn service() -> (MarketplaceService, Arc<MemoryListingStore>) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let store = Arc::new(MemoryListingStore::new(clock));
        (MarketplaceService::new(store.clone(), None), store)
    }

    #[tokio::test]
    async fn test_create_dispatches_by_role() {
        let (service, store) = service();
        for (role, target) in [
            (Role::Farmer, StorageTarget::ProduceListings),
            (Role::Retailer, StorageTarget::PurchaseRequests),
            (Role::Ngo, StorageTarget::AssistancePrograms),
        ] {
            let caller = user(role);
            let record = service
                .create(&caller, payload("rice", 2.0, 3))
                .await
                .unwrap();
            assert_eq!(record.user_id, caller.user_id);
            let rows = store.rows(target);
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0].id, record.id);
        }
    }

    #[tokio::test]
    async fn test_invalid_payload_persists_nothing() {
        let (service, store) = service();
        let caller = user(Role::Retailer);
        let err = service
            .create(&caller, payload("pizza", -1.0, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::InvalidQuantity));
        assert!(store.rows(StorageTarget::PurchaseRequests).is_empty());
    }

    #[tokio::test]
    async fn test_limiter_applies_before_validation() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let store = Arc::new(MemoryListingStore::new(clock.clone()));
        let limiter =
            SubmissionLimiter::new(1, std::time::Duration::from_secs(60), clock).unwrap();
        let service = MarketplaceService::new(store, Some(limiter));
        let caller = user(Role::Farmer);

        assert!(service
            .create(&caller, payload("rice", -1.0, 1))
            .await
            .is_err());
        assert!(matches!(
            service.create(&caller, payload("rice", 1.0, 1)).await,
            Err(MarketError::RateLimited)
        ));
    }

    #[tokio::test]
    async fn test_matches_use_counterpart_table() {
        let (service, _store) = service();
        let farmer = user(Role::Farmer);
        let ngo = user(Role::Ngo);

        let listing = service
            .create(&farmer, payload("beans", 1.0, 40))
            .await
            .unwrap();
        let program = service
            .create(&ngo, payload("beans", 0.0, 100))
            .await
            .unwrap();

        let for_ngo = service.matches(&ngo, None).await.unwrap();
        assert_eq!(for_ngo.len(), 1);
        assert_eq!(for_ngo[0].id, listing.id);

        let for_farmer = service.matches(&farmer, Some("BEANS".into())).await.unwrap();
        assert_eq!(for_farmer.len(), 1);
        assert_eq!(for_farmer[0].id, program.id);
    }

    #[tokio::test]
    async fn test_summary() {
        let (service, store) = service();
        let farmer = user(Role::Farmer);

        let empty = service.summary(&farmer).await.unwrap();
        assert_eq!(empty.total, 0);
        assert_eq!(empty.average_price, 0.0);

        service
            .create(&farmer, payload("kale", 2.0, 10))
            .await
            .unwrap();
        let sold = service
            .create(&farmer, payload("kale", 4.0, 5))
            .await
            .unwrap();
        let gone = service
            .create(&farmer, payload("kale", 100.0, 1))
            .await
            .unwrap();
        store.set_status(StorageTarget::ProduceListings, sold.id, "completed");
        store.soft_delete(StorageTarget::ProduceListings, gone.id, Utc::now());

        let summary = service.summary(&farmer).await.unwrap();
        assert_eq!(summary.role, Role::Farmer);
        assert_eq!(summary.total, 2);
        assert_eq!(summary.active, 1);
        assert_eq!(summary.total_quantity, 15);
        assert_eq!(summary.average_price, 3.0);
    }
}
