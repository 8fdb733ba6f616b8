pub mod listings;
pub mod memory;
pub mod pool;
pub mod profiles;

pub use listings::{ListingStore, MatchQuery, PgListingStore};
pub use memory::MemoryListingStore;
pub use pool::{create_pool, run_migrations};
pub use profiles::{MemoryProfileStore, PgProfileStore, ProfileStore};
