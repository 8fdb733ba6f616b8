pub mod identity;
pub mod marketplace_service;
pub mod validation;

pub use identity::{IdentityProvider, JwtIdentity};
pub use marketplace_service::MarketplaceService;
