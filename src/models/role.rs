use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MarketError;

/// Marketplace role stored in `profiles.role`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Farmer,
    Retailer,
    Ngo,
}

/// Table holding one kind of marketplace record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageTarget {
    ProduceListings,
    PurchaseRequests,
    AssistancePrograms,
}

/// Where a role's records live and which records it is matched against.
#[derive(Debug, Clone, Copy)]
struct Dispatch {
    own: StorageTarget,
    matched: StorageTarget,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Farmer, Role::Retailer, Role::Ngo];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Farmer => "farmer",
            Role::Retailer => "retailer",
            Role::Ngo => "ngo",
        }
    }

    fn dispatch(&self) -> Dispatch {
        match self {
            Role::Farmer => Dispatch {
                own: StorageTarget::ProduceListings,
                matched: StorageTarget::AssistancePrograms,
            },
            Role::Retailer => Dispatch {
                own: StorageTarget::PurchaseRequests,
                matched: StorageTarget::ProduceListings,
            },
            Role::Ngo => Dispatch {
                own: StorageTarget::AssistancePrograms,
                matched: StorageTarget::ProduceListings,
            },
        }
    }

    /// Table the role's submissions land in.
    pub fn target(&self) -> StorageTarget {
        self.dispatch().own
    }

    /// Counterpart table surfaced as matches for this role.
    pub fn match_target(&self) -> StorageTarget {
        self.dispatch().matched
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| MarketError::InvalidRole(s.to_string()))
    }
}

impl StorageTarget {
    pub fn table(&self) -> &'static str {
        match self {
            StorageTarget::ProduceListings => "produce_listings",
            StorageTarget::PurchaseRequests => "purchase_requests",
            StorageTarget::AssistancePrograms => "assistance_programs",
        }
    }
}
