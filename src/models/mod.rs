pub mod listing;
pub mod role;

pub use listing::*;
pub use role::*;
