pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod rate_limit;
pub mod routes;
pub mod services;

pub use config::Config;
pub use error::{AppResult, MarketError};
