//! service-core: Shared infrastructure for ProfitLens services.
pub mod config;
pub mod error;
pub mod middleware;
pub mod observability;
