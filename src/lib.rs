//! Personal finances ledger
//!
//! Users, token authentication and a ledger of income/expense releases with
//! balance, extract and paginated queries.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod projection;
pub mod repository;

pub use config::Config;
pub use domain::{DomainError, OperationContext};
pub use error::{AppError, AppResult};
