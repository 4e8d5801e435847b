//! Projection module
//!
//! Read side of the ledger: balances, extracts and paginated listings
//! computed from the stored releases on every call.

mod service;
mod window;

pub use service::ProjectionService;
pub use window::{Window, WINDOW_DAYS};
