//! Domain module
//!
//! Core domain types and business rules.

pub mod context;
pub mod error;
pub mod filter;
pub mod page;
pub mod release;
pub mod user;

pub use context::OperationContext;
pub use error::DomainError;
pub use filter::ReleaseFilter;
pub use page::{Page, PageRequest};
pub use release::{today, Release, ReleaseStatus, ReleaseType};
pub use user::{Identity, NewUser, User, DEFAULT_ROLE};
