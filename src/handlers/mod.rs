//! Command Handlers module
//!
//! Write-side operations: user registration and credential checks,
//! release validation and lifecycle.

mod commands;
mod release_handler;
mod user_handler;

pub use commands::*;
pub use release_handler::{ReleaseHandler, RELEASE_NOT_FOUND, USER_NOT_FOUND_FOR_ID};
pub use user_handler::{
    UserHandler, EMAIL_ALREADY_REGISTERED, INVALID_PASSWORD, USER_NOT_FOUND_FOR_EMAIL,
};
