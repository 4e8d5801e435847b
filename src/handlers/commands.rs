//! Command definitions
//!
//! Commands represent intentions to change the system state.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{ReleaseStatus, ReleaseType};

/// Command to register a new user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterUserCommand {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl RegisterUserCommand {
    pub fn new(name: String, email: String, password: String) -> Self {
        Self {
            name,
            email,
            password,
        }
    }
}

/// Command to create or rewrite a release.
///
/// `id` is ignored on creation and required on update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReleaseCommand {
    pub id: Option<i64>,
    pub description: Option<String>,
    pub month: Option<i32>,
    pub year: Option<i32>,
    pub value: Option<Decimal>,
    pub user_id: Option<i64>,
    pub release_type: Option<ReleaseType>,
    pub status: Option<ReleaseStatus>,
    pub release_date: Option<NaiveDate>,
}

impl ReleaseCommand {
    pub fn new(user_id: i64, description: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id),
            description: Some(description.into()),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_value(mut self, value: Decimal) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_type(mut self, release_type: ReleaseType) -> Self {
        self.release_type = Some(release_type);
        self
    }

    pub fn with_status(mut self, status: ReleaseStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_release_date(mut self, release_date: NaiveDate) -> Self {
        self.release_date = Some(release_date);
        self
    }

    pub fn with_period(mut self, month: i32, year: i32) -> Self {
        self.month = Some(month);
        self.year = Some(year);
        self
    }
}
