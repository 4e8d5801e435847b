//! Release entity
//!
//! A release is a single income or expense entry owned by one user.
//! Fields are optional so that a release can be built up incrementally
//! and validated with precise, ordered error messages.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::DomainError;

pub const INVALID_DESCRIPTION: &str = "invalid description";
pub const USER_REQUIRED: &str = "user required";
pub const INVALID_VALUE: &str = "invalid value";
pub const TYPE_REQUIRED: &str = "type required";
pub const RELEASE_DATE_REQUIRED: &str = "release date required";
pub const INVALID_MONTH: &str = "invalid month";
pub const INVALID_YEAR: &str = "invalid year";

const MIN_YEAR: i32 = 1000;
const MAX_YEAR: i32 = 9999;

/// Values are stored as NUMERIC(19, 2): two decimal places, 17 integer digits
const MAX_VALUE_SCALE: u32 = 2;
const MAX_VALUE_INTEGER_DIGITS: u32 = 17;

/// Kind of release
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReleaseType {
    Income,
    Expense,
}

impl ReleaseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReleaseType::Income => "INCOME",
            ReleaseType::Expense => "EXPENSE",
        }
    }
}

impl fmt::Display for ReleaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReleaseType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INCOME" => Ok(ReleaseType::Income),
            "EXPENSE" => Ok(ReleaseType::Expense),
            other => Err(DomainError::validation(format!("unknown release type: {other}"))),
        }
    }
}

/// Settlement status of a release
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReleaseStatus {
    Pending,
    Settled,
    Canceled,
}

impl ReleaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReleaseStatus::Pending => "PENDING",
            ReleaseStatus::Settled => "SETTLED",
            ReleaseStatus::Canceled => "CANCELED",
        }
    }
}

impl fmt::Display for ReleaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReleaseStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(ReleaseStatus::Pending),
            "SETTLED" => Ok(ReleaseStatus::Settled),
            "CANCELED" => Ok(ReleaseStatus::Canceled),
            other => Err(DomainError::validation(format!("unknown release status: {other}"))),
        }
    }
}

/// Ledger entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Release {
    pub id: Option<i64>,
    pub description: String,
    pub month: Option<i32>,
    pub year: Option<i32>,
    pub user_id: Option<i64>,
    pub value: Option<Decimal>,
    pub release_type: Option<ReleaseType>,
    pub status: Option<ReleaseStatus>,
    pub release_date: Option<NaiveDate>,
    pub created_at: Option<NaiveDate>,
}

impl Release {
    /// Check the release invariants, stopping at the first failure.
    ///
    /// The order is part of the contract: description, user, value, type,
    /// release date, then the optional month and year ranges.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.description.trim().is_empty() {
            return Err(DomainError::validation(INVALID_DESCRIPTION));
        }

        if self.user_id.is_none() {
            return Err(DomainError::validation(USER_REQUIRED));
        }

        match self.value {
            Some(value) if value > Decimal::ZERO && fits_value_column(value) => {}
            _ => return Err(DomainError::validation(INVALID_VALUE)),
        }

        if self.release_type.is_none() {
            return Err(DomainError::validation(TYPE_REQUIRED));
        }

        if self.release_date.is_none() {
            return Err(DomainError::validation(RELEASE_DATE_REQUIRED));
        }

        if let Some(month) = self.month {
            if !(1..=12).contains(&month) {
                return Err(DomainError::validation(INVALID_MONTH));
            }
        }

        if let Some(year) = self.year {
            if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
                return Err(DomainError::validation(INVALID_YEAR));
            }
        }

        Ok(())
    }

}

/// Trailing zeros do not count towards the scale, so `10.500` is accepted.
fn fits_value_column(value: Decimal) -> bool {
    let normalized = value.normalize();
    normalized.scale() <= MAX_VALUE_SCALE
        && normalized.trunc() < Decimal::from(10_i64.pow(MAX_VALUE_INTEGER_DIGITS))
}

/// Current calendar date used for creation stamps and reporting windows
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn complete_release() -> Release {
        Release {
            description: "Salary".to_string(),
            month: Some(1),
            year: Some(2024),
            user_id: Some(1),
            value: Some(dec!(1500.00)),
            release_type: Some(ReleaseType::Income),
            release_date: NaiveDate::from_ymd_opt(2024, 1, 5),
            ..Default::default()
        }
    }

    fn message(result: Result<(), DomainError>) -> String {
        match result {
            Err(DomainError::Validation(msg)) => msg,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_validation_precedence_on_incremental_population() {
        let mut release = Release::default();
        assert_eq!(message(release.validate()), INVALID_DESCRIPTION);

        release.description = "Salary".to_string();
        assert_eq!(message(release.validate()), USER_REQUIRED);

        release.user_id = Some(1);
        assert_eq!(message(release.validate()), INVALID_VALUE);

        release.value = Some(Decimal::ONE);
        assert_eq!(message(release.validate()), TYPE_REQUIRED);

        release.release_type = Some(ReleaseType::Income);
        assert_eq!(message(release.validate()), RELEASE_DATE_REQUIRED);

        release.release_date = NaiveDate::from_ymd_opt(2024, 1, 5);
        assert!(release.validate().is_ok());
    }

    #[test]
    fn test_blank_description_rejected() {
        let release = Release {
            description: "   ".to_string(),
            ..complete_release()
        };
        assert_eq!(message(release.validate()), INVALID_DESCRIPTION);
    }

    #[test]
    fn test_non_positive_values_rejected() {
        for value in [Decimal::ZERO, dec!(-0.01), dec!(-100)] {
            let release = Release {
                value: Some(value),
                ..complete_release()
            };
            assert_eq!(message(release.validate()), INVALID_VALUE);
        }
    }

    #[test]
    fn test_values_beyond_cents_rejected() {
        for value in [dec!(10.555), dec!(0.001), dec!(100000000000000000)] {
            let release = Release {
                value: Some(value),
                ..complete_release()
            };
            assert_eq!(message(release.validate()), INVALID_VALUE);
        }
    }

    #[test]
    fn test_values_with_trailing_zeros_accepted() {
        for value in [dec!(10.500), dec!(0.01), dec!(99999999999999999.99)] {
            let release = Release {
                value: Some(value),
                ..complete_release()
            };
            assert!(release.validate().is_ok(), "{value} should be accepted");
        }
    }

    #[test]
    fn test_month_and_year_ranges() {
        let release = Release {
            month: Some(13),
            ..complete_release()
        };
        assert_eq!(message(release.validate()), INVALID_MONTH);

        let release = Release {
            month: Some(0),
            ..complete_release()
        };
        assert_eq!(message(release.validate()), INVALID_MONTH);

        let release = Release {
            year: Some(999),
            ..complete_release()
        };
        assert_eq!(message(release.validate()), INVALID_YEAR);

        let release = Release {
            month: None,
            year: None,
            ..complete_release()
        };
        assert!(release.validate().is_ok());
    }

    #[test]
    fn test_required_fields_checked_before_month() {
        let release = Release {
            month: Some(42),
            release_date: None,
            ..complete_release()
        };
        assert_eq!(message(release.validate()), RELEASE_DATE_REQUIRED);
    }

    #[test]
    fn test_enum_wire_format() {
        assert_eq!(serde_json::to_string(&ReleaseType::Expense).unwrap(), "\"EXPENSE\"");
        assert_eq!(serde_json::to_string(&ReleaseStatus::Settled).unwrap(), "\"SETTLED\"");
        assert_eq!("CANCELED".parse::<ReleaseStatus>().unwrap(), ReleaseStatus::Canceled);
        assert!("settled".parse::<ReleaseStatus>().is_err());
    }
}
