use chrono::{Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::AppError;

pub const MINIMUM_AGE_YEARS: u32 = 13;
pub const MAXIMUM_AGE_YEARS: u32 = 150;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewAccount {
    #[validate(length(min = 2, max = 100, message = "First name must be 2-100 characters"))]
    pub first_name: String,
    #[validate(length(min = 2, max = 100, message = "Last name must be 2-100 characters"))]
    pub last_name: String,
    #[validate(email(message = "Email address is not valid"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    pub birth_date: Option<NaiveDate>,
    pub role_id: i64,
}

impl NewAccount {
    /// Copy with surrounding whitespace removed from names and email, so
    /// length rules apply to what is stored.
    pub fn trimmed(&self) -> Self {
        Self {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_string(),
            ..self.clone()
        }
    }
}

/// Full re-edit of an account; the password is changed separately.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AccountUpdate {
    #[validate(length(min = 2, max = 100, message = "First name must be 2-100 characters"))]
    pub first_name: String,
    #[validate(length(min = 2, max = 100, message = "Last name must be 2-100 characters"))]
    pub last_name: String,
    #[validate(email(message = "Email address is not valid"))]
    pub email: String,
    pub birth_date: Option<NaiveDate>,
    pub role_id: i64,
}

impl AccountUpdate {
    pub fn trimmed(&self) -> Self {
        Self {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_string(),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewCompetition {
    #[validate(length(min = 2, max = 150, message = "Competition name must be 2-150 characters"))]
    pub name: String,
    pub date: NaiveDate,
    #[validate(length(max = 150, message = "Venue must be at most 150 characters"))]
    pub venue: Option<String>,
    pub description: Option<String>,
    pub activity_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ResultEntry {
    #[validate(range(min = 1, message = "Position starts at 1"))]
    pub position: Option<i32>,
    #[validate(length(max = 100, message = "Mark must be at most 100 characters"))]
    pub mark: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceEntry {
    pub present: bool,
    pub notes: Option<String>,
}

impl Default for AttendanceEntry {
    fn default() -> Self {
        Self {
            present: true,
            notes: None,
        }
    }
}

#[derive(Debug, Validate)]
struct NameInput {
    #[validate(length(min = 2, max = 100, message = "Name must be 2-100 characters"))]
    name: String,
}

/// Role and activity names share the same length bounds.
pub fn validate_name(name: &str) -> Result<(), AppError> {
    NameInput {
        name: name.trim().to_string(),
    }
    .validate()?;
    Ok(())
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn years_before(date: NaiveDate, years: u32) -> NaiveDate {
    date.checked_sub_months(Months::new(years * 12))
        .unwrap_or(NaiveDate::MIN)
}

pub fn validate_birth_date(birth_date: NaiveDate, today: NaiveDate) -> Result<(), AppError> {
    if birth_date > today {
        return Err(AppError::InvalidDateRange(
            "Birth date cannot be in the future".to_string(),
        ));
    }

    if birth_date < years_before(today, MAXIMUM_AGE_YEARS) {
        return Err(AppError::InvalidDateRange(format!(
            "Birth date cannot be more than {} years ago",
            MAXIMUM_AGE_YEARS
        )));
    }

    if birth_date > years_before(today, MINIMUM_AGE_YEARS) {
        return Err(AppError::InvalidDateRange(format!(
            "Account holder must be at least {} years old",
            MINIMUM_AGE_YEARS
        )));
    }

    Ok(())
}

pub fn validate_optional_birth_date(birth_date: Option<NaiveDate>) -> Result<(), AppError> {
    match birth_date {
        Some(date) => validate_birth_date(date, today()),
        None => Ok(()),
    }
}
