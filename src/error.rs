use std::fmt;

use opentelemetry_semantic_conventions::{attribute::OTEL_STATUS_CODE, trace::ERROR_TYPE};
use thiserror::Error;
use tracing::{Span, error, warn};

/// The entity a dangling id was supposed to point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reference {
    Role(i64),
    Account(i64),
    Activity(i64),
    Training(i64),
    Attendance(i64),
    Competition(i64),
    Result(i64),
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reference::Role(id) => write!(f, "role {}", id),
            Reference::Account(id) => write!(f, "account {}", id),
            Reference::Activity(id) => write!(f, "activity {}", id),
            Reference::Training(id) => write!(f, "training {}", id),
            Reference::Attendance(id) => write!(f, "attendance {}", id),
            Reference::Competition(id) => write!(f, "competition {}", id),
            Reference::Result(id) => write!(f, "result {}", id),
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Email '{0}' is already registered")]
    DuplicateEmail(String),

    #[error("Attendance for member {member_account_id} in training {training_id} already recorded")]
    DuplicateAttendance {
        training_id: i64,
        member_account_id: i64,
    },

    #[error("Result for account {account_id} in competition {competition_id} already recorded")]
    DuplicateResult {
        competition_id: i64,
        account_id: i64,
    },

    #[error("{entity} named '{name}' already exists")]
    DuplicateName { entity: &'static str, name: String },

    #[error("Account {0} does not hold the Trainer role")]
    InvalidTrainerRole(i64),

    #[error("Account {0} does not hold the Member role")]
    InvalidMemberRole(i64),

    #[error("Unknown {0}")]
    UnknownReference(Reference),

    #[error("Cannot delete {entity} {id}: still referenced by {dependents}")]
    ReferenceInUse {
        entity: &'static str,
        id: i64,
        dependents: &'static str,
    },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid date: {0}")]
    InvalidDateRange(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable tag the calling layer can map to a user-facing message.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Database(_) => "database_error",
            AppError::DuplicateEmail(_) => "duplicate_email",
            AppError::DuplicateAttendance { .. } => "duplicate_attendance",
            AppError::DuplicateResult { .. } => "duplicate_result",
            AppError::DuplicateName { .. } => "duplicate_name",
            AppError::InvalidTrainerRole(_) => "invalid_trainer_role",
            AppError::InvalidMemberRole(_) => "invalid_member_role",
            AppError::UnknownReference(_) => "unknown_reference",
            AppError::ReferenceInUse { .. } => "reference_in_use",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::InvalidDateRange(_) => "invalid_date_range",
            AppError::InvalidCredentials => "invalid_credentials",
            AppError::Validation(_) => "validation_error",
            AppError::Internal(_) => "internal_error",
        }
    }

    fn is_infrastructure(&self) -> bool {
        matches!(self, AppError::Database(_) | AppError::Internal(_))
    }

    pub fn log_and_record(&self, ctx: &str) {
        let current_span = Span::current();
        let message = self.to_string();
        let error_kind = self.kind();

        match self {
            AppError::Database(err) => {
                error!(error = %message, context = %ctx, db_error = %err, "Database error");
            }
            AppError::Internal(msg) => {
                error!(message = %msg, context = %ctx, "Internal error");
            }
            AppError::Unauthorized(msg) => {
                warn!(message = %msg, context = %ctx, "Authorization error");
            }
            _ => {
                warn!(error = %message, kind = error_kind, context = %ctx, "Domain rule rejected operation");
            }
        }

        if !current_span.is_none() {
            current_span.record("error", tracing::field::display(true));
            current_span.record(ERROR_TYPE, tracing::field::display(error_kind));
            current_span.record("error.message", tracing::field::display(&message));

            if self.is_infrastructure() {
                current_span.record(OTEL_STATUS_CODE, tracing::field::display("ERROR"));
            }
        }
    }

    /// Translates a unique-constraint failure into `conflict`, keeping any other
    /// storage error as is. Used where a concurrent writer won the race after the
    /// domain pre-check passed.
    pub(crate) fn on_unique_violation(err: sqlx::Error, conflict: AppError) -> AppError {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => conflict,
            _ => AppError::Database(err),
        }
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> Self {
        AppError::Internal(format!("Cryptography error: {}", error))
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(error: sqlx::migrate::MigrateError) -> Self {
        AppError::Internal(format!("Migration error: {}", error))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, field_errors)| {
                field_errors.iter().map(move |e| {
                    format!(
                        "{}: {}",
                        field,
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string())
                    )
                })
            })
            .collect();
        fields.sort();

        AppError::Validation(fields.join(", "))
    }
}
