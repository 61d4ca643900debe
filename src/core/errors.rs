use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, PartialEq, Eq, ToSchema)]
pub struct FieldError {
    pub field: String,
    pub title: String,
    pub description: String,
}

impl FieldError {
    pub fn new(field: &str, title: impl Into<String>, description: impl Into<String>) -> Self {
        FieldError {
            field: field.to_string(),
            title: title.into(),
            description: description.into(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.title, self.description)
    }
}

/// Semantic category of a [`LedgerError`].
///
/// The HTTP layer maps on this, never on individual variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    Validation,
    NotFound,
    InvalidSplit,
    InsufficientDebt,
    AlreadyExists,
    Persistence,
}

#[derive(Error, Debug, Clone, Serialize)]
pub enum LedgerError {
    /// Generic input validation error with detailed field information
    #[error("Invalid input for field `{0}`: {1}")]
    InvalidInput(String, FieldError),

    #[error("User {0} is not a group member")]
    NotGroupMember(String),

    /// Cannot create a settlement from a user to themselves
    #[error("From user and to user cannot be the same")]
    SelfSettlement,

    #[error("User {0} not found")]
    UserNotFound(String),

    #[error("Group {0} not found")]
    GroupNotFound(String),

    #[error("Expense {0} not found")]
    ExpenseNotFound(String),

    #[error("Settlement {0} not found")]
    SettlementNotFound(String),

    /// Split amounts or percentages don't reconcile with the expense total
    #[error("Invalid split: {0}")]
    InvalidSplit(String),

    /// Settlement would pay back more than the payer currently owes
    #[error("Insufficient debt: available {available}, requested {requested}")]
    InsufficientDebt { available: Decimal, requested: Decimal },

    #[error("Email {0} already registered")]
    EmailAlreadyRegistered(String),

    #[error("User {0} is already a group member")]
    AlreadyGroupMember(String),

    /// Idempotency key was already used for a different request
    #[error("Idempotency key {0} was used with a different request")]
    IdempotencyKeyReused(String),

    #[error("Storage error: {0}")]
    StorageError(String),
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::InvalidInput(..) | LedgerError::NotGroupMember(_) | LedgerError::SelfSettlement => {
                ErrorKind::Validation
            }
            LedgerError::UserNotFound(_)
            | LedgerError::GroupNotFound(_)
            | LedgerError::ExpenseNotFound(_)
            | LedgerError::SettlementNotFound(_) => ErrorKind::NotFound,
            LedgerError::InvalidSplit(_) => ErrorKind::InvalidSplit,
            LedgerError::InsufficientDebt { .. } => ErrorKind::InsufficientDebt,
            LedgerError::EmailAlreadyRegistered(_)
            | LedgerError::AlreadyGroupMember(_)
            | LedgerError::IdempotencyKeyReused(_) => ErrorKind::AlreadyExists,
            LedgerError::StorageError(_) => ErrorKind::Persistence,
        }
    }

    pub(crate) fn invalid(field: &str, title: impl Into<String>, description: impl Into<String>) -> Self {
        LedgerError::InvalidInput(field.to_string(), FieldError::new(field, title, description))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn kinds_group_variants_by_meaning() {
        assert_eq!(LedgerError::SelfSettlement.kind(), ErrorKind::Validation);
        assert_eq!(LedgerError::NotGroupMember("u".into()).kind(), ErrorKind::Validation);
        assert_eq!(LedgerError::ExpenseNotFound("e".into()).kind(), ErrorKind::NotFound);
        assert_eq!(LedgerError::AlreadyGroupMember("u".into()).kind(), ErrorKind::AlreadyExists);
        assert_eq!(LedgerError::StorageError("disk".into()).kind(), ErrorKind::Persistence);
    }

    #[test]
    fn insufficient_debt_reports_both_amounts() {
        let err = LedgerError::InsufficientDebt {
            available: dec!(20.00),
            requested: dec!(50.00),
        };
        assert_eq!(err.kind(), ErrorKind::InsufficientDebt);
        assert_eq!(err.to_string(), "Insufficient debt: available 20.00, requested 50.00");
    }
}
