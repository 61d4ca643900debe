use rust_decimal::Decimal;
use uuid::Uuid;

use crate::core::errors::LedgerError;
use crate::core::money::{self, Currency, Money};

pub const DESCRIPTION_MAX_LEN: usize = 1000;
pub const NAME_MIN_LEN: usize = 2;
pub const NAME_MAX_LEN: usize = 255;

pub fn validate_text(field: &str, value: &str, min_length: usize, max_length: usize) -> Result<(), LedgerError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::invalid(
            field,
            format!("Invalid {}", field),
            format!("{} cannot be empty", field),
        ));
    }
    let length = trimmed.chars().count();
    if length < min_length {
        return Err(LedgerError::invalid(
            field,
            format!("{} Too Short", field),
            format!("{} must be at least {} characters long", field, min_length),
        ));
    }
    if length > max_length {
        return Err(LedgerError::invalid(
            field,
            format!("{} Too Long", field),
            format!("{} cannot exceed {} characters", field, max_length),
        ));
    }
    if trimmed.chars().any(|c| c.is_control()) {
        return Err(LedgerError::invalid(
            field,
            format!("Invalid {}", field),
            format!("{} contains invalid characters", field),
        ));
    }
    Ok(())
}

pub fn validate_description(description: &str) -> Result<(), LedgerError> {
    validate_text("description", description, 1, DESCRIPTION_MAX_LEN)
}

pub fn validate_name(name: &str) -> Result<(), LedgerError> {
    validate_text("name", name, NAME_MIN_LEN, NAME_MAX_LEN)
}

pub fn validate_email(email: &str) -> Result<(), LedgerError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(LedgerError::invalid("email", "Missing Email", "email is required"));
    }
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .rsplit_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic()))
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        return Err(LedgerError::invalid(
            "email",
            "Invalid Email",
            format!("'{}' is not a valid email address", email),
        ));
    }
    Ok(())
}

pub fn validate_amount(field: &str, amount: Money) -> Result<(), LedgerError> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::invalid(field, "Invalid Amount", "Amount must be greater than 0"));
    }
    if amount > money::max_amount() {
        return Err(LedgerError::invalid(
            field,
            "Amount Too Large",
            format!("Amount cannot exceed {}", money::max_amount()),
        ));
    }
    if !money::has_money_scale(amount) {
        return Err(LedgerError::invalid(
            field,
            "Invalid Amount",
            "Amount cannot have more than 2 decimal places",
        ));
    }
    Ok(())
}

pub fn validate_percentage(percentage: Decimal) -> Result<(), LedgerError> {
    if percentage < Decimal::ZERO || percentage > Decimal::ONE_HUNDRED {
        return Err(LedgerError::invalid(
            "percentage",
            "Invalid Percentage",
            "Percentage must be between 0 and 100",
        ));
    }
    if !money::has_money_scale(percentage) {
        return Err(LedgerError::invalid(
            "percentage",
            "Invalid Percentage",
            "Percentage cannot have more than 2 decimal places",
        ));
    }
    Ok(())
}

pub fn validate_id(field: &str, id: &str) -> Result<(), LedgerError> {
    Uuid::parse_str(id)
        .map(|_| ())
        .map_err(|_| LedgerError::invalid(field, "Invalid Identifier", format!("'{}' is not a valid identifier", id)))
}

/// Resolves an optional currency code, falling back to `default` when absent.
pub fn parse_currency(code: Option<&str>, default: Currency) -> Result<Currency, LedgerError> {
    match code.map(str::trim) {
        None | Some("") => Ok(default),
        Some(code) => code.parse(),
    }
}
