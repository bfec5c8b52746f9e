//! Input validation rules shared by services

use super::DomainError;

/// Strip hyphens and spaces from an ISBN and check that 10 or 13 digits remain.
///
/// Only the digit count is enforced. Checksums are not verified because
/// publisher data in the wild frequently carries invalid ones.
pub fn normalize_isbn(raw: &str) -> Result<String, DomainError> {
    let cleaned: String = raw
        .chars()
        .filter(|c| *c != '-' && !c.is_whitespace())
        .collect();

    if !cleaned.chars().all(|c| c.is_ascii_digit()) {
        return Err(DomainError::validation("ISBN must contain only digits"));
    }

    match cleaned.len() {
        10 | 13 => Ok(cleaned),
        n => Err(DomainError::validation(format!(
            "ISBN must be 10 or 13 digits, got {}",
            n
        ))),
    }
}

/// Trim a required name field, rejecting empty values.
pub fn required_name(field: &str, value: &str) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

/// Trim an optional text field; blank strings become `None`.
pub fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn normalize_email(raw: &str) -> Result<String, DomainError> {
    let email = raw.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain))
            if !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.contains(char::is_whitespace) =>
        {
            Ok(email)
        }
        _ => Err(DomainError::validation("Email address is invalid")),
    }
}

pub const MIN_PASSWORD_LEN: usize = 6;

pub fn check_password(password: &str) -> Result<(), DomainError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(DomainError::validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

pub fn check_quantity(quantity: i32) -> Result<(), DomainError> {
    if quantity < 1 {
        return Err(DomainError::validation("Quantity must be at least 1"));
    }
    Ok(())
}

/// Clamp pagination input to sane bounds. Pages are 1-based on the wire.
pub fn page_window(page: Option<u64>, limit: Option<u64>) -> (u64, u64) {
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let page = page.unwrap_or(1).clamp(1, MAX_PAGE);
    (page, limit)
}

pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 100;
/// Keeps `page * limit` well inside the range SQLite accepts as an offset.
pub const MAX_PAGE: u64 = 1_000_000;
