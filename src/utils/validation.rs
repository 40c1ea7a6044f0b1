use crate::error::{AppError, AppResult};
use regex::Regex;

/// Validate an email address (same permissive shape the web form enforces)
pub fn validate_email(email: &str) -> AppResult<()> {
    let email_regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();

    if !email_regex.is_match(email.trim()) {
        return Err(AppError::ValidationError("Email invalide".to_string()));
    }

    Ok(())
}

/// Normalized form stored and used as rate-limit identifier
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// International phone numbers, loosely: optional +, digits with common
/// separators, at least 6 actual digits.
pub fn validate_phone(phone: &str) -> AppResult<()> {
    let phone_regex = Regex::new(r"^\+?[0-9 ().-]{6,20}$").unwrap();
    let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();

    if !phone_regex.is_match(phone.trim()) || digits < 6 {
        return Err(AppError::ValidationError(
            "Numéro de téléphone invalide".to_string(),
        ));
    }

    Ok(())
}

pub fn validate_name(name: &str) -> AppResult<()> {
    let len = name.trim().chars().count();

    if len < 2 || len > 100 {
        return Err(AppError::ValidationError("Nom invalide".to_string()));
    }

    Ok(())
}
