//! Input validation for the store API
//!
//! Mirrors the validation rules enforced at the HTTP boundary: non-blank
//! fields, email/phone formats, the accepted payment methods, and password
//! requirements.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{Error, Result};

/// Accepted payment methods for an account
pub const PAYMENT_METHODS: [&str; 3] = ["credit_card", "paypal", "bank_transfer"];

/// Minimum password length
pub const MIN_PASSWORD_LEN: usize = 8;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email regex")
});

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[1-9]\d{1,14}$").expect("phone regex"));

/// Reject empty or whitespace-only values
pub fn non_blank(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::invalid(format!("{} cannot be empty", field)));
    }
    Ok(())
}

/// Validate and normalize an email address
pub fn email(value: &str) -> Result<String> {
    let trimmed = value.trim();
    if !EMAIL_RE.is_match(trimmed) {
        return Err(Error::invalid("Invalid email format"));
    }
    Ok(trimmed.to_string())
}

/// Validate an E.164-style phone number
pub fn phone(value: &str) -> Result<()> {
    if !PHONE_RE.is_match(value) {
        return Err(Error::invalid("Invalid phone number format"));
    }
    Ok(())
}

/// Validate a payment method against the accepted set
pub fn payment_method(value: &str) -> Result<()> {
    if !PAYMENT_METHODS.contains(&value) {
        return Err(Error::invalid(format!(
            "Invalid payment method. Valid options: {}",
            PAYMENT_METHODS.join(", ")
        )));
    }
    Ok(())
}

/// Validate a password and its confirmation
pub fn password(value: &str, confirm: &str) -> Result<()> {
    if value.len() < MIN_PASSWORD_LEN {
        return Err(Error::invalid(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LEN
        )));
    }
    if value != confirm {
        return Err(Error::invalid("Passwords do not match"));
    }
    Ok(())
}

/// Validate a user role
pub fn role(value: i64) -> Result<()> {
    if value != crate::ROLE_CUSTOMER && value != crate::ROLE_ADMIN {
        return Err(Error::invalid("Invalid role"));
    }
    Ok(())
}

/// Validate an image URL scheme
pub fn image_url(value: &str) -> Result<()> {
    if !value.starts_with("http://") && !value.starts_with("https://") {
        return Err(Error::invalid(
            "Image URL must start with 'http://' or 'https://'",
        ));
    }
    Ok(())
}

/// Validate a product price
pub fn price(value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(Error::invalid("Price must be greater than 0"));
    }
    Ok(())
}

/// Validate a product stock count
pub fn stock(value: i64) -> Result<()> {
    if value < 0 {
        return Err(Error::invalid("Stock cannot be negative"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_accepts_common_addresses() {
        assert_eq!(email("user@example.com").unwrap(), "user@example.com");
        assert_eq!(email("  padded@mail.mx ").unwrap(), "padded@mail.mx");
    }

    #[test]
    fn test_email_rejects_malformed_addresses() {
        assert!(email("not-an-email").is_err());
        assert!(email("missing@tld").is_err());
        assert!(email("@example.com").is_err());
    }

    #[test]
    fn test_phone_formats() {
        assert!(phone("+525512345678").is_ok());
        assert!(phone("5512345678").is_ok());
        assert!(phone("0123").is_err());
        assert!(phone("555-1234").is_err());
    }

    #[test]
    fn test_payment_methods() {
        assert!(payment_method("credit_card").is_ok());
        assert!(payment_method("paypal").is_ok());
        assert!(payment_method("bank_transfer").is_ok());
        assert!(payment_method("cash").is_err());
    }

    #[test]
    fn test_password_rules() {
        assert!(password("longenough", "longenough").is_ok());
        assert!(password("short", "short").is_err());
        assert!(password("longenough", "different1").is_err());
    }

    #[test]
    fn test_non_blank() {
        assert!(non_blank("name", "ok").is_ok());
        assert!(non_blank("name", "   ").is_err());
        assert!(non_blank("name", "").is_err());
    }

    #[test]
    fn test_product_fields() {
        assert!(price(10.0).is_ok());
        assert!(price(0.0).is_err());
        assert!(price(-1.0).is_err());
        assert!(stock(0).is_ok());
        assert!(stock(-1).is_err());
        assert!(image_url("https://cdn.example.com/p.jpg").is_ok());
        assert!(image_url("ftp://cdn.example.com/p.jpg").is_err());
    }
}
