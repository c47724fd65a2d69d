// src/common/validation.rs

use rust_decimal::Decimal;
use validator::{ValidationError, ValidationErrors};

/// Column width of `users.mobile` and `otps.mobile`.
pub const MOBILE_MAX_LEN: usize = 15;

/// Mobile numbers: optional leading '+', then at least 10 digits, at most
/// `MOBILE_MAX_LEN` characters in total.
pub fn validate_mobile(value: &str) -> Result<(), ValidationError> {
    let digits = value.strip_prefix('+').unwrap_or(value);
    let well_formed = digits.len() >= 10
        && value.len() <= MOBILE_MAX_LEN
        && digits.chars().all(|c| c.is_ascii_digit());

    if !well_formed {
        let mut err = ValidationError::new("mobile");
        err.message = Some("Enter a valid mobile number (10 to 15 characters, digits with an optional leading '+').".into());
        return Err(err);
    }
    Ok(())
}

pub fn validate_otp_code(value: &str) -> Result<(), ValidationError> {
    if value.len() != 6 || !value.chars().all(|c| c.is_ascii_digit()) {
        let mut err = ValidationError::new("otp");
        err.message = Some("The OTP must be exactly 6 digits.".into());
        return Err(err);
    }
    Ok(())
}

pub fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() {
        let mut err = ValidationError::new("range");
        err.add_param("min".into(), &0.0);
        err.message = Some("The value cannot be negative.".into());
        return Err(err);
    }
    Ok(())
}

/// Rejects values a NUMERIC(p, s) column would overflow on, after rounding to `scale`.
fn fits_numeric(val: &Decimal, integer_digits: u32, scale: u32) -> bool {
    val.round_dp(scale) < Decimal::from(10_i64.pow(integer_digits))
}

/// Service prices: NUMERIC(10, 2).
pub fn validate_price(val: &Decimal) -> Result<(), ValidationError> {
    validate_not_negative(val)?;
    if !fits_numeric(val, 8, 2) {
        let mut err = ValidationError::new("range");
        err.add_param("max".into(), &99_999_999.99);
        err.message = Some("The price must be below 100,000,000.".into());
        return Err(err);
    }
    Ok(())
}

/// Tax rates are percentages stored as NUMERIC(5, 2).
pub fn validate_tax_rate(val: &Decimal) -> Result<(), ValidationError> {
    validate_not_negative(val)?;
    if !fits_numeric(val, 3, 2) {
        let mut err = ValidationError::new("range");
        err.add_param("max".into(), &999.99);
        err.message = Some("The rate must be below 1000.".into());
        return Err(err);
    }
    Ok(())
}

pub fn validate_priority(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() || *val > Decimal::ONE {
        let mut err = ValidationError::new("range");
        err.message = Some("Priority must be between 0.0 and 1.0.".into());
        return Err(err);
    }
    Ok(())
}

/// A user is identified by mobile, email, or both; never by neither.
pub fn require_identity(mobile: Option<&str>, email: Option<&str>) -> Result<(), ValidationErrors> {
    let present = |v: Option<&str>| v.is_some_and(|s| !s.trim().is_empty());

    if present(mobile) || present(email) {
        return Ok(());
    }

    let mut err = ValidationError::new("identity");
    err.message = Some("Either a mobile number or an email address is required.".into());
    let mut errors = ValidationErrors::new();
    errors.add("mobile", err);
    Err(errors)
}

/// Empty strings from forms are treated as absent.
pub fn blank_to_none(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() { None } else { Some(trimmed.to_string()) }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn mobile_accepts_plain_and_international_numbers() {
        assert!(validate_mobile("9876543210").is_ok());
        assert!(validate_mobile("+919876543210").is_ok());
        assert!(validate_mobile("98765").is_err());
        assert!(validate_mobile("98765abc10").is_err());
        assert!(validate_mobile("+").is_err());
    }

    #[test]
    fn mobile_fits_its_column_including_the_plus() {
        assert!(validate_mobile("123456789012345").is_ok());
        assert!(validate_mobile("+12345678901234").is_ok());
        assert!(validate_mobile("+123456789012345").is_err());
        assert!(validate_mobile("1234567890123456").is_err());
    }

    #[test]
    fn otp_code_must_be_six_digits() {
        assert!(validate_otp_code("012345").is_ok());
        assert!(validate_otp_code("12345").is_err());
        assert!(validate_otp_code("12a456").is_err());
    }

    #[test]
    fn priority_is_bounded() {
        assert!(validate_priority(&Decimal::from_str("0.5").unwrap()).is_ok());
        assert!(validate_priority(&Decimal::ONE).is_ok());
        assert!(validate_priority(&Decimal::from_str("1.1").unwrap()).is_err());
        assert!(validate_priority(&Decimal::from_str("-0.1").unwrap()).is_err());
    }

    #[test]
    fn price_and_rate_fit_their_columns() {
        let dec = |s: &str| Decimal::from_str(s).unwrap();

        assert!(validate_price(&dec("99999999.99")).is_ok());
        assert!(validate_price(&dec("100000000")).is_err());
        assert!(validate_price(&dec("99999999.999")).is_err());
        assert!(validate_price(&dec("-1")).is_err());

        assert!(validate_tax_rate(&dec("18.00")).is_ok());
        assert!(validate_tax_rate(&dec("999.99")).is_ok());
        assert!(validate_tax_rate(&dec("1000")).is_err());
        assert!(validate_tax_rate(&dec("-0.01")).is_err());
    }

    #[test]
    fn identity_needs_mobile_or_email() {
        assert!(require_identity(Some("9876543210"), None).is_ok());
        assert!(require_identity(None, Some("a@b.com")).is_ok());
        assert!(require_identity(Some("  "), None).is_err());
        assert!(require_identity(None, None).is_err());
    }

    #[test]
    fn blank_strings_become_none() {
        assert_eq!(blank_to_none(Some("   ".into())), None);
        assert_eq!(blank_to_none(Some(" x ".into())), Some("x".into()));
        assert_eq!(blank_to_none(None), None);
    }
}
