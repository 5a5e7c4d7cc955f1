//! Stateless input predicates shared by account registration, manual entry
//! and the sync pipeline.

use crate::error::{AppError, AppResult};
use crate::recurrence::years_between;
use crate::utils::normalize_phone;
use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;

pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MIN_NAME_LENGTH: usize = 2;
pub const MAX_NAME_LENGTH: usize = 50;
pub const MIN_AGE: i32 = 13;
pub const MAX_AGE: i32 = 120;

lazy_static! {
    static ref EMAIL_RE: Regex =
        Regex::new(r"(?i)^[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,64}$").unwrap();
    static ref PHONE_RE: Regex = Regex::new(r"^\+?[0-9]{10,15}$").unwrap();
}

/// Outcome of a rule check. The reason is meant for display as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Valid,
    Invalid(String),
}

impl Validation {
    fn check(ok: bool, reason: &str) -> Self {
        if ok {
            Validation::Valid
        } else {
            Validation::Invalid(reason.to_string())
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Validation::Valid)
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Validation::Valid => None,
            Validation::Invalid(reason) => Some(reason),
        }
    }

    pub fn into_result(self) -> AppResult<()> {
        match self {
            Validation::Valid => Ok(()),
            Validation::Invalid(reason) => Err(AppError::Validation(reason)),
        }
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email.trim())
}

pub fn validate_email(email: &str) -> Validation {
    if email.trim().is_empty() {
        return Validation::Invalid("Email is required".to_string());
    }
    Validation::check(is_valid_email(email), "Please enter a valid email address")
}

pub fn is_valid_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LENGTH
}

/// Length rule plus at least one uppercase, one lowercase and one digit.
pub fn is_strong_password(password: &str) -> bool {
    is_valid_password(password)
        && password.chars().any(|c| c.is_uppercase())
        && password.chars().any(|c| c.is_lowercase())
        && password.chars().any(|c| c.is_ascii_digit())
}

pub fn validate_password(password: &str, strict: bool) -> Validation {
    if !is_valid_password(password) {
        return Validation::Invalid(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        ));
    }
    Validation::check(
        !strict || is_strong_password(password),
        "Password must contain an uppercase letter, a lowercase letter and a number",
    )
}

/// Accepts an optional leading `+` and 10-15 digits. Spaces, dashes, dots
/// and parentheses are ignored.
pub fn is_valid_phone(phone: &str) -> bool {
    let trimmed = phone.trim();
    if trimmed
        .chars()
        .any(|c| !(c.is_ascii_digit() || "+-.() ".contains(c)))
    {
        return false;
    }
    if trimmed.char_indices().any(|(i, c)| c == '+' && i != 0) {
        return false;
    }
    PHONE_RE.is_match(&normalize_phone(trimmed))
}

pub fn validate_phone(phone: &str) -> Validation {
    Validation::check(
        is_valid_phone(phone),
        "Please enter a valid phone number (10-15 digits)",
    )
}

pub fn is_valid_name(name: &str) -> bool {
    let len = name.trim().chars().count();
    (MIN_NAME_LENGTH..=MAX_NAME_LENGTH).contains(&len)
}

pub fn validate_name(name: &str) -> Validation {
    Validation::check(
        is_valid_name(name),
        "Name must be between 2 and 50 characters",
    )
}

pub fn is_valid_age(birth_date: NaiveDate, reference: NaiveDate) -> bool {
    (MIN_AGE..=MAX_AGE).contains(&years_between(birth_date, reference))
}

pub fn validate_age(birth_date: NaiveDate, reference: NaiveDate) -> Validation {
    let age = years_between(birth_date, reference);
    if age < MIN_AGE {
        Validation::Invalid(format!("You must be at least {} years old", MIN_AGE))
    } else if age > MAX_AGE {
        Validation::Invalid("Please enter a valid birth date".to_string())
    } else {
        Validation::Valid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_email_rules() {
        assert!(is_valid_email("jane.doe+cards@example.co.uk"));
        assert!(is_valid_email("A@X.COM"));
        assert!(!is_valid_email("jane@example"));
        assert!(!is_valid_email("jane@example.c"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("jane example@x.com"));
        assert_eq!(validate_email("").reason(), Some("Email is required"));
    }

    #[test]
    fn test_email_tld_upper_bound() {
        let tld = "a".repeat(64);
        assert!(is_valid_email(&format!("x@y.{}", tld)));
        assert!(!is_valid_email(&format!("x@y.{}a", tld)));
    }

    #[test]
    fn test_password_rules() {
        assert!(validate_password("short", false).reason().unwrap().contains("at least 8"));
        assert!(validate_password("alllowercase", false).is_valid());
        assert!(!validate_password("alllowercase", true).is_valid());
        assert!(validate_password("Mixed1Case", true).is_valid());
        assert!(!is_strong_password("NODIGITSHERE"));
    }

    #[test]
    fn test_phone_rules() {
        assert!(is_valid_phone("+15550109999"));
        assert!(is_valid_phone("(555) 010-9999"));
        assert!(!is_valid_phone("555-0199"));
        assert!(!is_valid_phone("+1234567890123456"));
        assert!(!is_valid_phone("555-010-99ab"));
        assert!(!is_valid_phone("555+0100001"));
        assert!(!is_valid_phone("1+2+3+4567890"));
        assert!(!is_valid_phone("++15550109999"));
        assert!(is_valid_phone("  +1 (555) 010-9999"));
    }

    #[test]
    fn test_name_rules() {
        assert!(is_valid_name("Al"));
        assert!(!is_valid_name(" A "));
        assert!(is_valid_name(&"x".repeat(50)));
        assert!(!is_valid_name(&"x".repeat(51)));
    }

    #[test]
    fn test_age_bounds_inclusive() {
        let today = d(2026, 10, 19);
        assert!(is_valid_age(d(2013, 10, 19), today));
        assert!(!is_valid_age(d(2013, 10, 20), today));
        assert!(is_valid_age(d(1906, 10, 20), today));
        assert!(!is_valid_age(d(1905, 10, 19), today));
        assert_eq!(
            validate_age(d(2020, 1, 1), today).reason(),
            Some("You must be at least 13 years old")
        );
    }

    #[test]
    fn test_into_result_surfaces_reason_verbatim() {
        let err = validate_name("J").into_result().unwrap_err();
        assert_eq!(err.user_message(), "Name must be between 2 and 50 characters");
    }
}
