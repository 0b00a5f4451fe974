/// Email and password rules
///
/// Each rule is a check plus a human-readable tip. A failing value reports
/// the tip of every rule it breaks, prefixed by the field name.

use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use validator::{ValidationError, ValidationErrors};

pub const EMAIL_MIN_LENGTH: usize = 6;
pub const EMAIL_MAX_LENGTH: usize = 254;
pub const PASSWORD_MIN_LENGTH: usize = 8;
pub const PASSWORD_MAX_LENGTH: usize = 254;

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid regex"));

static EMAIL_LOCAL_PART: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^\s@]+@").expect("valid regex"));
static EMAIL_DOMAIN: Lazy<Regex> = Lazy::new(|| Regex::new(r"@[^.\s@]+\.").expect("valid regex"));
static EMAIL_TLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.[a-zA-Z]{2,}$").expect("valid regex"));

static PASSWORD_LETTER: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z]").expect("valid regex"));
static PASSWORD_DIGIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d").expect("valid regex"));
static PASSWORD_CHARSET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z\d@#%^$_!*?)(&]+$").expect("valid regex"));

/// Tips for every email rule `email` breaks
pub fn email_violations(email: &str) -> Vec<Cow<'static, str>> {
    let mut tips: Vec<Cow<'static, str>> = Vec::new();

    if !EMAIL_LOCAL_PART.is_match(email) {
        tips.push("should contain characters before the '@' symbol".into());
    }
    if !EMAIL_DOMAIN.is_match(email) {
        tips.push("should contain a domain name after the '@' symbol and a '.'".into());
    }
    if !EMAIL_TLD.is_match(email) {
        tips.push("should end with a valid top-level domain (TLD) after a '.'".into());
    }

    let length = email.chars().count();
    if length < EMAIL_MIN_LENGTH {
        tips.push(format!("should have a minimum length of {} characters", EMAIL_MIN_LENGTH).into());
    }
    if length > EMAIL_MAX_LENGTH {
        tips.push(format!("should have a maximum length of {} characters", EMAIL_MAX_LENGTH).into());
    }

    if tips.is_empty() && !EMAIL_PATTERN.is_match(email) {
        tips.push("should be valid email".into());
    }

    tips
}

/// Tips for every password rule `password` breaks
pub fn password_violations(password: &str) -> Vec<Cow<'static, str>> {
    let mut tips: Vec<Cow<'static, str>> = Vec::new();

    let length = password.chars().count();
    if length < PASSWORD_MIN_LENGTH {
        tips.push(format!("should have a minimum length of {} characters", PASSWORD_MIN_LENGTH).into());
    }
    if length > PASSWORD_MAX_LENGTH {
        tips.push(format!("should have a maximum length of {} characters", PASSWORD_MAX_LENGTH).into());
    }
    if !PASSWORD_LETTER.is_match(password) {
        tips.push("should contain at least one letter (either uppercase or lowercase)".into());
    }
    if !PASSWORD_DIGIT.is_match(password) {
        tips.push("should contain at least one digit".into());
    }
    if !PASSWORD_CHARSET.is_match(password) {
        tips.push("may include special characters like @, #, %, ^, $, _, !, *, ?, ), (, and &".into());
    }

    tips
}

/// Records each tip as a `validator` error on `field`
pub fn add_tips(errors: &mut ValidationErrors, field: &'static str, code: &'static str, tips: Vec<Cow<'static, str>>) {
    for tip in tips {
        let mut error = ValidationError::new(code);
        error.message = Some(format!("'{}' {}", field, tip).into());
        errors.add(field, error);
    }
}
