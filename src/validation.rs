use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};

/// The only fields a user-facing request body may carry.
pub const ALLOWED_FIELDS: &[&str] = &["name", "age", "email", "password"];

lazy_static! {
    static ref EMAIL_RE: Regex =
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap();
    static ref EMAIL_LOOSE_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
}

pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Strict name rule: non-empty after trimming and no digit characters.
pub fn valid_name(name: &str) -> bool {
    let trimmed = name.trim();
    !trimmed.is_empty() && !trimmed.chars().any(|c| c.is_ascii_digit())
}

/// Age may arrive as a JSON number or a numeric string; it must convert to a
/// whole number between 1 and 100.
pub fn parse_age(value: &Value) -> Option<i64> {
    let n = match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => i,
            None => {
                let f = n.as_f64()?;
                if f.fract() != 0.0 {
                    return None;
                }
                f as i64
            }
        },
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    (1..=100).contains(&n).then_some(n)
}

pub fn valid_email(email: &str) -> bool {
    let value = normalize_email(email);
    !value.is_empty() && EMAIL_RE.is_match(&value)
}

/// Permissive pattern used by the availability-check endpoint only; the
/// registration path validates with [`valid_email`].
pub fn valid_email_loose(email: &str) -> bool {
    EMAIL_LOOSE_RE.is_match(email)
}

/// At least 8 characters after trimming, with one lowercase, one uppercase
/// and one character that is not a letter or digit (underscore counts).
pub fn valid_password(password: &str) -> bool {
    let value = password.trim();
    value.chars().count() >= 8
        && value.chars().any(|c| c.is_ascii_lowercase())
        && value.chars().any(|c| c.is_ascii_uppercase())
        && value.chars().any(|c| !c.is_ascii_alphanumeric())
}

/// Allow-list filter over a raw request body. Returns the offending keys when
/// anything outside [`ALLOWED_FIELDS`] is present.
pub fn sanitize_body(body: &Map<String, Value>) -> Result<(), Vec<String>> {
    let extras: Vec<String> = body
        .keys()
        .filter(|key| !ALLOWED_FIELDS.contains(&key.as_str()))
        .cloned()
        .collect();
    if extras.is_empty() {
        Ok(())
    } else {
        Err(extras)
    }
}
