//! Field checks for request bodies.
//!
//! Each check fails with a `BadRequest` whose message names the field in
//! quotes, e.g. `"name" is required`.

use crate::error::{AppError, Res};

fn invalid(field: &str, rule: &str) -> AppError {
    AppError::BadRequest(format!("\"{field}\" {rule}"))
}

pub fn required<T>(field: &str, value: Option<T>) -> Res<T> {
    value.ok_or_else(|| invalid(field, "is required"))
}

/// Length in characters, inclusive bounds. Empty strings are rejected
/// regardless of `min`.
pub fn check_length(field: &str, value: &str, min: usize, max: usize) -> Res<()> {
    let len = value.chars().count();
    if len == 0 {
        return Err(invalid(field, "is not allowed to be empty"));
    }
    if len < min {
        return Err(invalid(
            field,
            &format!("length must be at least {min} characters long"),
        ));
    }
    if len > max {
        return Err(invalid(
            field,
            &format!("length must be less than or equal to {max} characters long"),
        ));
    }
    Ok(())
}

pub fn check_email(field: &str, value: &str) -> Res<()> {
    if value.is_empty() {
        return Err(invalid(field, "is not allowed to be empty"));
    }
    if is_email(value) {
        Ok(())
    } else {
        Err(invalid(field, "must be a valid email"))
    }
}

pub fn check_digits(field: &str, value: &str, count: usize) -> Res<()> {
    if value.len() == count && value.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(invalid(field, &format!("must be {count} digits")))
    }
}

pub fn check_min(field: &str, value: f64, min: f64) -> Res<()> {
    if value.is_finite() && value >= min {
        Ok(())
    } else {
        Err(invalid(
            field,
            &format!("must be greater than or equal to {min}"),
        ))
    }
}

pub fn one_of(field: &str, allowed: &[&str]) -> AppError {
    invalid(field, &format!("must be one of [{}]", allowed.join(", ")))
}

fn is_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2
        && labels.iter().all(|label| {
            !label.is_empty()
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_alphanumeric() || c == '-')
        })
        && labels.last().is_some_and(|tld| tld.len() >= 2)
}
