use serde_json::Value;

use crate::limits::*;
use crate::model::Ms;

use super::EngineError;

pub(crate) fn now_ms() -> Ms {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_millis() as Ms
}

/// Parse a loosely-typed integer field. The API accepts both JSON
/// numbers and numeric strings ("12"); anything else, and anything with
/// a fractional part, is a validation error.
fn parse_integer(raw: &Value, what: &str) -> Result<i64, EngineError> {
    match raw {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| EngineError::Validation(format!("{what} must be an integer"))),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| EngineError::Validation(format!("{what} must be an integer"))),
        _ => Err(EngineError::Validation(format!(
            "{what} must be a number or numeric string"
        ))),
    }
}

/// Reservation counts: positive integers only.
pub(crate) fn parse_count(raw: &Value) -> Result<i64, EngineError> {
    let count = parse_integer(raw, "count")?;
    if count <= 0 {
        return Err(EngineError::Validation(
            "count must be a positive integer".into(),
        ));
    }
    Ok(count)
}

/// Item stock totals: zero is a valid count.
pub(crate) fn parse_stock_count(raw: &Value) -> Result<i64, EngineError> {
    let count = parse_integer(raw, "count")?;
    if count < 0 {
        return Err(EngineError::Validation("count must not be negative".into()));
    }
    Ok(count)
}

fn parse_number(raw: &Value, what: &str) -> Result<f64, EngineError> {
    let n = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match n {
        Some(n) if n.is_finite() => Ok(n),
        _ => Err(EngineError::Validation(format!(
            "{what} must be a finite number"
        ))),
    }
}

/// An individual hour claim: strictly positive.
pub(crate) fn parse_hours(raw: &Value) -> Result<f64, EngineError> {
    let hours = parse_number(raw, "hours")?;
    if hours <= 0.0 {
        return Err(EngineError::Validation("hours must be positive".into()));
    }
    Ok(hours)
}

/// An activity's hour ceiling: zero means sign-ups are closed.
pub(crate) fn parse_max_hours(raw: &Value) -> Result<f64, EngineError> {
    let max = parse_number(raw, "maxHours")?;
    if max < 0.0 {
        return Err(EngineError::Validation(
            "maxHours must not be negative".into(),
        ));
    }
    Ok(max)
}

fn check_len(value: &str, what: &str, max: usize) -> Result<(), EngineError> {
    if value.len() > max {
        return Err(EngineError::Validation(format!("{what} too long")));
    }
    Ok(())
}

fn check_nonempty(value: &str, what: &str) -> Result<(), EngineError> {
    if value.trim().is_empty() {
        return Err(EngineError::Validation(format!("{what} must not be empty")));
    }
    Ok(())
}

pub(crate) fn validate_item_name(name: &str) -> Result<(), EngineError> {
    check_nonempty(name, "name")?;
    check_len(name, "name", MAX_NAME_LEN)
}

pub(crate) fn validate_username(username: &str) -> Result<(), EngineError> {
    check_nonempty(username, "username")?;
    check_len(username, "username", MAX_USERNAME_LEN)?;
    if username.chars().any(char::is_whitespace) {
        return Err(EngineError::Validation(
            "username must not contain whitespace".into(),
        ));
    }
    Ok(())
}

pub(crate) fn validate_realname(realname: &str) -> Result<(), EngineError> {
    check_len(realname, "realname", MAX_REALNAME_LEN)
}

pub(crate) fn validate_asm(asm: &str) -> Result<(), EngineError> {
    check_len(asm, "asm", MAX_ASM_LEN)
}

pub(crate) fn validate_title(title: &str) -> Result<(), EngineError> {
    check_nonempty(title, "title")?;
    check_len(title, "title", MAX_TITLE_LEN)
}

pub(crate) fn validate_description(description: &str) -> Result<(), EngineError> {
    check_len(description, "description", MAX_DESCRIPTION_LEN)
}

pub(crate) fn validate_password(password: &str) -> Result<(), EngineError> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(EngineError::Validation("password too short".into()));
    }
    check_len(password, "password", MAX_PASSWORD_LEN)
}

/// Activities run forward in time; a zero-length window is allowed.
pub(crate) fn validate_time_window(start: Ms, end: Ms) -> Result<(), EngineError> {
    if end < start {
        return Err(EngineError::Validation(
            "endTime must not precede startTime".into(),
        ));
    }
    Ok(())
}
