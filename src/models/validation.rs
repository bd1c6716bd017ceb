//! Custom field checks used by the `Validate` derives on request payloads

use std::borrow::Cow;

use chrono::{Datelike, Utc};
use validator::ValidationError;

/// Current calendar year (UTC)
pub fn current_year() -> i32 {
    Utc::now().year()
}

pub fn field_error(code: &'static str, message: impl Into<Cow<'static, str>>) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    error
}

/// Rejects empty and whitespace-only strings
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("not_blank"));
    }
    Ok(())
}

/// Inclusive range check on a year field
pub fn year_between(value: i32, min: i32, max: i32) -> Result<(), ValidationError> {
    if value < min {
        Err(field_error("range", format!("must be greater than or equal to {}", min)))
    } else if value > max {
        Err(field_error("range", format!("must be less than or equal to {}", max)))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn year_bounds_are_inclusive() {
        assert!(year_between(0, 0, 2000).is_ok());
        assert!(year_between(2000, 0, 2000).is_ok());

        let low = year_between(-1, 0, 2000).unwrap_err();
        assert_eq!(low.code, "range");
        assert_eq!(low.message.as_deref(), Some("must be greater than or equal to 0"));

        let high = year_between(2001, 0, 2000).unwrap_err();
        assert_eq!(high.message.as_deref(), Some("must be less than or equal to 2000"));
    }

    #[test]
    fn blank_means_whitespace_only() {
        assert!(not_blank("  \t").is_err());
        assert!(not_blank("").is_err());
        assert!(not_blank(" Peru ").is_ok());
    }
}
