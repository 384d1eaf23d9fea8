//! Field checks shared by the create/update services.

use chrono::{Datelike, NaiveDate, Utc};

use crate::error::{AppError, AppResult};
use crate::services::scoring::MAX_SCORE;

/// Column widths from the relational schema, in characters.
pub const MAX_NAME_CHARS: usize = 255;
pub const MAX_LABEL_CHARS: usize = 128;
pub const MAX_URL_CHARS: usize = 512;
pub const MAX_EMAIL_CHARS: usize = 255;
pub const MAX_USERNAME_CHARS: usize = 64;
pub const MAX_SHORT_CHARS: usize = 64;
pub const MAX_PERIOD_CHARS: usize = 32;

/// 400 when `value` is longer than the column holding it.
pub fn max_chars(field: &str, value: &str, max: usize) -> AppResult<()> {
    if value.chars().count() > max {
        return Err(AppError::BadRequest(format!(
            "{field} cannot be longer than {max} characters"
        )));
    }
    Ok(())
}

/// `max_chars` for optional columns.
pub fn max_chars_opt(field: &str, value: Option<&str>, max: usize) -> AppResult<()> {
    value.map_or(Ok(()), |v| max_chars(field, v, max))
}

/// Trimmed value, or 400 when blank.
pub fn non_empty(field: &str, value: &str) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

/// Lowercased address; only the presence of a local part and a domain is checked.
pub fn email(value: &str) -> AppResult<String> {
    let value = value.trim().to_lowercase();
    match value.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(value),
        _ => Err(AppError::BadRequest(format!(
            "'{value}' is not a valid email address"
        ))),
    }
}

pub fn website(value: &str) -> AppResult<String> {
    let value = value.trim();
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(value.to_string())
    } else {
        Err(AppError::BadRequest(
            "website must start with http:// or https://".to_string(),
        ))
    }
}

pub fn sdg_goals(goals: &[i32]) -> AppResult<Vec<i32>> {
    if let Some(bad) = goals.iter().find(|g| !(1..=17).contains(*g)) {
        return Err(AppError::BadRequest(format!(
            "SDG {bad} does not exist; goals run from 1 to 17"
        )));
    }
    let mut goals = goals.to_vec();
    goals.sort_unstable();
    goals.dedup();
    Ok(goals)
}

pub fn founded_year(year: i32) -> AppResult<i32> {
    let current = Utc::now().year();
    if year > current {
        return Err(AppError::BadRequest(format!(
            "foundedYear {year} is in the future"
        )));
    }
    Ok(year)
}

pub fn sub_score(field: &str, value: i32) -> AppResult<i32> {
    if !(0..=MAX_SCORE).contains(&value) {
        return Err(AppError::BadRequest(format!(
            "{field} must be between 0 and {MAX_SCORE}"
        )));
    }
    Ok(value)
}

pub fn date_range(start: Option<NaiveDate>, end: Option<NaiveDate>) -> AppResult<()> {
    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            return Err(AppError::BadRequest(
                "endDate cannot be before startDate".to_string(),
            ));
        }
    }
    Ok(())
}

pub fn finite(field: &str, value: f64) -> AppResult<f64> {
    if !value.is_finite() {
        return Err(AppError::BadRequest(format!(
            "{field} must be a finite number"
        )));
    }
    Ok(value)
}

pub fn non_negative(field: &str, value: i64) -> AppResult<i64> {
    if value < 0 {
        return Err(AppError::BadRequest(format!("{field} cannot be negative")));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails_are_normalized() {
        assert_eq!(email("  Ada@Example.ORG ").unwrap(), "ada@example.org");
        assert!(email("no-at-sign").is_err());
        assert!(email("@example.org").is_err());
        assert!(email("ada@").is_err());
    }

    #[test]
    fn sdg_goals_are_range_checked_and_deduplicated() {
        assert_eq!(sdg_goals(&[13, 4, 4]).unwrap(), vec![4, 13]);
        assert!(sdg_goals(&[0]).is_err());
        assert!(sdg_goals(&[18]).is_err());
    }

    #[test]
    fn websites_need_a_scheme() {
        assert!(website("https://example.org").is_ok());
        assert!(website("example.org").is_err());
    }

    #[test]
    fn lengths_are_counted_in_characters() {
        assert!(max_chars("name", &"é".repeat(255), MAX_NAME_CHARS).is_ok());
        let err = max_chars("name", &"a".repeat(256), MAX_NAME_CHARS).unwrap_err();
        assert_eq!(err.to_string(), "name cannot be longer than 255 characters");
        assert!(max_chars_opt("country", None, MAX_LABEL_CHARS).is_ok());
    }

    #[test]
    fn end_dates_cannot_precede_start_dates() {
        let start = NaiveDate::from_ymd_opt(2020, 5, 1);
        let end = NaiveDate::from_ymd_opt(2019, 1, 1);
        assert!(date_range(start, end).is_err());
        assert!(date_range(end, start).is_ok());
        assert!(date_range(start, None).is_ok());
    }

    #[test]
    fn non_finite_numbers_are_rejected() {
        assert_eq!(finite("value", 2.5).unwrap(), 2.5);
        assert!(finite("value", f64::NAN).is_err());
        assert!(finite("target", f64::INFINITY).is_err());
    }

    #[test]
    fn blank_text_is_rejected() {
        assert_eq!(non_empty("name", "  Kiva ").unwrap(), "Kiva");
        assert!(matches!(non_empty("name", "   "), Err(AppError::BadRequest(_))));
    }
}
