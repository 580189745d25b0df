//! Input validation shared by all request types.
//!
//! Requests are deserialized into loosely typed structs (mostly `Option<String>`)
//! and then checked field by field. Every problem is collected into a
//! [`Violations`] list so the client sees all rejected fields at once instead
//! of fixing them one round trip at a time.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::{
    error::{AppError, FieldError},
    models::ObjectId,
};

/// Maximum length of free-text notes and descriptions.
pub const MAX_NOTE_LEN: usize = 500;

/// Collects per-field validation failures.
#[derive(Debug, Default)]
pub struct Violations(Vec<FieldError>);

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldError::new(path, message));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Return `value` if nothing was rejected, otherwise a validation error
    /// listing every rejected field.
    pub fn finish<T>(self, value: T) -> Result<T, AppError> {
        if self.0.is_empty() {
            Ok(value)
        } else {
            Err(AppError::Validation(self.0))
        }
    }

    /// The collected failures as an error. Callers use this when a required
    /// value is missing, which always records a violation first.
    pub fn into_error(self) -> AppError {
        AppError::Validation(self.0)
    }

    /// Parse an optional identifier.
    pub fn object_id(&mut self, path: &str, value: Option<&str>) -> Option<ObjectId> {
        let value = value?;
        match value.trim().parse() {
            Ok(id) => Some(id),
            Err(e) => {
                self.push(path, e.to_string());
                None
            }
        }
    }

    /// Parse an optional date string, see [`parse_date`].
    pub fn date(&mut self, path: &str, value: Option<&str>) -> Option<DateTime<Utc>> {
        let value = value?;
        match parse_date(value) {
            Some(date) => Some(date),
            None => {
                self.push(path, "Invalid date");
                None
            }
        }
    }

    /// Require a non-blank string, returning it trimmed.
    pub fn required_text(&mut self, path: &str, value: Option<String>) -> Option<String> {
        match value {
            None => {
                self.push(path, "Required");
                None
            }
            Some(text) => self.non_empty_text(path, text),
        }
    }

    /// Check a string that was supplied is not blank, returning it trimmed.
    pub fn non_empty_text(&mut self, path: &str, value: String) -> Option<String> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            self.push(path, "Must not be empty");
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    /// Check an optional free-text field against [`MAX_NOTE_LEN`].
    pub fn note(&mut self, path: &str, value: Option<String>) -> Option<String> {
        let value = value?;
        if value.chars().count() > MAX_NOTE_LEN {
            self.push(path, format!("Must be at most {MAX_NOTE_LEN} characters"));
            return None;
        }
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }

    /// Require a finite, non-negative number.
    pub fn non_negative(&mut self, path: &str, value: Option<f64>) -> Option<f64> {
        let value = value?;
        if value.is_finite() && value >= 0.0 {
            Some(value)
        } else {
            self.push(path, "Must be a non-negative number");
            None
        }
    }

    /// Check a three-letter currency code, returning it uppercased.
    pub fn currency(&mut self, path: &str, value: Option<String>) -> Option<String> {
        let value = value?;
        let code = value.trim();
        if code.len() == 3 && code.bytes().all(|b| b.is_ascii_alphabetic()) {
            Some(code.to_ascii_uppercase())
        } else {
            self.push(path, "Must be a 3-letter currency code");
            None
        }
    }

    /// Check an absolute URL.
    pub fn url(&mut self, path: &str, value: Option<String>) -> Option<String> {
        let value = value?;
        let trimmed = value.trim();
        match url::Url::parse(trimmed) {
            Ok(_) => Some(trimmed.to_string()),
            Err(e) => {
                self.push(path, format!("Invalid URL: {e}"));
                None
            }
        }
    }

    /// Check each tag is non-empty; returns the trimmed tags in their original order.
    pub fn tags(&mut self, path: &str, value: Option<Vec<String>>) -> Option<Vec<String>> {
        let tags = value?;
        let mut cleaned = Vec::with_capacity(tags.len());
        for (index, tag) in tags.into_iter().enumerate() {
            if tag.is_empty() {
                self.push(format!("{path}.{index}"), "Must not be empty");
                continue;
            }
            let trimmed = tag.trim();
            if !trimmed.is_empty() {
                cleaned.push(trimmed.to_string());
            }
        }
        Some(cleaned)
    }
}

/// Parse a date string.
///
/// Accepted forms:
/// - RFC 3339 (`2024-03-01T12:30:00Z`, `2024-03-01T12:30:00+02:00`)
/// - naive date-time, read as UTC (`2024-03-01T12:30:00`)
/// - calendar date, read as midnight UTC (`2024-03-01`)
pub fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(value) {
        return Some(date.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(date) = NaiveDateTime::parse_from_str(value, format) {
            return Some(date.and_utc());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|date| date.and_utc())
}

/// Split a comma-separated query value into trimmed, non-empty items.
pub fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .map(|value| {
            value
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Parse an optional `true`/`false` query flag.
pub fn parse_flag(violations: &mut Violations, path: &str, value: Option<&str>) -> Option<bool> {
    match value?.trim() {
        "true" => Some(true),
        "false" => Some(false),
        _ => {
            violations.push(path, "Must be 'true' or 'false'");
            None
        }
    }
}

/// Parse a path identifier, rejecting anything that is not 24 hex characters.
pub fn path_id(value: &str) -> Result<ObjectId, AppError> {
    value
        .parse()
        .map_err(|e: crate::models::InvalidObjectId| AppError::invalid_field("id", e.to_string()))
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::invalid_field("body", rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::invalid_field("query", rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn parse_date_accepts_supported_forms() {
        let midnight = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let afternoon = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();

        assert_eq!(parse_date("2024-03-01"), Some(midnight));
        assert_eq!(parse_date("2024-03-01T12:30:00"), Some(afternoon));
        assert_eq!(parse_date("2024-03-01T12:30:00Z"), Some(afternoon));
        assert_eq!(parse_date("2024-03-01T14:30:00+02:00"), Some(afternoon));
    }

    #[test]
    fn parse_date_rejects_garbage() {
        for bad in ["", "yesterday", "2024-13-01", "01/03/2024"] {
            assert_eq!(parse_date(bad), None, "{bad:?}");
        }
    }

    #[test]
    fn split_list_drops_blank_items() {
        assert_eq!(
            split_list(Some(" Food, ,Transport,,")),
            vec!["Food".to_string(), "Transport".to_string()]
        );
        assert!(split_list(None).is_empty());
    }

    #[test]
    fn violations_collect_every_field() {
        let mut violations = Violations::new();

        let name = violations.required_text("name", Some("   ".to_string()));
        let amount = violations.non_negative("amount", Some(-1.0));
        let currency = violations.currency("currency", Some("usd".to_string()));
        let wallet = violations.object_id("walletId", Some("nope"));

        assert_eq!(name, None);
        assert_eq!(amount, None);
        assert_eq!(currency.as_deref(), Some("USD"));
        assert_eq!(wallet, None);

        let Err(AppError::Validation(details)) = violations.finish(()) else {
            panic!("expected a validation error");
        };
        let paths: Vec<&str> = details.iter().map(|d| d.path.as_str()).collect();
        assert_eq!(paths, vec!["name", "amount", "walletId"]);
    }

    #[test]
    fn tags_are_trimmed_and_empty_tags_rejected() {
        let mut violations = Violations::new();

        let tags = violations.tags(
            "tags",
            Some(vec![" urgent ".to_string(), "".to_string(), "work".to_string()]),
        );

        assert_eq!(tags, Some(vec!["urgent".to_string(), "work".to_string()]));
        let Err(AppError::Validation(details)) = violations.finish(()) else {
            panic!("expected a validation error");
        };
        assert_eq!(details, vec![FieldError::new("tags.1", "Must not be empty")]);
    }

    #[test]
    fn non_negative_rejects_nan() {
        let mut violations = Violations::new();

        assert_eq!(violations.non_negative("amount", Some(f64::NAN)), None);
        assert_eq!(violations.non_negative("amount", Some(0.0)), Some(0.0));
        assert!(!violations.is_empty());
    }
}
