//! Form validation run before any mutation is dispatched.

use std::fmt;

use hoarding_core::Email;
use rust_decimal::Decimal;

/// A problem with one form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Every field problem found in a form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    pub fields: Vec<FieldError>,
}

impl ValidationErrors {
    /// A single-field failure.
    #[must_use]
    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            fields: vec![FieldError {
                field,
                message: message.into(),
            }],
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Message for `field`, if it failed.
    #[must_use]
    pub fn message_for(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|error| error.field == field)
            .map(|error| error.message.as_str())
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for error in &self.fields {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", error.field, error.message)?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Collects field errors, then succeeds only if none were found.
///
/// ```
/// use hoarding_client::forms::Validator;
///
/// let errors = Validator::new()
///     .required("clientName", "")
///     .required("hoardingId", "h1")
///     .finish()
///     .unwrap_err();
/// assert_eq!(errors.message_for("clientName"), Some("is required"));
/// assert_eq!(errors.message_for("hoardingId"), None);
/// ```
#[derive(Debug, Default)]
#[must_use]
pub struct Validator {
    errors: ValidationErrors,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(mut self, field: &'static str, message: impl Into<String>) -> Self {
        self.errors.fields.push(FieldError {
            field,
            message: message.into(),
        });
        self
    }

    /// Non-blank text.
    pub fn required(self, field: &'static str, value: &str) -> Self {
        if value.trim().is_empty() {
            self.push(field, "is required")
        } else {
            self
        }
    }

    /// A value that must be present.
    pub fn present<T>(self, field: &'static str, value: Option<&T>) -> Self {
        if value.is_none() {
            self.push(field, "is required")
        } else {
            self
        }
    }

    /// A well-formed email address.
    pub fn email(self, field: &'static str, value: &str) -> Self {
        match Email::parse(value) {
            Ok(_) => self,
            Err(error) => self.push(field, error.to_string()),
        }
    }

    /// An amount strictly greater than zero.
    pub fn positive(self, field: &'static str, value: Option<Decimal>) -> Self {
        match value {
            None => self.push(field, "is required"),
            Some(amount) if amount <= Decimal::ZERO => self.push(field, "must be greater than zero"),
            Some(_) => self,
        }
    }

    /// A number within `min..=max`.
    pub fn within(self, field: &'static str, value: f64, min: f64, max: f64) -> Self {
        if value.is_finite() && (min..=max).contains(&value) {
            self
        } else {
            self.push(field, format!("must be between {min} and {max}"))
        }
    }

    /// A `YYYY-MM-DD` date.
    pub fn date(self, field: &'static str, value: &str) -> Self {
        if value.trim().is_empty() {
            self.push(field, "is required")
        } else if chrono::NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").is_err() {
            self.push(field, "must be a date (YYYY-MM-DD)")
        } else {
            self
        }
    }

    /// `start` on or before `end`. Skipped when either fails to parse, since
    /// [`Validator::date`] reports those.
    pub fn date_order(self, field: &'static str, start: &str, end: &str) -> Self {
        let parse = |s: &str| chrono::NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok();
        match (parse(start), parse(end)) {
            (Some(start), Some(end)) if end < start => {
                self.push(field, "must not be before the start date")
            }
            _ => self,
        }
    }

    /// Custom condition.
    pub fn check(self, field: &'static str, ok: bool, message: &str) -> Self {
        if ok { self } else { self.push(field, message) }
    }

    /// # Errors
    ///
    /// Returns every collected field error.
    pub fn finish(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}
