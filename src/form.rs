//! Validation helpers shared by the create and edit forms.

use std::collections::BTreeMap;

use time::{Date, macros::format_description};

use crate::Error;

/// Validation messages for a submitted form, keyed by the field's `name`.
///
/// A form is only persisted when there are no field errors.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    /// Record `error` as the message for `field`, replacing any earlier message.
    pub fn insert(&mut self, field: &'static str, error: &Error) {
        self.0.insert(field, error.to_string());
    }

    /// Keep the value of `result`, or record its error against `field`.
    pub fn check<T>(&mut self, field: &'static str, result: Result<T, Error>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(error) => {
                self.insert(field, &error);
                None
            }
        }
    }

    /// The message for `field`, if it failed validation.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Check that an amount of money is a finite number greater than zero.
pub fn validate_amount(amount: f64) -> Result<f64, Error> {
    if amount.is_finite() && amount > 0.0 {
        Ok(amount)
    } else {
        Err(Error::NonPositiveAmount)
    }
}

/// Parse an amount typed into a form and check it with [validate_amount].
pub fn parse_amount(text: &str) -> Result<f64, Error> {
    text.trim()
        .parse::<f64>()
        .map_err(|_| Error::NonPositiveAmount)
        .and_then(validate_amount)
}

/// Parse a date in the `YYYY-MM-DD` format used by date inputs.
pub fn parse_date(text: &str) -> Result<Date, Error> {
    Date::parse(text.trim(), format_description!("[year]-[month]-[day]"))
        .map_err(|_| Error::InvalidDate)
}

/// Check that `date` is not after `today`.
pub fn validate_date(date: Date, today: Date) -> Result<Date, Error> {
    if date > today {
        Err(Error::FutureDate(date))
    } else {
        Ok(date)
    }
}

#[cfg(test)]
mod field_errors_tests {
    use time::macros::date;

    use crate::Error;

    use super::{FieldErrors, parse_amount, parse_date, validate_amount, validate_date};

    #[test]
    fn check_keeps_ok_values() {
        let mut errors = FieldErrors::default();

        let value = errors.check("amount", validate_amount(4.5));

        assert_eq!(value, Some(4.5));
        assert!(errors.is_empty());
    }

    #[test]
    fn check_records_error_message() {
        let mut errors = FieldErrors::default();

        let value = errors.check("amount", validate_amount(0.0));

        assert_eq!(value, None);
        assert_eq!(errors.get("amount"), Some("Amount must be greater than 0"));
        assert_eq!(errors.get("date"), None);
    }

    #[test]
    fn amount_must_be_positive_and_finite() {
        assert_eq!(validate_amount(0.01), Ok(0.01));
        assert_eq!(validate_amount(-1.0), Err(Error::NonPositiveAmount));
        assert_eq!(validate_amount(f64::NAN), Err(Error::NonPositiveAmount));
        assert_eq!(validate_amount(f64::INFINITY), Err(Error::NonPositiveAmount));
    }

    #[test]
    fn date_may_be_today_but_not_tomorrow() {
        let today = date!(2024 - 03 - 01);

        assert_eq!(validate_date(today, today), Ok(today));
        assert_eq!(
            validate_date(date!(2024 - 03 - 02), today),
            Err(Error::FutureDate(date!(2024 - 03 - 02)))
        );
    }

    #[test]
    fn parse_amount_rejects_text_and_non_positive_numbers() {
        assert_eq!(parse_amount(" 4.50 "), Ok(4.5));
        assert_eq!(parse_amount("four"), Err(Error::NonPositiveAmount));
        assert_eq!(parse_amount("-2"), Err(Error::NonPositiveAmount));
        assert_eq!(parse_amount(""), Err(Error::NonPositiveAmount));
    }

    #[test]
    fn parse_date_reads_date_input_format() {
        assert_eq!(parse_date("2024-03-01"), Ok(date!(2024 - 03 - 01)));
        assert_eq!(parse_date("01/03/2024"), Err(Error::InvalidDate));
        assert_eq!(parse_date(""), Err(Error::InvalidDate));
    }
}
