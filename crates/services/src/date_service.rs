//! Conversion of date-input values into display dates.

use chrono::NaiveDate;
use domains::{AppError, Result, DATE_INPUT_FORMAT};

/// Display format: `Mon, 25 Sep 2023`.
pub const DISPLAY_DATE_FORMAT: &str = "%a, %d %b %Y";

/// Converts a `yyyy-mm-dd` value into a locale-stable display string.
pub fn input_date_to_display(date: &str) -> Result<String> {
    let parsed = NaiveDate::parse_from_str(date, DATE_INPUT_FORMAT)
        .map_err(|e| AppError::ValidationError(format!("cannot format date {date:?}: {e}")))?;
    Ok(parsed.format(DISPLAY_DATE_FORMAT).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formats_input_date() {
        assert_eq!(input_date_to_display("2023-09-25").unwrap(), "Mon, 25 Sep 2023");
        assert_eq!(input_date_to_display("2024-02-05").unwrap(), "Mon, 05 Feb 2024");
    }

    #[test]
    fn test_rejects_malformed_dates() {
        assert!(input_date_to_display("").is_err());
        assert!(input_date_to_display("2023-13-01").is_err());
        assert!(input_date_to_display("25/09/2023").is_err());
    }
}
