// ============================================================
// BIRTH DATE PARSING
// ============================================================
// Recognizes the three shapes spreadsheets hand us:
//   - serial number (days since 1899-12-30)
//   - M/D/YY   (two-digit year, US order, year 20YY)
//   - D/M/YYYY (four-digit year, Brazilian order)
// D/M/YY is deliberately not recognized: a two-digit year always
// means US order.

use chrono::{Duration, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

static US_SHORT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{2})$").unwrap());

static BR_LONG_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{4})$").unwrap());

static ISO_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})-(\d{2})-(\d{2})$").unwrap());

// Serials beyond this are far outside any calendar we care about.
const MAX_SERIAL_DAYS: f64 = 2_958_465.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateParseError {
    /// None of the accepted shapes matched
    Unrecognized,
    /// A shape matched but the parts do not name a real day
    InvalidDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateBoundsError {
    TooOld,
    InFuture,
}

pub fn serial_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1899, 12, 30).unwrap_or(NaiveDate::MIN)
}

/// Convert a spreadsheet serial number; the fractional (time) part is dropped.
pub fn from_serial(value: f64) -> Option<NaiveDate> {
    if !value.is_finite() || value.abs() > MAX_SERIAL_DAYS {
        return None;
    }
    serial_epoch().checked_add_signed(Duration::days(value.floor() as i64))
}

/// Parse a raw birth date cell.
pub fn parse_birth_date(raw: &str) -> Result<NaiveDate, DateParseError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(DateParseError::Unrecognized);
    }

    if let Ok(serial) = value.parse::<f64>() {
        if serial.is_finite() {
            return from_serial(serial).ok_or(DateParseError::InvalidDate);
        }
    }

    if let Some(caps) = US_SHORT_PATTERN.captures(value) {
        let month = parse_part(&caps[1])?;
        let day = parse_part(&caps[2])?;
        let year = 2000 + parse_part(&caps[3])? as i32;
        return ymd(year, month, day);
    }

    if let Some(caps) = BR_LONG_PATTERN.captures(value) {
        let day = parse_part(&caps[1])?;
        let month = parse_part(&caps[2])?;
        let year = parse_part(&caps[3])? as i32;
        return ymd(year, month, day);
    }

    Err(DateParseError::Unrecognized)
}

/// Parse an already-normalized `YYYY-MM-DD` date.
pub fn parse_iso(value: &str) -> Result<NaiveDate, DateParseError> {
    let caps = ISO_PATTERN
        .captures(value.trim())
        .ok_or(DateParseError::Unrecognized)?;
    ymd(
        parse_part(&caps[1])? as i32,
        parse_part(&caps[2])?,
        parse_part(&caps[3])?,
    )
}

/// Inclusive `[min, today]` check.
pub fn check_bounds(
    date: NaiveDate,
    min: NaiveDate,
    today: NaiveDate,
) -> Result<(), DateBoundsError> {
    if date < min {
        Err(DateBoundsError::TooOld)
    } else if date > today {
        Err(DateBoundsError::InFuture)
    } else {
        Ok(())
    }
}

pub fn to_iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn parse_part(digits: &str) -> Result<u32, DateParseError> {
    digits.parse::<u32>().map_err(|_| DateParseError::Unrecognized)
}

fn ymd(year: i32, month: u32, day: u32) -> Result<NaiveDate, DateParseError> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or(DateParseError::InvalidDate)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_serial_45000() {
        let parsed = parse_birth_date("45000").unwrap();
        assert_eq!(parsed, date(2023, 3, 15));
        assert_eq!(to_iso(parsed), "2023-03-15");
        // normalizing again is stable
        assert_eq!(parse_iso(&to_iso(parsed)).unwrap(), parsed);
    }

    #[test]
    fn test_serial_fraction_is_truncated() {
        assert_eq!(parse_birth_date("45000.75").unwrap(), date(2023, 3, 15));
        assert_eq!(from_serial(1.0), Some(date(1899, 12, 31)));
        assert_eq!(from_serial(2.0), Some(date(1900, 1, 1)));
    }

    #[test]
    fn test_us_short_form() {
        assert_eq!(parse_birth_date("3/15/05").unwrap(), date(2005, 3, 15));
        assert_eq!(parse_birth_date("03/04/05").unwrap(), date(2005, 3, 4));
        assert_eq!(parse_birth_date("13/01/05"), Err(DateParseError::InvalidDate));
    }

    #[test]
    fn test_br_long_form() {
        assert_eq!(parse_birth_date("15/03/1999").unwrap(), date(1999, 3, 15));
        assert_eq!(parse_birth_date(" 1/2/2001 ").unwrap(), date(2001, 2, 1));
        assert_eq!(parse_birth_date("30/02/2001"), Err(DateParseError::InvalidDate));
    }

    #[test]
    fn test_unrecognized_shapes() {
        assert_eq!(parse_birth_date("1999-03-15"), Err(DateParseError::Unrecognized));
        assert_eq!(parse_birth_date("15.03.1999"), Err(DateParseError::Unrecognized));
        assert_eq!(parse_birth_date("15/03/199"), Err(DateParseError::Unrecognized));
        assert_eq!(parse_birth_date("yesterday"), Err(DateParseError::Unrecognized));
        assert_eq!(parse_birth_date("NaN"), Err(DateParseError::Unrecognized));
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let min = date(1900, 1, 1);
        let today = date(2024, 6, 1);
        assert_eq!(check_bounds(min, min, today), Ok(()));
        assert_eq!(check_bounds(today, min, today), Ok(()));
        assert_eq!(
            check_bounds(date(1899, 12, 31), min, today),
            Err(DateBoundsError::TooOld)
        );
        assert_eq!(
            check_bounds(date(2024, 6, 2), min, today),
            Err(DateBoundsError::InFuture)
        );
    }
}
