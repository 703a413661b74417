// ============================================================
// VALIDATION CONFIGURATION
// ============================================================
// Limits applied by the row validator

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Configuration for row validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
#[validate(schema(function = "validate_phone_bounds"))]
pub struct ValidationConfig {
    /// Maximum email length after trimming (default: 100)
    #[validate(range(min = 6, max = 320))]
    pub email_max_length: usize,

    /// Earliest accepted birth date, inclusive (default: 1900-01-01)
    pub min_birth_date: NaiveDate,

    /// Minimum phone digit count, area code included (default: 10)
    #[validate(range(min = 1, max = 20))]
    pub phone_min_digits: usize,

    /// Maximum phone digit count, area code included (default: 11)
    #[validate(range(min = 1, max = 20))]
    pub phone_max_digits: usize,

    /// Spreadsheet line of the first data row; line 1 is the header (default: 2)
    #[validate(range(min = 1))]
    pub first_data_line: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            email_max_length: 100,
            min_birth_date: NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or(NaiveDate::MIN),
            phone_min_digits: 10,
            phone_max_digits: 11,
            first_data_line: 2,
        }
    }
}

fn validate_phone_bounds(config: &ValidationConfig) -> Result<(), ValidationError> {
    if config.phone_min_digits > config.phone_max_digits {
        return Err(ValidationError::new("phone_min_digits must be <= phone_max_digits"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ValidationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.email_max_length, 100);
        assert_eq!(config.min_birth_date.to_string(), "1900-01-01");
    }

    #[test]
    fn test_inverted_phone_bounds_rejected() {
        let config = ValidationConfig {
            phone_min_digits: 12,
            phone_max_digits: 11,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
