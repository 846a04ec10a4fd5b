//! Configuration validation

use super::error::ConfigResult;

/// Trait for validatable configuration objects
pub trait Validatable {
    /// Returns `Ok(())` if valid, `Err(ConfigError)` with details if invalid.
    fn validate(&self) -> ConfigResult<()>;

    /// Configuration name for error messages
    fn config_name(&self) -> &'static str {
        "Config"
    }
}

impl<T: Validatable> Validatable for Option<T> {
    fn validate(&self) -> ConfigResult<()> {
        match self {
            Some(config) => config.validate(),
            None => Ok(()),
        }
    }

    fn config_name(&self) -> &'static str {
        match self {
            Some(config) => config.config_name(),
            None => "Config",
        }
    }
}

/// Range check shared by every config struct
pub(crate) fn check_range(
    field: &str,
    value: usize,
    min: usize,
    max: usize,
    hint: &str,
) -> ConfigResult<()> {
    if value < min || value > max {
        return Err(super::error::ConfigError::range_with_hint(
            field, value, min, max, hint,
        ));
    }
    Ok(())
}
