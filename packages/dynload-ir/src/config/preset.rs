//! Preset configurations
//!
//! Presets trade search breadth for speed on large class sets.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::error::ConfigError;

/// Configuration preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// Single-class resolution only
    ///
    /// - No caller backtracking, no outer-class threading
    /// - Small solver limits
    Fast,

    /// Full escalation with moderate bounds
    #[default]
    Balanced,

    /// Full escalation with deep backtracking
    Thorough,
}

impl Preset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::Balanced => "balanced",
            Self::Thorough => "thorough",
        }
    }
}

impl FromStr for Preset {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fast" => Ok(Self::Fast),
            "balanced" => Ok(Self::Balanced),
            "thorough" => Ok(Self::Thorough),
            _ => Err(ConfigError::UnknownPreset(s.to_string())),
        }
    }
}

impl std::fmt::Display for Preset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_parsing() {
        assert_eq!("fast".parse::<Preset>().unwrap(), Preset::Fast);
        assert_eq!("THOROUGH".parse::<Preset>().unwrap(), Preset::Thorough);
        assert!(matches!(
            "custom".parse::<Preset>(),
            Err(ConfigError::UnknownPreset(_))
        ));
    }

    #[test]
    fn test_preset_display() {
        assert_eq!(Preset::Balanced.to_string(), "balanced");
        assert_eq!(Preset::default(), Preset::Balanced);
    }
}
