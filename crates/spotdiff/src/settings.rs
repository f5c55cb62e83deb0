//! Per-comparison settings and their boundary validation.
//!
//! Invalid settings are caller programming errors: they are rejected once at
//! the API boundary with [`SettingsError`]. Every runtime condition inside
//! the pipeline degrades instead of erroring.

use serde::{Deserialize, Serialize};

/// Lowest accepted precision level.
pub const MIN_PRECISION: u8 = 1;
/// Highest accepted precision level.
pub const MAX_PRECISION: u8 = 7;
/// Default minimum region area as a percentage of the analysis area.
pub const DEFAULT_MIN_AREA_PERCENT: f32 = 5.0;

/// Immutable per-comparison settings.
///
/// `precision_level` acts monotonically: a higher level lowers the detection
/// threshold and admits more candidates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SettingsRaw")]
pub struct Settings {
    precision_level: u8,
    min_area_percent: f32,
}

impl Settings {
    /// Validate and construct settings.
    pub fn new(precision_level: u8, min_area_percent: f32) -> Result<Self, SettingsError> {
        if !(MIN_PRECISION..=MAX_PRECISION).contains(&precision_level) {
            return Err(SettingsError::PrecisionOutOfRange(precision_level));
        }
        if !min_area_percent.is_finite() || min_area_percent <= 0.0 || min_area_percent > 100.0 {
            return Err(SettingsError::InvalidMinAreaPercent(min_area_percent));
        }
        Ok(Self {
            precision_level,
            min_area_percent,
        })
    }

    /// Settings with an explicit precision level and the default minimum area.
    pub fn with_precision(precision_level: u8) -> Result<Self, SettingsError> {
        Self::new(precision_level, DEFAULT_MIN_AREA_PERCENT)
    }

    pub fn precision_level(&self) -> u8 {
        self.precision_level
    }

    pub fn min_area_percent(&self) -> f32 {
        self.min_area_percent
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            precision_level: 3,
            min_area_percent: DEFAULT_MIN_AREA_PERCENT,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SettingsRaw {
    precision_level: u8,
    min_area_percent: f32,
}

impl TryFrom<SettingsRaw> for Settings {
    type Error = SettingsError;

    fn try_from(raw: SettingsRaw) -> Result<Self, Self::Error> {
        Settings::new(raw.precision_level, raw.min_area_percent)
    }
}

/// Validation error for caller-supplied settings.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingsError {
    PrecisionOutOfRange(u8),
    InvalidMinAreaPercent(f32),
}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PrecisionOutOfRange(level) => write!(
                f,
                "precision level {} out of range {}..={}",
                level, MIN_PRECISION, MAX_PRECISION
            ),
            Self::InvalidMinAreaPercent(pct) => {
                write!(f, "minimum area percent {} must be in (0, 100]", pct)
            }
        }
    }
}

impl std::error::Error for SettingsError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_range_is_accepted() {
        for level in MIN_PRECISION..=MAX_PRECISION {
            assert!(Settings::with_precision(level).is_ok());
        }
    }

    #[test]
    fn out_of_range_precision_is_rejected() {
        assert_eq!(
            Settings::new(0, 5.0),
            Err(SettingsError::PrecisionOutOfRange(0))
        );
        assert_eq!(
            Settings::new(8, 5.0),
            Err(SettingsError::PrecisionOutOfRange(8))
        );
    }

    #[test]
    fn invalid_area_percent_is_rejected() {
        assert!(matches!(
            Settings::new(3, -1.0),
            Err(SettingsError::InvalidMinAreaPercent(_))
        ));
        assert!(matches!(
            Settings::new(3, 0.0),
            Err(SettingsError::InvalidMinAreaPercent(_))
        ));
        assert!(matches!(
            Settings::new(3, f32::NAN),
            Err(SettingsError::InvalidMinAreaPercent(_))
        ));
    }

    #[test]
    fn default_settings_match_documented_values() {
        let s = Settings::default();
        assert_eq!(s.precision_level(), 3);
        assert_eq!(s.min_area_percent(), DEFAULT_MIN_AREA_PERCENT);
    }

    #[test]
    fn deserialization_validates() {
        let ok: Result<Settings, _> =
            serde_json::from_str(r#"{"precision_level": 5, "min_area_percent": 5.0}"#);
        assert!(ok.is_ok());

        let bad: Result<Settings, _> =
            serde_json::from_str(r#"{"precision_level": 9, "min_area_percent": 5.0}"#);
        assert!(bad.is_err());
    }
}
