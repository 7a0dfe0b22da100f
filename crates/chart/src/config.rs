use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tickrange_math::{DigitPolicy, PRICE_FIXED_DIGITS};
use tickrange_types::FeeTier;

use crate::error::{ChartError, ChartResult};
use crate::labels::LabelMode;
use crate::viewport::ZoomLevels;

/// Chart configuration loaded from TOML file
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ChartConfig {
    /// Digit policy for curve price strings
    pub price_digits: DigitPolicy,

    /// Bound label formatting
    pub labels: LabelConfig,

    /// Distance in pixels within which a pointer grabs a handle
    pub handle_hit_tolerance_px: f64,

    /// Chart width used until the host reports a real one
    pub default_width_px: f64,

    /// Zoom levels replacing the built-in table, keyed by fee amount
    /// (e.g. `"3000"` for the 0.30% tier)
    pub zoom_overrides: BTreeMap<String, ZoomLevels>,
}

/// Label configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LabelConfig {
    pub mode: LabelMode,

    /// Significant digits of an absolute price label
    pub significant_digits: u32,

    /// Decimal places of a percent label near the current price
    pub percent_decimals: u32,

    /// Percent magnitude beyond which labels switch to compact form
    pub percent_compact_threshold: f64,

    /// Significant digits of a compact percent label
    pub percent_compact_digits: u32,
}

impl ChartConfig {
    /// Load configuration from TOML file
    pub fn load(path: impl AsRef<Path>) -> ChartResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| ChartError::ConfigIo(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> ChartResult<Self> {
        let config: ChartConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save(&self, path: impl AsRef<Path>) -> ChartResult<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).map_err(|e| ChartError::ConfigIo(format!("{}: {}", path.display(), e)))?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> ChartResult<()> {
        if self.price_digits == DigitPolicy::Significant(0) {
            return Err(ChartError::InvalidConfig("price_digits must keep at least one significant digit".into()));
        }

        if !(self.handle_hit_tolerance_px.is_finite() && self.handle_hit_tolerance_px >= 0.0) {
            return Err(ChartError::InvalidConfig(format!(
                "handle_hit_tolerance_px must be non-negative, got {}",
                self.handle_hit_tolerance_px
            )));
        }

        if !(self.default_width_px.is_finite() && self.default_width_px > 0.0) {
            return Err(ChartError::InvalidConfig(format!(
                "default_width_px must be greater than 0, got {}",
                self.default_width_px
            )));
        }

        for (amount, levels) in &self.zoom_overrides {
            amount
                .parse::<u32>()
                .map_err(|_| format!("unknown fee tier {}", amount))
                .and_then(FeeTier::try_from)
                .map_err(ChartError::InvalidConfig)?;
            levels
                .validate()
                .map_err(|reason| ChartError::InvalidConfig(format!("zoom_overrides.{}: {}", amount, reason)))?;
        }

        self.labels.validate()
    }

    /// Zoom levels for a fee tier, honoring overrides
    pub fn zoom_levels(&self, fee_tier: FeeTier) -> ZoomLevels {
        self.zoom_overrides
            .get(&fee_tier.amount().to_string())
            .copied()
            .unwrap_or_else(|| ZoomLevels::for_fee_tier(fee_tier))
    }
}

impl LabelConfig {
    fn validate(&self) -> ChartResult<()> {
        if self.significant_digits == 0 {
            return Err(ChartError::InvalidConfig("labels.significant_digits must be greater than 0".into()));
        }

        if self.percent_compact_digits == 0 {
            return Err(ChartError::InvalidConfig("labels.percent_compact_digits must be greater than 0".into()));
        }

        if !(self.percent_compact_threshold.is_finite() && self.percent_compact_threshold >= 0.0) {
            return Err(ChartError::InvalidConfig(format!(
                "labels.percent_compact_threshold must be non-negative, got {}",
                self.percent_compact_threshold
            )));
        }

        Ok(())
    }
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            price_digits: DigitPolicy::Fixed(PRICE_FIXED_DIGITS),
            labels: LabelConfig::default(),
            handle_hit_tolerance_px: 6.0,
            default_width_px: 560.0,
            zoom_overrides: BTreeMap::new(),
        }
    }
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            mode: LabelMode::Percent,
            significant_digits: 5,
            percent_decimals: 2,
            percent_compact_threshold: 1.0,
            percent_compact_digits: 3,
        }
    }
}

/// Create example configuration file
pub fn create_example_config(path: impl AsRef<Path>) -> ChartResult<()> {
    let mut zoom_overrides = BTreeMap::new();
    zoom_overrides.insert(
        FeeTier::Medium.amount().to_string(),
        ZoomLevels {
            initial_min: 0.8,
            initial_max: 1.25,
            ..ZoomLevels::for_fee_tier(FeeTier::Medium)
        },
    );

    let example_config = ChartConfig {
        price_digits: DigitPolicy::Significant(8),
        labels: LabelConfig {
            mode: LabelMode::Amount,
            ..LabelConfig::default()
        },
        zoom_overrides,
        ..ChartConfig::default()
    };

    example_config.save(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_validation() {
        let mut config = ChartConfig::default();
        assert!(config.validate().is_ok());

        config.default_width_px = 0.0;
        assert!(config.validate().is_err());

        let mut config = ChartConfig::default();
        config.labels.significant_digits = 0;
        assert!(config.validate().is_err());

        let mut config = ChartConfig::default();
        config.zoom_overrides.insert("2500".to_string(), ZoomLevels::for_fee_tier(FeeTier::Low));
        assert!(matches!(config.validate(), Err(ChartError::InvalidConfig(_))));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = ChartConfig::from_toml_str(
            r#"
            handle_hit_tolerance_px = 10.0

            [labels]
            mode = "amount"
            "#,
        )
        .unwrap();

        assert_eq!(config.handle_hit_tolerance_px, 10.0);
        assert_eq!(config.labels.mode, LabelMode::Amount);
        assert_eq!(config.labels.significant_digits, 5);
        assert_eq!(config.price_digits, DigitPolicy::Fixed(8));
    }

    #[test]
    fn test_unordered_zoom_override_is_rejected() {
        let err = ChartConfig::from_toml_str(
            r#"
            [zoom_overrides.500]
            initial_min = 2.0
            initial_max = 1.0
            min_zoom = 0.00001
            max_zoom = 1.5
            default_range_half_width = 0.001
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ChartError::InvalidConfig(_)));

        assert!(matches!(
            ChartConfig::from_toml_str("default_width_px = \"wide\""),
            Err(ChartError::ConfigParse(_))
        ));
    }

    #[test]
    fn test_example_config_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chart.toml");

        create_example_config(&path).unwrap();
        let loaded = ChartConfig::load(&path).unwrap();

        assert_eq!(loaded.price_digits, DigitPolicy::Significant(8));
        assert_eq!(loaded.zoom_levels(FeeTier::Medium).initial_min, 0.8);
        assert_eq!(loaded.zoom_levels(FeeTier::High), ZoomLevels::for_fee_tier(FeeTier::High));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ChartConfig::load(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ChartError::ConfigIo(_)));
    }
}
