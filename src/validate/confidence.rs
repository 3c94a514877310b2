use crate::models::{ConfigError, QualityIndicator};

/// Configuration for confidence enhancement
#[derive(Debug, Clone)]
pub struct ConfidenceConfig {
    /// Weight of source grounding in the base score
    pub weight_source: f64,
    /// Weight of structural quality in the base score
    pub weight_quality: f64,
    /// Multiplier applied when quality >= 0.8
    pub high_quality_bonus: f64,
    /// Multiplier applied when quality >= 0.6
    pub good_quality_bonus: f64,
    /// Multiplier applied when quality < 0.3
    pub low_quality_penalty: f64,
    /// Indicator cutoffs
    pub high_threshold: f64,
    pub medium_threshold: f64,
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            weight_source: 0.7,
            weight_quality: 0.3,
            high_quality_bonus: 1.10,
            good_quality_bonus: 1.05,
            low_quality_penalty: 0.95,
            high_threshold: 0.7,
            medium_threshold: 0.4,
        }
    }
}

impl ConfidenceConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sum = self.weight_source + self.weight_quality;
        if (sum - 1.0).abs() > 1e-6 {
            return Err(ConfigError::WeightSum {
                name: "confidence",
                sum,
            });
        }
        for (name, value) in [
            ("high_threshold", self.high_threshold),
            ("medium_threshold", self.medium_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::OutOfRange {
                    name,
                    min: 0.0,
                    max: 1.0,
                    value,
                });
            }
        }
        if self.medium_threshold > self.high_threshold {
            return Err(ConfigError::Invalid(
                "medium_threshold must be <= high_threshold".to_string(),
            ));
        }
        Ok(())
    }
}

/// Blend source grounding with structural quality into a final confidence.
///
/// Source grounding dominates (70%) so a well-formatted but poorly grounded
/// step cannot out-rank a well-grounded one. Quality adjustments are
/// multiplicative rather than additive, so structural polish cannot push a
/// low base score into a misleadingly high bracket.
pub struct ConfidenceEnhancer {
    config: ConfidenceConfig,
}

impl ConfidenceEnhancer {
    pub fn new(config: ConfidenceConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Enhanced confidence in [0, 1]
    pub fn enhance(&self, source_confidence: f64, quality_score: f64) -> f64 {
        let base = self.config.weight_source * source_confidence
            + self.config.weight_quality * quality_score;

        let adjusted = if quality_score >= 0.8 {
            base * self.config.high_quality_bonus
        } else if quality_score >= 0.6 {
            base * self.config.good_quality_bonus
        } else if quality_score < 0.3 {
            base * self.config.low_quality_penalty
        } else {
            base
        };

        adjusted.clamp(0.0, 1.0)
    }

    pub fn indicator_for(&self, confidence: f64) -> QualityIndicator {
        if confidence >= self.config.high_threshold {
            QualityIndicator::High
        } else if confidence >= self.config.medium_threshold {
            QualityIndicator::Medium
        } else {
            QualityIndicator::Low
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enhancer() -> ConfidenceEnhancer {
        ConfidenceEnhancer::new(ConfidenceConfig::default()).unwrap()
    }

    #[test]
    fn test_good_quality_bonus() {
        // 0.7*0.5 + 0.3*0.9 = 0.62, quality >= 0.6 so x1.05 = 0.651... with
        // quality 0.9 >= 0.8 the high bonus applies instead: 0.62 * 1.10
        let e = enhancer();
        let result = e.enhance(0.5, 0.9);
        assert!((result - 0.682).abs() < 1e-9);
        assert_eq!(e.indicator_for(result), QualityIndicator::Medium);
    }

    #[test]
    fn test_clamped_to_unit_interval() {
        let e = enhancer();
        assert_eq!(e.enhance(1.0, 1.0), 1.0);
        assert_eq!(e.enhance(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_low_quality_penalty() {
        let e = enhancer();
        // base = 0.7*0.6 + 0.3*0.1 = 0.45, x0.95 = 0.4275
        let result = e.enhance(0.6, 0.1);
        assert!((result - 0.4275).abs() < 1e-9);
    }

    #[test]
    fn test_no_adjustment_in_middle_band() {
        let e = enhancer();
        // quality 0.5: no bonus, no penalty
        let result = e.enhance(0.4, 0.5);
        assert!((result - (0.7 * 0.4 + 0.3 * 0.5)).abs() < 1e-9);
    }

    #[test]
    fn test_indicator_boundaries() {
        let e = enhancer();
        assert_eq!(e.indicator_for(0.7), QualityIndicator::High);
        assert_eq!(e.indicator_for(0.69), QualityIndicator::Medium);
        assert_eq!(e.indicator_for(0.4), QualityIndicator::Medium);
        assert_eq!(e.indicator_for(0.39), QualityIndicator::Low);
    }

    #[test]
    fn test_config_rejects_bad_weights() {
        let config = ConfidenceConfig {
            weight_source: 0.9,
            ..ConfidenceConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
