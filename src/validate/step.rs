use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::models::{ConfigError, DraftStep};

/// Configuration for structural step validation
#[derive(Debug, Clone)]
pub struct ValidationConfig {
    /// Minimum actions per step
    pub min_actions: usize,
    /// Warn when a step has more actions than this
    pub max_actions: usize,
    /// Warn about case-insensitive duplicate actions
    pub warn_duplicate_actions: bool,
    /// Title length bounds, characters
    pub min_title_length: usize,
    pub max_title_length: usize,
    /// Details are required
    pub require_details: bool,
    /// Warn when details are shorter than this, characters
    pub min_details_length: usize,
    /// Error below this confidence
    pub min_confidence_threshold: f64,
    /// Warn below this confidence
    pub low_confidence_threshold: f64,
    /// Quality score weights (must sum to 1.0)
    pub weight_actions: f64,
    pub weight_title: f64,
    pub weight_details: f64,
    pub weight_confidence: f64,
    /// Attach remediation suggestions to failed steps
    pub enable_auto_fix_suggestions: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_actions: 3,
            max_actions: 15,
            warn_duplicate_actions: true,
            min_title_length: 10,
            max_title_length: 100,
            require_details: true,
            min_details_length: 20,
            min_confidence_threshold: 0.2,
            low_confidence_threshold: 0.4,
            weight_actions: 0.4,
            weight_title: 0.2,
            weight_details: 0.2,
            weight_confidence: 0.2,
            enable_auto_fix_suggestions: true,
        }
    }
}

impl ValidationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sum =
            self.weight_actions + self.weight_title + self.weight_details + self.weight_confidence;
        if (sum - 1.0).abs() > 1e-6 {
            return Err(ConfigError::WeightSum {
                name: "validation",
                sum,
            });
        }
        if self.min_actions == 0 {
            return Err(ConfigError::Invalid(
                "min_actions must be at least 1".to_string(),
            ));
        }
        if self.max_actions < self.min_actions {
            return Err(ConfigError::Invalid(format!(
                "max_actions ({}) must be >= min_actions ({})",
                self.max_actions, self.min_actions
            )));
        }
        for (name, value) in [
            ("min_confidence_threshold", self.min_confidence_threshold),
            ("low_confidence_threshold", self.low_confidence_threshold),
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
        if self.low_confidence_threshold < self.min_confidence_threshold {
            return Err(ConfigError::Invalid(
                "low_confidence_threshold must be >= min_confidence_threshold".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    InsufficientActions,
    TooManyActions,
    EmptyActions,
    MissingTitle,
    ShortTitle,
    LongTitle,
    GenericTitle,
    MissingDetails,
    InsufficientDetails,
    VeryLowConfidence,
    LowConfidence,
    DuplicateActions,
}

/// One problem found in a draft step
#[derive(Debug, Clone, Serialize)]
pub struct ValidationIssue {
    pub kind: IssueKind,
    pub severity: Severity,
    pub message: String,
    /// Which step field the issue concerns
    pub field: &'static str,
    /// Suggested remediation, advisory only
    pub suggestion: Option<String>,
}

/// Outcome of validating one draft step
#[derive(Debug, Clone, Serialize)]
pub struct ValidationResult {
    /// Index of the segment whose draft step was validated. Steps are
    /// renumbered after rejections, so segment index is the stable key.
    pub segment_index: usize,
    /// No error-severity issues found. Warnings and info never block.
    pub is_valid: bool,
    pub quality_score: f64,
    pub issues: Vec<ValidationIssue>,
    /// Remediation summary for invalid steps, when enabled
    pub auto_fixes: Vec<String>,
    pub action_count: usize,
    pub has_duplicates: bool,
}

impl ValidationResult {
    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
    }
}

/// Structural validation of generated steps.
///
/// Pure checks over the step fields, no model calls. Five independent
/// dimensions: action list, title, details, confidence, duplicates. A step is
/// rejected only on errors; warnings and info are advisory.
pub struct StepValidator {
    config: ValidationConfig,
    generic_title: Regex,
}

impl StepValidator {
    pub fn new(config: ValidationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let generic_title =
            Regex::new(r"^(?:step \d+|instructions?)$|^(?:untitled|new step|todo)").map_err(
                |e| ConfigError::Invalid(format!("invalid generic-title pattern: {}", e)),
            )?;
        Ok(Self {
            config,
            generic_title,
        })
    }

    /// Validate one draft step against the configured thresholds.
    /// `confidence` is the step's source confidence.
    pub fn validate(
        &self,
        step: &DraftStep,
        segment_index: usize,
        confidence: f64,
    ) -> ValidationResult {
        let mut issues = Vec::new();

        let has_duplicates = self.check_actions(step, &mut issues);
        self.check_title(step, &mut issues);
        self.check_details(step, &mut issues);
        self.check_confidence(confidence, &mut issues);

        let is_valid = !issues.iter().any(|i| i.severity == Severity::Error);
        let quality_score = self.quality_score(step, confidence);

        let auto_fixes = if self.config.enable_auto_fix_suggestions && !is_valid {
            issues
                .iter()
                .filter(|i| i.severity != Severity::Info)
                .filter_map(|i| i.suggestion.clone())
                .collect()
        } else {
            Vec::new()
        };

        debug!(
            "Segment {}: valid={}, quality={:.2}, issues={}",
            segment_index,
            is_valid,
            quality_score,
            issues.len()
        );

        ValidationResult {
            segment_index,
            is_valid,
            quality_score,
            issues,
            auto_fixes,
            action_count: step.actions.len(),
            has_duplicates,
        }
    }

    fn check_actions(&self, step: &DraftStep, issues: &mut Vec<ValidationIssue>) -> bool {
        let count = step.actions.len();

        if count < self.config.min_actions {
            let needed = self.config.min_actions - count;
            issues.push(ValidationIssue {
                kind: IssueKind::InsufficientActions,
                severity: Severity::Error,
                message: format!(
                    "Step has {} action(s), minimum is {}",
                    count, self.config.min_actions
                ),
                field: "actions",
                suggestion: Some(format!("Add at least {} more action(s)", needed)),
            });
        } else if count > self.config.max_actions {
            issues.push(ValidationIssue {
                kind: IssueKind::TooManyActions,
                severity: Severity::Warning,
                message: format!(
                    "Step has {} actions, maximum is {}",
                    count, self.config.max_actions
                ),
                field: "actions",
                suggestion: Some("Consider splitting this step into multiple steps".to_string()),
            });
        }

        if step.actions.iter().any(|a| a.trim().is_empty()) {
            issues.push(ValidationIssue {
                kind: IssueKind::EmptyActions,
                severity: Severity::Error,
                message: "Step contains empty action text".to_string(),
                field: "actions",
                suggestion: Some("Remove empty actions or add descriptive text".to_string()),
            });
        }

        if !self.config.warn_duplicate_actions {
            return false;
        }
        let mut seen = Vec::new();
        let mut duplicates = 0usize;
        for action in &step.actions {
            let normalized = action.to_lowercase().trim().to_string();
            if seen.contains(&normalized) {
                duplicates += 1;
            } else {
                seen.push(normalized);
            }
        }
        if duplicates > 0 {
            issues.push(ValidationIssue {
                kind: IssueKind::DuplicateActions,
                severity: Severity::Warning,
                message: format!("Step has {} duplicate action(s)", duplicates),
                field: "actions",
                suggestion: Some("Remove or rephrase duplicate actions".to_string()),
            });
        }
        duplicates > 0
    }

    fn check_title(&self, step: &DraftStep, issues: &mut Vec<ValidationIssue>) {
        let title = step.title.trim();
        if title.is_empty() {
            issues.push(ValidationIssue {
                kind: IssueKind::MissingTitle,
                severity: Severity::Error,
                message: "Step has no title".to_string(),
                field: "title",
                suggestion: Some("Add a descriptive title for this step".to_string()),
            });
            return;
        }

        let length = title.chars().count();
        if length < self.config.min_title_length {
            issues.push(ValidationIssue {
                kind: IssueKind::ShortTitle,
                severity: Severity::Warning,
                message: format!(
                    "Title is too short ({} chars, minimum {})",
                    length, self.config.min_title_length
                ),
                field: "title",
                suggestion: Some("Use a more descriptive title".to_string()),
            });
        } else if length > self.config.max_title_length {
            issues.push(ValidationIssue {
                kind: IssueKind::LongTitle,
                severity: Severity::Warning,
                message: format!(
                    "Title is too long ({} chars, maximum {})",
                    length, self.config.max_title_length
                ),
                field: "title",
                suggestion: Some(
                    "Shorten the title or move detail into the details field".to_string(),
                ),
            });
        }

        if self.generic_title.is_match(&title.to_lowercase()) {
            issues.push(ValidationIssue {
                kind: IssueKind::GenericTitle,
                severity: Severity::Info,
                message: format!("Title '{}' is generic", title),
                field: "title",
                suggestion: Some(
                    "Use specific action words (e.g. 'Configure', 'Create', 'Navigate')"
                        .to_string(),
                ),
            });
        }
    }

    fn check_details(&self, step: &DraftStep, issues: &mut Vec<ValidationIssue>) {
        let details = step.details.trim();
        if details.is_empty() {
            if self.config.require_details {
                issues.push(ValidationIssue {
                    kind: IssueKind::MissingDetails,
                    severity: Severity::Error,
                    message: "Step has no details".to_string(),
                    field: "details",
                    suggestion: Some(
                        "Add context or additional information about this step".to_string(),
                    ),
                });
            }
            return;
        }

        let length = details.chars().count();
        if length < self.config.min_details_length {
            issues.push(ValidationIssue {
                kind: IssueKind::InsufficientDetails,
                severity: Severity::Warning,
                message: format!(
                    "Details are too short ({} chars, minimum {})",
                    length, self.config.min_details_length
                ),
                field: "details",
                suggestion: Some(format!(
                    "Expand details to at least {} characters",
                    self.config.min_details_length
                )),
            });
        }
    }

    fn check_confidence(&self, confidence: f64, issues: &mut Vec<ValidationIssue>) {
        if confidence < self.config.min_confidence_threshold {
            issues.push(ValidationIssue {
                kind: IssueKind::VeryLowConfidence,
                severity: Severity::Error,
                message: format!(
                    "Step has very low confidence ({:.2} < {:.2})",
                    confidence, self.config.min_confidence_threshold
                ),
                field: "confidence_score",
                suggestion: Some(
                    "Review step quality, it may need more source information".to_string(),
                ),
            });
        } else if confidence < self.config.low_confidence_threshold {
            issues.push(ValidationIssue {
                kind: IssueKind::LowConfidence,
                severity: Severity::Warning,
                message: format!(
                    "Step has low confidence ({:.2} < {:.2})",
                    confidence, self.config.low_confidence_threshold
                ),
                field: "confidence_score",
                suggestion: Some("Consider adding more context from source material".to_string()),
            });
        }
    }

    /// Weighted quality score over the four scorable dimensions. Each
    /// dimension is normalized against its configured thresholds, so a step
    /// comfortably above every minimum approaches 1.0.
    fn quality_score(&self, step: &DraftStep, confidence: f64) -> f64 {
        let action_count = step.actions.len();
        let action_score = if action_count >= self.config.min_actions {
            (action_count as f64 / (self.config.min_actions as f64 * 2.0)).min(1.0)
        } else {
            action_count as f64 / self.config.min_actions as f64
        };

        let title_length = step.title.trim().chars().count();
        let title_score = if title_length >= self.config.min_title_length {
            (title_length as f64 / self.config.max_title_length as f64).min(1.0)
        } else {
            title_length as f64 / self.config.min_title_length as f64
        };

        let details_length = step.details.trim().chars().count();
        let details_score = if details_length >= self.config.min_details_length {
            (details_length as f64 / (self.config.min_details_length as f64 * 3.0)).min(1.0)
        } else if self.config.require_details {
            details_length as f64 / self.config.min_details_length as f64
        } else {
            1.0
        };

        let score = action_score * self.config.weight_actions
            + title_score * self.config.weight_title
            + details_score * self.config.weight_details
            + confidence * self.config.weight_confidence;
        score.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> StepValidator {
        StepValidator::new(ValidationConfig::default()).unwrap()
    }

    fn good_step() -> DraftStep {
        DraftStep {
            title: "Configure billing alert thresholds".to_string(),
            summary: Some("Set up alerts before enabling exports.".to_string()),
            details: "Billing alerts stop runaway exports from going unnoticed overnight."
                .to_string(),
            actions: vec![
                "Open the billing settings page".to_string(),
                "Click the alerts tab".to_string(),
                "Set the monthly threshold to 100".to_string(),
                "Save the configuration".to_string(),
            ],
        }
    }

    #[test]
    fn test_good_step_is_valid() {
        let result = validator().validate(&good_step(), 0, 0.8);
        assert!(result.is_valid);
        assert!(result.errors().next().is_none());
        assert!(result.quality_score > 0.5);
        assert!(result.auto_fixes.is_empty());
    }

    #[test]
    fn test_insufficient_actions_is_an_error() {
        let mut step = good_step();
        step.actions.truncate(2);

        let result = validator().validate(&step, 3, 0.8);
        assert!(!result.is_valid);
        let error = result.errors().next().unwrap();
        assert_eq!(error.kind, IssueKind::InsufficientActions);
        assert_eq!(
            error.suggestion.as_deref(),
            Some("Add at least 1 more action(s)")
        );
        assert!(!result.auto_fixes.is_empty());
    }

    #[test]
    fn test_empty_action_is_an_error() {
        let mut step = good_step();
        step.actions.push("   ".to_string());

        let result = validator().validate(&step, 0, 0.8);
        assert!(!result.is_valid);
        assert!(result.errors().any(|i| i.kind == IssueKind::EmptyActions));
    }

    #[test]
    fn test_duplicates_warn_but_do_not_block() {
        let mut step = good_step();
        step.actions.push("  open the BILLING settings page ".to_string());

        let result = validator().validate(&step, 0, 0.8);
        assert!(result.is_valid);
        assert!(result.has_duplicates);
        assert!(result
            .warnings()
            .any(|i| i.kind == IssueKind::DuplicateActions));
    }

    #[test]
    fn test_generic_title_is_info_only() {
        let mut step = good_step();
        step.title = "Step 3".to_string();

        let result = validator().validate(&step, 0, 0.8);
        let issue = result
            .issues
            .iter()
            .find(|i| i.kind == IssueKind::GenericTitle)
            .unwrap();
        assert_eq!(issue.severity, Severity::Info);
        // Short title also warns, but neither blocks
        assert!(result.is_valid);
    }

    #[test]
    fn test_missing_title_and_details_are_errors() {
        let step = DraftStep {
            title: String::new(),
            summary: None,
            details: String::new(),
            actions: vec!["a".to_string(), "b".to_string(), "c".to_string()],
        };
        let result = validator().validate(&step, 0, 0.8);
        assert!(!result.is_valid);
        assert!(result.errors().any(|i| i.kind == IssueKind::MissingTitle));
        assert!(result.errors().any(|i| i.kind == IssueKind::MissingDetails));
    }

    #[test]
    fn test_confidence_thresholds() {
        let v = validator();
        let step = good_step();

        let very_low = v.validate(&step, 0, 0.1);
        assert!(!very_low.is_valid);
        assert!(very_low
            .errors()
            .any(|i| i.kind == IssueKind::VeryLowConfidence));

        let low = v.validate(&step, 0, 0.3);
        assert!(low.is_valid);
        assert!(low.warnings().any(|i| i.kind == IssueKind::LowConfidence));
    }

    #[test]
    fn test_quality_score_bounds() {
        let v = validator();
        let result = v.validate(&good_step(), 0, 1.0);
        assert!((0.0..=1.0).contains(&result.quality_score));

        let empty = DraftStep {
            title: String::new(),
            summary: None,
            details: String::new(),
            actions: Vec::new(),
        };
        let result = v.validate(&empty, 0, 0.0);
        assert!((0.0..=1.0).contains(&result.quality_score));
        assert!(result.quality_score < 0.1);
    }

    #[test]
    fn test_config_rejects_bad_weights() {
        let config = ValidationConfig {
            weight_actions: 0.9,
            ..ValidationConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
