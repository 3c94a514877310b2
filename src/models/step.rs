use serde::{Deserialize, Serialize};

/// A draft instructional step as returned by the step generator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftStep {
    /// Short imperative title (e.g. "Configure billing alerts")
    pub title: String,
    /// One-sentence overview, optional
    #[serde(default)]
    pub summary: Option<String>,
    /// Context and explanation for the step
    #[serde(default)]
    pub details: String,
    /// Ordered list of concrete actions
    #[serde(default)]
    pub actions: Vec<String>,
}

/// Token accounting for one or more generator calls
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
}

impl TokenUsage {
    pub fn add(&mut self, other: TokenUsage) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
        self.total_tokens += other.total_tokens;
    }
}

/// Coarse trust label derived from enhanced confidence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityIndicator {
    High,
    Medium,
    Low,
}

impl QualityIndicator {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityIndicator::High => "high",
            QualityIndicator::Medium => "medium",
            QualityIndicator::Low => "low",
        }
    }
}

impl std::fmt::Display for QualityIndicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated, confidence-scored step in the final document.
///
/// Carries a reference back to the originating segment's sentence range so
/// downstream rendering can cite sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentStep {
    /// Unique identifier for this step (UUID)
    pub step_id: String,
    /// 0-based position in the final document, matching segment order
    pub step_index: usize,
    pub title: String,
    pub summary: Option<String>,
    pub details: String,
    pub actions: Vec<String>,
    /// Enhanced confidence after blending source grounding with quality
    pub confidence_score: f64,
    /// Structural quality score from validation
    pub quality_score: f64,
    pub quality_indicator: QualityIndicator,
    /// Index of the segment this step was generated from
    pub segment_index: usize,
    /// First transcript sentence covered by the originating segment
    pub start_sentence_index: usize,
    /// Last transcript sentence covered by the originating segment
    pub end_sentence_index: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_usage_add() {
        let mut total = TokenUsage::default();
        total.add(TokenUsage {
            input_tokens: 100,
            output_tokens: 40,
            total_tokens: 140,
        });
        total.add(TokenUsage {
            input_tokens: 50,
            output_tokens: 10,
            total_tokens: 60,
        });
        assert_eq!(total.input_tokens, 150);
        assert_eq!(total.output_tokens, 50);
        assert_eq!(total.total_tokens, 200);
    }

    #[test]
    fn test_draft_step_deserializes_with_defaults() {
        let step: DraftStep = serde_json::from_str(r#"{"title": "Open the console"}"#).unwrap();
        assert_eq!(step.title, "Open the console");
        assert!(step.summary.is_none());
        assert!(step.actions.is_empty());
    }

    #[test]
    fn test_quality_indicator_serializes_lowercase() {
        let json = serde_json::to_string(&QualityIndicator::Medium).unwrap();
        assert_eq!(json, "\"medium\"");
    }
}
