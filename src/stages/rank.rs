use tracing::{debug, info};

use crate::models::{ConfigError, Lexicon, TopicSegment};

/// Configuration for importance ranking
#[derive(Debug, Clone)]
pub struct RankingConfig {
    /// Weight of the procedural-language score
    pub weight_procedural: f64,
    /// Weight of per-sentence action density
    pub weight_action_density: f64,
    /// Weight of topic coherence
    pub weight_coherence: f64,
    /// Segments scoring below this are dropped
    pub min_importance_threshold: f64,
    /// Keep only the N highest-scoring survivors
    pub keep_top_n: Option<usize>,
    /// Return survivors in descending importance order instead of segment
    /// order
    pub sort_by_importance: bool,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            weight_procedural: 0.4,
            weight_action_density: 0.3,
            weight_coherence: 0.3,
            min_importance_threshold: 0.3,
            keep_top_n: None,
            sort_by_importance: false,
        }
    }
}

impl RankingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sum = self.weight_procedural + self.weight_action_density + self.weight_coherence;
        if (sum - 1.0).abs() > 1e-6 {
            return Err(ConfigError::WeightSum { name: "ranking", sum });
        }
        if !(0.0..=1.0).contains(&self.min_importance_threshold) {
            return Err(ConfigError::OutOfRange {
                name: "min_importance_threshold",
                min: 0.0,
                max: 1.0,
                value: self.min_importance_threshold,
            });
        }
        if self.keep_top_n == Some(0) {
            return Err(ConfigError::Invalid(
                "keep_top_n must be at least 1 when set".to_string(),
            ));
        }
        Ok(())
    }
}

/// Importance breakdown for one segment
#[derive(Debug, Clone)]
pub struct TopicScore {
    pub segment_index: usize,
    pub importance_score: f64,
    pub procedural_score: f64,
    pub action_density: f64,
    pub coherence_score: f64,
}

/// Rank segments by procedural importance and drop the chatter.
///
/// Not every conversational segment carries procedural value; asides and
/// scheduling talk would waste generator calls. Importance blends how
/// instruction-like the language is with the segment's action density and
/// coherence.
pub struct Ranker {
    config: RankingConfig,
    lexicon: Lexicon,
}

impl Ranker {
    pub fn new(config: RankingConfig, lexicon: Lexicon) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config, lexicon })
    }

    /// Score every segment without filtering
    pub fn score_segments(&self, segments: &[TopicSegment]) -> Vec<TopicScore> {
        segments
            .iter()
            .map(|segment| {
                let procedural_score = self.procedural_score(segment);
                let importance_score = self.config.weight_procedural * procedural_score
                    + self.config.weight_action_density * segment.action_density
                    + self.config.weight_coherence * segment.coherence_score;
                debug!(
                    "Segment {}: importance={:.2} (procedural={:.2}, actions={:.2}, coherence={:.2})",
                    segment.segment_index,
                    importance_score,
                    procedural_score,
                    segment.action_density,
                    segment.coherence_score
                );
                TopicScore {
                    segment_index: segment.segment_index,
                    importance_score,
                    procedural_score,
                    action_density: segment.action_density,
                    coherence_score: segment.coherence_score,
                }
            })
            .collect()
    }

    /// Drop segments below the importance threshold, optionally keeping only
    /// the top N. Survivors come back in segment order unless
    /// `sort_by_importance` is set.
    pub fn rank_and_filter(&self, segments: Vec<TopicSegment>) -> Vec<TopicSegment> {
        if segments.is_empty() {
            return segments;
        }

        let before = segments.len();
        let scores = self.score_segments(&segments);
        let mut survivors: Vec<(TopicSegment, f64)> = segments
            .into_iter()
            .zip(scores)
            .filter(|(segment, score)| {
                if score.importance_score >= self.config.min_importance_threshold {
                    true
                } else {
                    info!(
                        "Dropping low-importance segment {}: {:.2} < {:.2}",
                        segment.segment_index,
                        score.importance_score,
                        self.config.min_importance_threshold
                    );
                    false
                }
            })
            .map(|(segment, score)| (segment, score.importance_score))
            .collect();

        if let Some(n) = self.config.keep_top_n {
            if survivors.len() > n {
                survivors
                    .sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
                survivors.truncate(n);
                info!("Keeping top {} segments", n);
            }
        }

        if self.config.sort_by_importance {
            survivors.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        } else {
            // Step order must follow transcript order
            survivors.sort_by_key(|(segment, _)| segment.segment_index);
        }

        info!("Ranker kept {}/{} segments", survivors.len(), before);
        survivors.into_iter().map(|(segment, _)| segment).collect()
    }

    /// How instruction-like the segment's language is: distinct action-verb
    /// hits (half the score), imperative sentence ratio, and sequence markers
    fn procedural_score(&self, segment: &TopicSegment) -> f64 {
        if segment.sentences.is_empty() {
            return 0.0;
        }
        let n = segment.sentences.len() as f64;
        let text = segment.text().to_lowercase();
        let words: Vec<&str> = text
            .split_whitespace()
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
            .collect();

        let action_hits = self
            .lexicon
            .action_verbs
            .iter()
            .filter(|verb| words.iter().any(|w| *w == verb.as_str()))
            .count();
        let sequence_hits = self
            .lexicon
            .sequence_indicators
            .iter()
            .filter(|marker| text.contains(marker.as_str()))
            .count();
        let imperative_count = segment
            .sentences
            .iter()
            .filter(|s| {
                s.text
                    .to_lowercase()
                    .split_whitespace()
                    .take(2)
                    .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
                    .any(|w| self.lexicon.action_verbs.iter().any(|v| v == w))
            })
            .count();

        // Expect roughly two action verbs per sentence and one sequence
        // marker per three sentences
        let action_score = (action_hits as f64 / (n * 2.0)).min(1.0);
        let sequence_score = (sequence_hits as f64 / (n / 3.0).max(1.0)).min(1.0);
        let imperative_score = imperative_count as f64 / n;

        (action_score * 0.5 + imperative_score * 0.3 + sequence_score * 0.2).min(1.0)
    }
}
