use crate::models::{AnnotatedSentence, ConfigError, Lexicon, SpeakerRole, TopicSegment};

/// Configuration for boundary detection and segment sizing
#[derive(Debug, Clone)]
pub struct SegmentationConfig {
    /// Weight of the long-pause signal
    pub weight_pause: f64,
    /// Weight of the participant-to-instructor speaker transition signal
    pub weight_speaker_transition: f64,
    /// Weight of the transition-phrase signal
    pub weight_transition_phrase: f64,
    /// Weight of the keyword-dissimilarity signal
    pub weight_semantic: f64,
    /// Enable the keyword-dissimilarity signal. Off by default: lexical
    /// overlap between adjacent sentences is noisy on conversational text.
    pub use_semantic_signal: bool,
    /// Boundary declared when the combined score exceeds this
    pub boundary_threshold: f64,
    /// Segments shorter than this are merged into a neighbor
    pub min_segment_sentences: usize,
    /// Merging never grows a segment beyond this
    pub max_segment_sentences: usize,
    /// Minimum number of segments for any transcript; the largest segment is
    /// split when fewer survive merging
    pub min_total_segments: usize,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            weight_pause: 0.35,
            weight_speaker_transition: 0.25,
            weight_transition_phrase: 0.30,
            weight_semantic: 0.10,
            use_semantic_signal: false,
            boundary_threshold: 0.40,
            min_segment_sentences: 2,
            max_segment_sentences: 30,
            min_total_segments: 3,
        }
    }
}

impl SegmentationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sum = self.weight_pause
            + self.weight_speaker_transition
            + self.weight_transition_phrase
            + self.weight_semantic;
        if (sum - 1.0).abs() > 1e-6 {
            return Err(ConfigError::WeightSum {
                name: "segmentation",
                sum,
            });
        }
        if !(0.0..=1.0).contains(&self.boundary_threshold) {
            return Err(ConfigError::OutOfRange {
                name: "boundary_threshold",
                min: 0.0,
                max: 1.0,
                value: self.boundary_threshold,
            });
        }
        if self.min_segment_sentences == 0 {
            return Err(ConfigError::Invalid(
                "min_segment_sentences must be at least 1".to_string(),
            ));
        }
        if self.max_segment_sentences < self.min_segment_sentences {
            return Err(ConfigError::Invalid(format!(
                "max_segment_sentences ({}) must be >= min_segment_sentences ({})",
                self.max_segment_sentences, self.min_segment_sentences
            )));
        }
        if self.min_total_segments == 0 {
            return Err(ConfigError::Invalid(
                "min_total_segments must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Split annotated sentences into coherent topic segments.
///
/// No single signal is reliable alone: short pauses happen mid-topic and
/// speakers change during brief interjections. Each adjacent sentence pair
/// gets a weighted score over binary signals, with two unambiguous cues
/// (a long pause, an explicit transition phrase) forcing a boundary outright.
/// Undersized segments are then merged, preferring the following neighbor,
/// without ever exceeding the maximum segment size.
pub struct Segmenter {
    config: SegmentationConfig,
    lexicon: Lexicon,
}

impl Segmenter {
    pub fn new(config: SegmentationConfig, lexicon: Lexicon) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config, lexicon })
    }

    /// Partition sentences into topic segments.
    ///
    /// Every input sentence lands in exactly one segment and segments are in
    /// transcript order. Derived metrics are computed once, after merging.
    pub fn segment(&self, sentences: &[AnnotatedSentence]) -> Vec<TopicSegment> {
        if sentences.is_empty() {
            return Vec::new();
        }

        let runs = self.split_at_boundaries(sentences);
        let runs = self.merge_short_runs(runs);
        let runs = self.ensure_min_total(runs);

        runs.into_iter()
            .enumerate()
            .map(|(index, (run, fallback))| {
                TopicSegment::from_sentences(index, run, &self.lexicon, fallback)
            })
            .collect()
    }

    fn split_at_boundaries(&self, sentences: &[AnnotatedSentence]) -> Vec<Vec<AnnotatedSentence>> {
        let mut runs = Vec::new();
        let mut current = vec![sentences[0].clone()];

        for pair in sentences.windows(2) {
            let (prev, curr) = (&pair[0], &pair[1]);
            if self.is_boundary(prev, curr) {
                runs.push(std::mem::take(&mut current));
            }
            current.push(curr.clone());
        }
        runs.push(current);
        runs
    }

    fn is_boundary(&self, prev: &AnnotatedSentence, curr: &AnnotatedSentence) -> bool {
        // Unambiguous cues short-circuit the scoring
        if curr.follows_long_pause || curr.is_transition {
            return true;
        }
        self.boundary_score(prev, curr) > self.config.boundary_threshold
    }

    fn boundary_score(&self, prev: &AnnotatedSentence, curr: &AnnotatedSentence) -> f64 {
        let mut score = 0.0;

        if curr.follows_long_pause {
            score += self.config.weight_pause;
        }
        if prev.speaker_role == Some(SpeakerRole::Participant)
            && curr.speaker_role == Some(SpeakerRole::Instructor)
        {
            score += self.config.weight_speaker_transition;
        }
        if curr.is_transition {
            score += self.config.weight_transition_phrase;
        }
        if self.config.use_semantic_signal {
            let a = self.lexicon.keywords(&prev.text);
            let b = self.lexicon.keywords(&curr.text);
            if !a.is_empty() && !b.is_empty() {
                score += self.config.weight_semantic * (1.0 - crate::models::jaccard(&a, &b));
            }
        }

        score
    }

    /// Merge runs below the minimum size into a neighbor. The following run
    /// is preferred; either direction is skipped when the result would exceed
    /// the maximum segment size.
    fn merge_short_runs(&self, mut runs: Vec<Vec<AnnotatedSentence>>) -> Vec<Vec<AnnotatedSentence>> {
        let min = self.config.min_segment_sentences;
        let max = self.config.max_segment_sentences;

        let mut i = 0;
        while i < runs.len() {
            if runs[i].len() >= min || runs.len() == 1 {
                i += 1;
                continue;
            }

            if i + 1 < runs.len() && runs[i].len() + runs[i + 1].len() <= max {
                let moved = runs.remove(i);
                runs[i].splice(0..0, moved);
                // Re-check the combined run at the same index
            } else if i > 0 && runs[i - 1].len() + runs[i].len() <= max {
                let moved = runs.remove(i);
                runs[i - 1].extend(moved);
            } else {
                // Neither neighbor can absorb it without exceeding the cap
                i += 1;
            }
        }

        runs
    }

    /// Guarantee at least `min_total_segments` segments by splitting the
    /// largest run as evenly as possible. Runs produced here are flagged so
    /// downstream consumers know the boundary was synthetic. Splitting is
    /// skipped when no run is large enough to split into legal halves.
    fn ensure_min_total(
        &self,
        runs: Vec<Vec<AnnotatedSentence>>,
    ) -> Vec<(Vec<AnnotatedSentence>, bool)> {
        let min = self.config.min_segment_sentences;
        let mut runs: Vec<(Vec<AnnotatedSentence>, bool)> =
            runs.into_iter().map(|r| (r, false)).collect();

        while runs.len() < self.config.min_total_segments {
            let Some(largest) = (0..runs.len()).max_by_key(|&i| runs[i].0.len()) else {
                break;
            };
            if runs[largest].0.len() < min * 2 {
                break;
            }

            let (run, _) = runs.remove(largest);
            let mid = run.len() / 2;
            let mut first = run;
            let second = first.split_off(mid);
            runs.insert(largest, (second, true));
            runs.insert(largest, (first, true));
        }

        runs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sentence(index: usize, text: &str) -> AnnotatedSentence {
        AnnotatedSentence {
            text: text.to_string(),
            raw_text: text.to_string(),
            index,
            timestamp_seconds: None,
            speaker: None,
            speaker_role: None,
            is_question: text.trim_end().ends_with('?'),
            is_transition: false,
            has_emphasis: false,
            follows_long_pause: false,
            speaker_changed: false,
        }
    }

    fn segmenter() -> Segmenter {
        Segmenter::new(SegmentationConfig::default(), Lexicon::default()).unwrap()
    }

    fn assert_partition(segments: &[TopicSegment], total: usize) {
        let mut expected = 0usize;
        for (i, segment) in segments.iter().enumerate() {
            assert_eq!(segment.segment_index, i);
            for s in &segment.sentences {
                assert_eq!(s.index, expected);
                expected += 1;
            }
        }
        assert_eq!(expected, total);
    }

    #[test]
    fn test_transition_phrases_force_boundaries() {
        let mut sentences = Vec::new();
        let topics = [
            "the dashboard layout and its widgets",
            "exporting reports from the billing page",
            "managing user permissions in the admin panel",
            "troubleshooting failed sync jobs",
        ];
        for (t, topic) in topics.iter().enumerate() {
            for k in 0..4 {
                let mut s = sentence(
                    sentences.len(),
                    &format!("More detail number {} about {}.", k, topic),
                );
                if k == 0 && t > 0 {
                    s.text = format!("Now let's talk about {}.", topic);
                    s.is_transition = true;
                }
                sentences.push(s);
            }
        }

        let segments = segmenter().segment(&sentences);
        assert_eq!(segments.len(), 4);
        assert_partition(&segments, sentences.len());
        for segment in &segments[1..] {
            assert!(segment.has_transition_start);
        }
        assert!(segments.iter().all(|s| !s.fallback_split));
    }

    #[test]
    fn test_long_pause_forces_boundary() {
        let mut sentences: Vec<_> = (0..8)
            .map(|i| {
                let mut s = sentence(i, &format!("Routine remark number {} keeps going.", i));
                s.timestamp_seconds = Some(i as f64 * 10.0);
                s
            })
            .collect();
        sentences[4].follows_long_pause = true;

        let config = SegmentationConfig {
            min_total_segments: 1,
            ..SegmentationConfig::default()
        };
        let segments = Segmenter::new(config, Lexicon::default()).unwrap().segment(&sentences);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].sentence_count(), 4);
        assert_eq!(segments[1].start_sentence_index(), 4);
    }

    #[test]
    fn test_single_sentence_stays_one_segment() {
        let sentences = vec![sentence(0, "Open the console and look around.")];
        let segments = segmenter().segment(&sentences);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].sentence_count(), 1);
        assert!(!segments[0].fallback_split);
    }

    #[test]
    fn test_empty_input_yields_no_segments() {
        assert!(segmenter().segment(&[]).is_empty());
    }

    #[test]
    fn test_monologue_split_to_min_total() {
        let sentences: Vec<_> = (0..12)
            .map(|i| sentence(i, &format!("Plain narration item number {} continues on.", i)))
            .collect();

        let segments = segmenter().segment(&sentences);
        assert_eq!(segments.len(), 3);
        assert_partition(&segments, 12);
        assert!(segments.iter().all(|s| s.fallback_split));
        assert!(segments
            .iter()
            .all(|s| s.sentence_count() >= SegmentationConfig::default().min_segment_sentences));
    }

    #[test]
    fn test_short_runs_merge_into_following_segment() {
        // A lone transition sentence between two topics should end up
        // attached to the topic it introduces, not the one it closes.
        let mut sentences = vec![
            sentence(0, "The dashboard shows the account overview."),
            sentence(1, "Each widget on the dashboard refreshes hourly."),
            sentence(2, "Widgets on the dashboard can be rearranged."),
        ];
        let mut transition = sentence(3, "Moving on.");
        transition.is_transition = true;
        sentences.push(transition);
        // The next sentence also carries a transition phrase so the lone one
        // above forms its own undersized run.
        let mut intro = sentence(4, "Now let's open the billing export page.");
        intro.is_transition = true;
        sentences.push(intro);
        sentences.push(sentence(5, "The billing export page lists every invoice."));

        let config = SegmentationConfig {
            min_total_segments: 1,
            ..SegmentationConfig::default()
        };
        let segments = Segmenter::new(config, Lexicon::default()).unwrap().segment(&sentences);

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].sentence_count(), 3);
        // The undersized transition run merged forward
        assert_eq!(segments[1].start_sentence_index(), 3);
        assert_eq!(segments[1].sentence_count(), 3);
    }

    #[test]
    fn test_merge_respects_max_segment_size() {
        let mut sentences: Vec<_> = (0..5)
            .map(|i| sentence(i, &format!("Detail number {} about the importer.", i)))
            .collect();
        let mut lone = sentence(5, "Moving on.");
        lone.is_transition = true;
        sentences.push(lone);

        let config = SegmentationConfig {
            min_total_segments: 1,
            max_segment_sentences: 5,
            ..SegmentationConfig::default()
        };
        let segments = Segmenter::new(config, Lexicon::default()).unwrap().segment(&sentences);

        // The lone sentence cannot merge backward without exceeding the cap
        // and has no following segment, so it survives undersized.
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[1].sentence_count(), 1);
        assert_partition(&segments, 6);
    }

    #[test]
    fn test_segmentation_is_deterministic() {
        let mut sentences: Vec<_> = (0..10)
            .map(|i| sentence(i, &format!("Narration item number {} rolls along.", i)))
            .collect();
        sentences[5].is_transition = true;

        let s = segmenter();
        let first: Vec<(usize, usize)> = s
            .segment(&sentences)
            .iter()
            .map(|seg| (seg.start_sentence_index(), seg.end_sentence_index()))
            .collect();
        let second: Vec<(usize, usize)> = s
            .segment(&sentences)
            .iter()
            .map(|seg| (seg.start_sentence_index(), seg.end_sentence_index()))
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_config_rejects_bad_weights() {
        let config = SegmentationConfig {
            weight_pause: 0.9,
            ..SegmentationConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_rejects_inverted_sizes() {
        let config = SegmentationConfig {
            min_segment_sentences: 10,
            max_segment_sentences: 5,
            ..SegmentationConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
