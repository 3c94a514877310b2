use serde::{Deserialize, Serialize};

use super::lexicon::{jaccard, Lexicon};
use super::sentence::AnnotatedSentence;

/// A contiguous run of sentences judged to belong to one coherent topic.
///
/// Segments partition the parsed sentence sequence: every sentence belongs to
/// exactly one segment and segments are ordered by `segment_index`. Derived
/// metrics are computed once at creation and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicSegment {
    /// Unique identifier for this segment (UUID)
    pub segment_id: String,
    /// 0-based position among the final segments
    pub segment_index: usize,
    /// Sentences owned exclusively by this segment, in transcript order
    pub sentences: Vec<AnnotatedSentence>,
    /// First timestamp present in the segment, seconds from start
    pub start_timestamp: Option<f64>,
    /// Last timestamp present in the segment
    pub end_timestamp: Option<f64>,
    pub duration_seconds: Option<f64>,
    /// Most frequent speaker within the segment
    pub primary_speaker: Option<String>,
    /// Sentence counts per speaker, in first-seen order
    pub speaker_counts: Vec<(String, usize)>,
    /// First sentence is a transition phrase
    pub has_transition_start: bool,
    /// Contains at least one participant question
    pub has_qa_section: bool,
    pub question_count: usize,
    /// Fraction of sentences containing an action verb
    pub action_density: f64,
    /// Average pairwise keyword overlap between sentences. Absolute values
    /// are very low for lexical overlap; treat as ordinal, not calibrated.
    pub coherence_score: f64,
    /// Produced by the minimum-segment-count split rather than a natural
    /// boundary
    pub fallback_split: bool,
}

impl TopicSegment {
    /// Build a segment and compute its derived metrics
    pub fn from_sentences(
        segment_index: usize,
        sentences: Vec<AnnotatedSentence>,
        lexicon: &Lexicon,
        fallback_split: bool,
    ) -> Self {
        let timestamps: Vec<f64> = sentences.iter().filter_map(|s| s.timestamp_seconds).collect();
        let start_timestamp = timestamps.iter().cloned().fold(None, |acc: Option<f64>, t| {
            Some(acc.map_or(t, |a| a.min(t)))
        });
        let end_timestamp = timestamps.iter().cloned().fold(None, |acc: Option<f64>, t| {
            Some(acc.map_or(t, |a| a.max(t)))
        });
        let duration_seconds = match (start_timestamp, end_timestamp) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        };

        let speaker_counts = count_speakers(&sentences);
        let primary_speaker = primary_of(&speaker_counts).map(str::to_string);

        let has_transition_start = sentences.first().is_some_and(|s| s.is_transition);
        let question_count = sentences.iter().filter(|s| s.is_question).count();
        let has_qa_section = sentences.iter().any(|s| s.is_participant_question());

        let action_density = if sentences.is_empty() {
            0.0
        } else {
            let with_actions = sentences
                .iter()
                .filter(|s| lexicon.contains_action_verb(&s.text))
                .count();
            with_actions as f64 / sentences.len() as f64
        };

        let coherence_score = compute_coherence(&sentences, lexicon);

        Self {
            segment_id: uuid::Uuid::new_v4().to_string(),
            segment_index,
            sentences,
            start_timestamp,
            end_timestamp,
            duration_seconds,
            primary_speaker,
            speaker_counts,
            has_transition_start,
            has_qa_section,
            question_count,
            action_density,
            coherence_score,
            fallback_split,
        }
    }

    /// Concatenated text of all sentences
    pub fn text(&self) -> String {
        self.sentences
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn sentence_count(&self) -> usize {
        self.sentences.len()
    }

    /// Index of the first sentence in the original transcript
    pub fn start_sentence_index(&self) -> usize {
        self.sentences.first().map(|s| s.index).unwrap_or(0)
    }

    /// Index of the last sentence in the original transcript
    pub fn end_sentence_index(&self) -> usize {
        self.sentences.last().map(|s| s.index).unwrap_or(0)
    }

    /// Fraction of sentences that are questions
    pub fn qa_density(&self) -> f64 {
        if self.sentences.is_empty() {
            return 0.0;
        }
        self.question_count as f64 / self.sentences.len() as f64
    }
}

/// Count sentences per speaker preserving first-seen order, so ties resolve
/// deterministically
fn count_speakers(sentences: &[AnnotatedSentence]) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for sentence in sentences {
        let Some(speaker) = &sentence.speaker else {
            continue;
        };
        match counts.iter_mut().find(|(name, _)| name == speaker) {
            Some((_, count)) => *count += 1,
            None => counts.push((speaker.clone(), 1)),
        }
    }
    counts
}

/// Pick the speaker with the most sentences. Only a strictly greater count
/// displaces the incumbent, so ties go to the first speaker seen.
pub(crate) fn primary_of(counts: &[(String, usize)]) -> Option<&str> {
    let mut best: Option<(&str, usize)> = None;
    for (name, count) in counts {
        if best.is_none_or(|(_, top)| *count > top) {
            best = Some((name, *count));
        }
    }
    best.map(|(name, _)| name)
}

/// Average pairwise keyword similarity between sentences.
///
/// A single sentence is perfectly coherent; if no sentence pair has keywords
/// to compare, fall back to neutral 0.5.
fn compute_coherence(sentences: &[AnnotatedSentence], lexicon: &Lexicon) -> f64 {
    if sentences.len() < 2 {
        return 1.0;
    }

    let keyword_sets: Vec<_> = sentences.iter().map(|s| lexicon.keywords(&s.text)).collect();

    let mut similarities = Vec::new();
    for i in 0..keyword_sets.len() {
        for j in (i + 1)..keyword_sets.len() {
            if keyword_sets[i].is_empty() || keyword_sets[j].is_empty() {
                continue;
            }
            similarities.push(jaccard(&keyword_sets[i], &keyword_sets[j]));
        }
    }

    if similarities.is_empty() {
        return 0.5;
    }
    similarities.iter().sum::<f64>() / similarities.len() as f64
}
