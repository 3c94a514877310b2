use tracing::info;

use crate::models::{ConfigError, SpeakerRole, TopicSegment};

/// Configuration for Q&A section filtering
#[derive(Debug, Clone)]
pub struct FilterConfig {
    /// Fraction of questions at or above which a segment counts as Q&A-dense
    pub min_qa_density: f64,
    /// Minimum absolute question count for a segment to count as Q&A-dense.
    /// Guards against dropping a two-sentence segment over a single question.
    pub min_questions: usize,
    /// Additionally drop segments not led by the instructor
    pub keep_instructor_only: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_qa_density: 0.30,
            min_questions: 2,
            keep_instructor_only: false,
        }
    }
}

impl FilterConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.min_qa_density) {
            return Err(ConfigError::OutOfRange {
                name: "min_qa_density",
                min: 0.0,
                max: 1.0,
                value: self.min_qa_density,
            });
        }
        Ok(())
    }
}

/// A question/answer section identified within the segment list
#[derive(Debug, Clone)]
pub struct QASection {
    pub segment_index: usize,
    pub start_sentence_index: usize,
    pub end_sentence_index: usize,
    pub question_count: usize,
    pub total_sentences: usize,
    pub qa_density: f64,
    pub primary_speaker: Option<String>,
}

/// Drop question/answer sections from the segment list, keeping only
/// procedural content. Relies entirely on parser annotations (`is_question`,
/// speaker roles), no text analysis of its own.
pub struct QaFilter {
    config: FilterConfig,
}

impl QaFilter {
    pub fn new(config: FilterConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// List the segments that qualify as Q&A-dense, without removing them
    pub fn identify_qa_sections(&self, segments: &[TopicSegment]) -> Vec<QASection> {
        segments
            .iter()
            .filter(|segment| self.is_qa_dense(segment))
            .map(|segment| QASection {
                segment_index: segment.segment_index,
                start_sentence_index: segment.start_sentence_index(),
                end_sentence_index: segment.end_sentence_index(),
                question_count: segment.question_count,
                total_sentences: segment.sentence_count(),
                qa_density: segment.qa_density(),
                primary_speaker: segment.primary_speaker.clone(),
            })
            .collect()
    }

    /// Remove Q&A-dense segments (and, when configured, segments not led by
    /// the instructor). Survivor order is unchanged and surviving segments
    /// keep their original `segment_index`.
    pub fn filter_segments(&self, segments: Vec<TopicSegment>) -> Vec<TopicSegment> {
        let before = segments.len();
        let filtered: Vec<TopicSegment> = segments
            .into_iter()
            .filter(|segment| {
                if self.is_qa_dense(segment) {
                    info!(
                        "Dropping Q&A segment {}: {}/{} questions",
                        segment.segment_index,
                        segment.question_count,
                        segment.sentence_count()
                    );
                    return false;
                }
                if self.config.keep_instructor_only && !self.is_instructor_led(segment) {
                    info!(
                        "Dropping non-instructor segment {} (primary: {:?})",
                        segment.segment_index, segment.primary_speaker
                    );
                    return false;
                }
                true
            })
            .collect();

        if filtered.len() < before {
            info!("Q&A filter kept {}/{} segments", filtered.len(), before);
        }
        filtered
    }

    fn is_qa_dense(&self, segment: &TopicSegment) -> bool {
        segment.qa_density() >= self.config.min_qa_density
            && segment.question_count >= self.config.min_questions
    }

    /// A segment is instructor-led when its primary speaker carries the
    /// instructor role. Without role annotations, fall back to the primary
    /// speaker's question rate: instructors mostly make statements.
    fn is_instructor_led(&self, segment: &TopicSegment) -> bool {
        let Some(primary) = &segment.primary_speaker else {
            // No speaker labels at all: nothing to hold against it
            return true;
        };

        let mut saw_role = false;
        for sentence in &segment.sentences {
            if sentence.speaker.as_ref() == Some(primary) {
                if let Some(role) = sentence.speaker_role {
                    saw_role = true;
                    if role == SpeakerRole::Instructor {
                        return true;
                    }
                }
            }
        }
        if saw_role {
            return false;
        }

        let primary_sentences: Vec<_> = segment
            .sentences
            .iter()
            .filter(|s| s.speaker.as_ref() == Some(primary))
            .collect();
        if primary_sentences.is_empty() {
            return true;
        }
        let questions = primary_sentences.iter().filter(|s| s.is_question).count();
        (questions as f64 / primary_sentences.len() as f64) < 0.2
    }
}
