use regex::Regex;

use crate::models::{AnnotatedSentence, ConfigError, Lexicon, SpeakerRole, TranscriptMetadata};

/// Configuration for transcript parsing
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Gap between sentence timestamps that counts as a long pause, seconds
    pub pause_threshold_seconds: f64,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            pause_threshold_seconds: 90.0,
        }
    }
}

impl ParserConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.pause_threshold_seconds.is_finite() || self.pause_threshold_seconds <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "pause_threshold_seconds must be positive, got {}",
                self.pause_threshold_seconds
            )));
        }
        Ok(())
    }
}

/// Parse raw transcripts into annotated sentences plus transcript metadata.
///
/// Handles multiple transcript conventions:
/// - Timestamps: `[HH:MM:SS]`, `(HH:MM:SS)`, `<HH:MM:SS>`, `HH:MM:SS -`,
///   bare `HH:MM:SS` at line start (optional `.mmm` fraction, ignored)
/// - Speakers: `Speaker 1:`, `Name:`, `[Name]:`, `>> Name:`, `**Name**:`
///
/// Parsing never fails: missing timestamps or speakers degrade to `None`
/// rather than erroring, and downstream stages lean on lexical signals when
/// temporal metadata is absent.
pub struct Parser {
    config: ParserConfig,
    timestamp_patterns: Vec<Regex>,
    speaker_patterns: Vec<Regex>,
    /// None when the lexicon has no transition patterns; the signal is
    /// skipped rather than matching everything
    transition_pattern: Option<Regex>,
    caps_emphasis: Regex,
    markup_emphasis: Regex,
    question_words: Vec<String>,
}

struct LineMeta {
    text: String,
    timestamp: Option<f64>,
    speaker: Option<String>,
    raw: String,
}

impl Parser {
    pub fn new(config: ParserConfig, lexicon: &Lexicon) -> Result<Self, ConfigError> {
        config.validate()?;

        let timestamp_patterns = [
            r"^\[(\d{1,2}):(\d{2}):(\d{2})(?:\.\d{1,3})?\]\s*",
            r"^\((\d{1,2}):(\d{2}):(\d{2})(?:\.\d{1,3})?\)\s*",
            r"^<(\d{1,2}):(\d{2}):(\d{2})(?:\.\d{1,3})?>?\s*",
            r"^(\d{1,2}):(\d{2}):(\d{2})(?:\.\d{1,3})?\s*-\s*",
            r"^(\d{1,2}):(\d{2}):(\d{2})(?:\.\d{1,3})?\s+",
        ]
        .iter()
        .map(|p| compile(p))
        .collect::<Result<Vec<_>, _>>()?;

        let speaker_patterns = [
            r"(?i)^(speaker\s*\d*)\s*:\s*",
            r"^([A-Z][A-Za-z]+)\s*:\s*",
            r"(?i)^\[(speaker\s*\d*|[A-Za-z]+)\]\s*:\s*",
            r"(?i)^>>\s*(speaker\s*\d*|[A-Za-z]+)\s*:\s*",
            r"(?i)^\*\*(speaker\s*\d*|[A-Za-z]+)\*\*\s*:\s*",
        ]
        .iter()
        .map(|p| compile(p))
        .collect::<Result<Vec<_>, _>>()?;

        let transition_pattern = if lexicon.transition_patterns.is_empty() {
            None
        } else {
            let joined = lexicon
                .transition_patterns
                .iter()
                .map(|p| format!("(?:{})", p))
                .collect::<Vec<_>>()
                .join("|");
            Some(compile(&format!("(?i){}", joined))?)
        };

        let caps_emphasis = compile(r"\b[A-Z]{3,}\b")?;
        let markup_emphasis = compile(r"\*\*[^*]+\*\*|__[^_]+__|[*_][^*_]+[*_]")?;

        Ok(Self {
            config,
            timestamp_patterns,
            speaker_patterns,
            transition_pattern,
            caps_emphasis,
            markup_emphasis,
            question_words: lexicon.question_words.clone(),
        })
    }

    /// Parse a raw transcript into annotated sentences and overall metadata.
    ///
    /// Process:
    /// 1. Scan lines, extracting timestamp and speaker before any cleaning
    /// 2. Split line text into sentences, forward-filling line metadata
    /// 3. Classify each sentence (question, transition, emphasis)
    /// 4. Compute relationships (long pauses, speaker changes)
    /// 5. Infer speaker roles and build transcript metadata
    pub fn parse(&self, raw_transcript: &str) -> (Vec<AnnotatedSentence>, TranscriptMetadata) {
        let lines = self.parse_lines(raw_transcript);
        if lines.is_empty() {
            return (Vec::new(), TranscriptMetadata::default());
        }

        let mut sentences = self.split_into_sentences(&lines);
        self.compute_relationships(&mut sentences);
        let metadata = self.build_metadata(&mut sentences);

        (sentences, metadata)
    }

    fn parse_lines(&self, raw_transcript: &str) -> Vec<LineMeta> {
        let mut lines = Vec::new();

        for line in raw_transcript.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let (timestamp, after_timestamp) = self.extract_timestamp(line);
            let (speaker, text) = self.extract_speaker(after_timestamp);

            lines.push(LineMeta {
                text: text.trim().to_string(),
                timestamp,
                speaker,
                raw: line.to_string(),
            });
        }

        lines
    }

    /// Extract a leading timestamp, returning seconds-from-start and the rest
    /// of the line
    fn extract_timestamp<'a>(&self, line: &'a str) -> (Option<f64>, &'a str) {
        for pattern in &self.timestamp_patterns {
            if let Some(captures) = pattern.captures(line) {
                let hours: f64 = captures[1].parse().unwrap_or(0.0);
                let minutes: f64 = captures[2].parse().unwrap_or(0.0);
                let seconds: f64 = captures[3].parse().unwrap_or(0.0);
                let total = hours * 3600.0 + minutes * 60.0 + seconds;
                let end = captures.get(0).map(|m| m.end()).unwrap_or(0);
                return (Some(total), &line[end..]);
            }
        }
        (None, line)
    }

    /// Extract a leading speaker label, returning the name and the rest of
    /// the line
    fn extract_speaker<'a>(&self, line: &'a str) -> (Option<String>, &'a str) {
        for pattern in &self.speaker_patterns {
            if let Some(captures) = pattern.captures(line) {
                let speaker = captures[1].to_string();
                let end = captures.get(0).map(|m| m.end()).unwrap_or(0);
                return (Some(speaker), &line[end..]);
            }
        }
        (None, line)
    }

    /// Split line text into sentences, each inheriting (and forward-filling)
    /// the nearest preceding timestamp and speaker
    fn split_into_sentences(&self, lines: &[LineMeta]) -> Vec<AnnotatedSentence> {
        let mut sentences = Vec::new();
        let mut last_timestamp: Option<f64> = None;
        let mut last_speaker: Option<String> = None;

        for line in lines {
            if line.timestamp.is_some() {
                last_timestamp = line.timestamp;
            }
            if line.speaker.is_some() {
                last_speaker = line.speaker.clone();
            }
            if line.text.is_empty() {
                continue;
            }

            for sentence_text in split_sentences(&line.text) {
                let cleaned = sentence_text.split_whitespace().collect::<Vec<_>>().join(" ");
                let index = sentences.len();
                sentences.push(AnnotatedSentence {
                    is_question: self.is_question(&cleaned),
                    is_transition: self
                        .transition_pattern
                        .as_ref()
                        .is_some_and(|p| p.is_match(&cleaned)),
                    has_emphasis: self.caps_emphasis.is_match(&cleaned)
                        || self.markup_emphasis.is_match(&cleaned),
                    text: cleaned,
                    raw_text: line.raw.clone(),
                    index,
                    timestamp_seconds: last_timestamp,
                    speaker: last_speaker.clone(),
                    speaker_role: None,
                    follows_long_pause: false,
                    speaker_changed: false,
                });
            }
        }

        sentences
    }

    fn is_question(&self, text: &str) -> bool {
        if text.trim_end().ends_with('?') {
            return true;
        }
        let lower = text.to_lowercase();
        let Some(first_word) = lower.split_whitespace().next() else {
            return false;
        };
        self.question_words.iter().any(|w| w == first_word)
    }

    fn compute_relationships(&self, sentences: &mut [AnnotatedSentence]) {
        for i in 1..sentences.len() {
            if let (Some(prev), Some(curr)) = (
                sentences[i - 1].timestamp_seconds,
                sentences[i].timestamp_seconds,
            ) {
                if curr - prev > self.config.pause_threshold_seconds {
                    sentences[i].follows_long_pause = true;
                }
            }

            if let (Some(prev), Some(curr)) =
                (&sentences[i - 1].speaker, &sentences[i].speaker)
            {
                if prev != curr {
                    sentences[i].speaker_changed = true;
                }
            }
        }
    }

    /// Assign speaker roles (most frequent speaker is the instructor) and
    /// aggregate transcript-level statistics
    fn build_metadata(&self, sentences: &mut [AnnotatedSentence]) -> TranscriptMetadata {
        if sentences.is_empty() {
            return TranscriptMetadata::default();
        }

        // First-seen order keeps the primary-speaker tie-break deterministic
        let mut speaker_counts: Vec<(String, usize)> = Vec::new();
        for sentence in sentences.iter() {
            let Some(speaker) = &sentence.speaker else {
                continue;
            };
            match speaker_counts.iter_mut().find(|(name, _)| name == speaker) {
                Some((_, count)) => *count += 1,
                None => speaker_counts.push((speaker.clone(), 1)),
            }
        }

        let primary_speaker =
            crate::models::segment::primary_of(&speaker_counts).map(str::to_string);
        let primary_speaker_ratio = primary_speaker
            .as_ref()
            .and_then(|name| speaker_counts.iter().find(|(n, _)| n == name))
            .map(|(_, count)| *count as f64 / sentences.len() as f64)
            .unwrap_or(0.0);

        for sentence in sentences.iter_mut() {
            if let Some(speaker) = &sentence.speaker {
                sentence.speaker_role = if Some(speaker) == primary_speaker.as_ref() {
                    Some(SpeakerRole::Instructor)
                } else {
                    Some(SpeakerRole::Participant)
                };
            }
        }

        let timestamps: Vec<f64> = sentences.iter().filter_map(|s| s.timestamp_seconds).collect();
        let duration_seconds = timestamps
            .iter()
            .cloned()
            .fold(None, |acc: Option<f64>, t| Some(acc.map_or(t, |a| a.max(t))));

        let question_count = sentences.iter().filter(|s| s.is_question).count();
        let transition_count = sentences.iter().filter(|s| s.is_transition).count();
        let has_qa_sections = sentences.iter().any(|s| s.is_participant_question());

        TranscriptMetadata {
            total_sentences: sentences.len(),
            total_speakers: speaker_counts.len(),
            speaker_names: speaker_counts.iter().map(|(name, _)| name.clone()).collect(),
            duration_seconds,
            has_timestamps: !timestamps.is_empty(),
            primary_speaker,
            primary_speaker_ratio,
            has_qa_sections,
            question_count,
            transition_count,
        }
    }
}

fn compile(pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern)
        .map_err(|e| ConfigError::Invalid(format!("invalid pattern '{}': {}", pattern, e)))
}

/// Split text into sentences: break after a run of `.!?` followed by
/// whitespace and an uppercase letter. Fragments of 3 characters or fewer are
/// dropped as artifacts.
fn split_sentences(text: &str) -> Vec<String> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut sentences = Vec::new();
    let mut start = 0usize;
    let mut i = 0usize;

    while i < chars.len() {
        let (_, c) = chars[i];
        if matches!(c, '.' | '!' | '?') {
            // Consume the terminator run
            let mut j = i + 1;
            while j < chars.len() && matches!(chars[j].1, '.' | '!' | '?') {
                j += 1;
            }
            // Skip whitespace after the run
            let mut k = j;
            while k < chars.len() && chars[k].1.is_whitespace() {
                k += 1;
            }
            let ends_with_space = j < chars.len() && chars[j].1.is_whitespace();
            if ends_with_space && k < chars.len() && chars[k].1.is_uppercase() {
                let end = chars[j].0;
                sentences.push(text[start..end].trim().to_string());
                start = chars[k].0;
                i = k;
                continue;
            }
            i = j;
        } else {
            i += 1;
        }
    }

    if start < text.len() {
        let tail = text[start..].trim();
        if !tail.is_empty() {
            sentences.push(tail.to_string());
        }
    }

    sentences.retain(|s| s.len() > 3);
    sentences
}
