use serde::{Deserialize, Serialize};

/// Role inferred for a speaker from how often they hold the floor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeakerRole {
    /// The most frequent speaker, assumed to be leading the session
    Instructor,
    /// Everyone else (asking questions, interjecting)
    Participant,
}

/// One sentence of the transcript with parser annotations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotatedSentence {
    /// Cleaned sentence text (timestamp and speaker label stripped)
    pub text: String,
    /// The source line as written, including any timestamp/speaker markup
    pub raw_text: String,
    /// 0-based position in the transcript, strictly increasing and contiguous
    pub index: usize,
    /// Seconds from transcript start, forward-filled from the nearest
    /// preceding timestamped line
    pub timestamp_seconds: Option<f64>,
    /// Speaker label as written (e.g. "Speaker 1", "John"), forward-filled
    pub speaker: Option<String>,
    /// Inferred role; None when the transcript carries no speaker labels
    pub speaker_role: Option<SpeakerRole>,
    /// Ends with "?" or starts with a question word
    pub is_question: bool,
    /// Matches a transition phrase ("now let's", "moving on", ...)
    pub is_transition: bool,
    /// Carries emphasis markers (ALL CAPS words, **bold**, _italic_)
    pub has_emphasis: bool,
    /// Gap to the previous sentence's timestamp exceeds the pause threshold
    pub follows_long_pause: bool,
    /// Speaker differs from the previous sentence's speaker
    pub speaker_changed: bool,
}

impl AnnotatedSentence {
    /// True when this sentence was spoken by a participant asking a question
    pub fn is_participant_question(&self) -> bool {
        self.is_question && self.speaker_role == Some(SpeakerRole::Participant)
    }
}

/// Aggregate statistics over one parsed transcript
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranscriptMetadata {
    pub total_sentences: usize,
    pub total_speakers: usize,
    pub speaker_names: Vec<String>,
    /// Max timestamp seen, if the transcript carries timestamps
    pub duration_seconds: Option<f64>,
    pub has_timestamps: bool,
    /// Most frequent speaker (likely the instructor)
    pub primary_speaker: Option<String>,
    /// Fraction of sentences attributed to the primary speaker
    pub primary_speaker_ratio: f64,
    /// True when any participant question was detected
    pub has_qa_sections: bool,
    pub question_count: usize,
    pub transition_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_participant_question() {
        let mut sentence = AnnotatedSentence {
            text: "What does that button do".to_string(),
            raw_text: "What does that button do".to_string(),
            index: 0,
            timestamp_seconds: None,
            speaker: Some("Maria".to_string()),
            speaker_role: Some(SpeakerRole::Participant),
            is_question: true,
            is_transition: false,
            has_emphasis: false,
            follows_long_pause: false,
            speaker_changed: false,
        };
        assert!(sentence.is_participant_question());

        sentence.speaker_role = Some(SpeakerRole::Instructor);
        assert!(!sentence.is_participant_question());
    }
}
