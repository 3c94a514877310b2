use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Heuristic word and phrase tables used across the pipeline.
///
/// These are the most likely candidates for tuning, so they live as data
/// rather than inline literals: the whole table can be loaded from a JSON
/// file and versioned independently of the code.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Lexicon {
    /// Table format version, bumped when entries change meaning
    pub version: u32,
    /// Regex fragments matching topic-transition phrases
    pub transition_patterns: Vec<String>,
    /// Words that open a question when sentence-initial
    pub question_words: Vec<String>,
    /// Verbs that signal procedural instructions
    pub action_verbs: Vec<String>,
    /// Markers of sequence ("first", "next", "then", ...)
    pub sequence_indicators: Vec<String>,
    /// Words excluded from keyword extraction
    pub stopwords: Vec<String>,
}

impl Default for Lexicon {
    fn default() -> Self {
        Self {
            version: 1,
            transition_patterns: vec![
                // Explicit transitions
                r"\b(?:now|next|okay|alright|so),?\s+let'?s\s+".to_string(),
                r"\bmoving on\b".to_string(),
                r"\bnow (?:let's|we'll|we will)\b".to_string(),
                r"\bnext,?\s+(?:we'll|we're|we will|up|step|part|section)\b".to_string(),
                // Section markers
                r"\b(?:first|second|third|finally|lastly)\b".to_string(),
                r"\bstep \d+\b".to_string(),
                r"\bpart \d+\b".to_string(),
                // Topic introductions
                r"\blet'?s talk about\b".to_string(),
                r"\blet'?s discuss\b".to_string(),
                r"\blet'?s move (?:on )?to\b".to_string(),
                r"\bthe next (?:thing|topic|item)\b".to_string(),
            ],
            question_words: [
                "what", "when", "where", "who", "whom", "whose", "why", "how", "which", "can",
                "could", "would", "should", "is", "are", "do", "does", "did",
            ]
            .iter()
            .map(|w| w.to_string())
            .collect(),
            action_verbs: [
                // Navigation
                "navigate", "go", "open", "access", "visit", "browse",
                // Interaction
                "click", "select", "choose", "press", "tap", "hit",
                // Input
                "type", "enter", "input", "fill", "write", "paste",
                // Configuration
                "configure", "set", "enable", "disable", "change", "modify", "adjust", "update",
                "edit",
                // Creation
                "create", "add", "insert", "make", "build", "generate",
                // Management
                "delete", "remove", "clear", "reset", "restore", "save",
                // Verification
                "verify", "check", "confirm", "validate", "review", "test",
            ]
            .iter()
            .map(|w| w.to_string())
            .collect(),
            sequence_indicators: [
                "first", "second", "third", "next", "then", "after", "finally", "step", "now",
                "let's", "we'll", "going to",
            ]
            .iter()
            .map(|w| w.to_string())
            .collect(),
            stopwords: [
                "the", "and", "for", "with", "this", "that", "from", "will", "have", "your",
            ]
            .iter()
            .map(|w| w.to_string())
            .collect(),
        }
    }
}

impl Lexicon {
    /// Load a lexicon table from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read lexicon file: {:?}", path))?;
        serde_json::from_str(&content).context("Failed to parse lexicon JSON")
    }

    /// Extract content keywords: lowercased words longer than 3 characters,
    /// stopwords excluded
    pub fn keywords(&self, text: &str) -> HashSet<String> {
        text.to_lowercase()
            .split_whitespace()
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_string())
            .filter(|w| w.len() > 3 && !self.stopwords.iter().any(|s| s == w))
            .collect()
    }

    /// True when any action verb appears as a word of the text
    pub fn contains_action_verb(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        lower.split_whitespace().any(|w| {
            let w = w.trim_matches(|c: char| !c.is_alphanumeric());
            self.action_verbs.iter().any(|v| v == w)
        })
    }
}

/// Jaccard similarity between two keyword sets
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    intersection as f64 / union as f64
}
