use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::models::{DocumentStep, TokenUsage, TranscriptMetadata};
use crate::pipeline::PipelineOutcome;

/// Machine-readable document format
#[derive(Debug, Clone, Serialize)]
pub struct MachineDocument {
    pub title: String,
    pub generated_at: DateTime<Utc>,
    pub steps: Vec<DocumentStep>,
    pub failures: Vec<FailedSegment>,
    pub transcript: TranscriptMetadata,
    pub metrics: DocumentMetrics,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedSegment {
    pub segment_index: usize,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentMetrics {
    pub total_sentences: usize,
    pub total_segments: usize,
    pub surviving_segments: usize,
    pub steps_generated: usize,
    pub steps_rejected: usize,
    pub token_usage: TokenUsage,
}

impl MachineDocument {
    pub fn from_outcome(outcome: &PipelineOutcome) -> Self {
        Self {
            title: "Training Steps".to_string(),
            generated_at: Utc::now(),
            steps: outcome.steps.clone(),
            failures: outcome
                .failures
                .iter()
                .map(|f| FailedSegment {
                    segment_index: f.segment_index,
                    error: f.error.clone(),
                })
                .collect(),
            transcript: outcome.metadata.clone(),
            metrics: DocumentMetrics {
                total_sentences: outcome.metrics.total_sentences,
                total_segments: outcome.metrics.total_segments,
                surviving_segments: outcome.metrics.surviving_segments,
                steps_generated: outcome.metrics.steps_generated,
                steps_rejected: outcome.metrics.steps_rejected,
                token_usage: outcome.metrics.token_usage,
            },
        }
    }

    /// Write to a JSON file
    pub fn write_json(&self, path: &Path) -> Result<()> {
        info!("Writing machine document to {:?}", path);
        let file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create file: {:?}", path))?;
        serde_json::to_writer_pretty(file, self).context("Failed to write JSON")?;
        Ok(())
    }
}

/// Human-readable Markdown rendering of the step document
pub struct HumanDocument<'a> {
    outcome: &'a PipelineOutcome,
}

impl<'a> HumanDocument<'a> {
    pub fn new(outcome: &'a PipelineOutcome) -> Self {
        Self { outcome }
    }

    pub fn format(&self) -> String {
        let mut output = String::new();
        output.push_str("# Training Steps\n\n");

        if let Some(speaker) = &self.outcome.metadata.primary_speaker {
            output.push_str(&format!("Instructor: {}\n", speaker));
        }
        output.push_str(&format!(
            "Steps: {} (from {} transcript sentences)\n\n",
            self.outcome.steps.len(),
            self.outcome.metrics.total_sentences
        ));

        for step in &self.outcome.steps {
            output.push_str(&format!("## Step {}: {}\n\n", step.step_index + 1, step.title));
            if let Some(summary) = &step.summary {
                output.push_str(&format!("{}\n\n", summary));
            }
            if !step.details.is_empty() {
                output.push_str(&format!("{}\n\n", step.details));
            }
            if !step.actions.is_empty() {
                for (i, action) in step.actions.iter().enumerate() {
                    output.push_str(&format!("{}. {}\n", i + 1, action));
                }
                output.push('\n');
            }
            output.push_str(&format!(
                "*Confidence: {:.0}% ({})*\n\n",
                step.confidence_score * 100.0,
                step.quality_indicator
            ));
        }

        if !self.outcome.failures.is_empty() {
            output.push_str("## Skipped Segments\n\n");
            for failure in &self.outcome.failures {
                output.push_str(&format!(
                    "- Segment {}: {}\n",
                    failure.segment_index, failure.error
                ));
            }
            output.push('\n');
        }

        output
    }

    /// Write to a Markdown file
    pub fn write_file(&self, path: &Path) -> Result<()> {
        info!("Writing human document to {:?}", path);
        let mut file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create file: {:?}", path))?;
        write!(file, "{}", self.format())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::QualityIndicator;
    use crate::pipeline::{PipelineMetrics, SegmentFailure};

    fn outcome() -> PipelineOutcome {
        PipelineOutcome {
            steps: vec![DocumentStep {
                step_id: "s-1".to_string(),
                step_index: 0,
                title: "Configure billing alerts".to_string(),
                summary: Some("Set thresholds before exporting.".to_string()),
                details: "Alerts catch runaway exports early.".to_string(),
                actions: vec![
                    "Open the billing settings page".to_string(),
                    "Set the monthly threshold".to_string(),
                    "Save the configuration".to_string(),
                ],
                confidence_score: 0.82,
                quality_score: 0.75,
                quality_indicator: QualityIndicator::High,
                segment_index: 2,
                start_sentence_index: 8,
                end_sentence_index: 12,
            }],
            validations: Vec::new(),
            failures: vec![SegmentFailure {
                segment_index: 4,
                error: "persistent failure".to_string(),
            }],
            metadata: TranscriptMetadata {
                total_sentences: 13,
                primary_speaker: Some("Ana".to_string()),
                ..TranscriptMetadata::default()
            },
            metrics: PipelineMetrics {
                total_sentences: 13,
                total_segments: 5,
                surviving_segments: 3,
                steps_generated: 2,
                steps_rejected: 1,
                ..PipelineMetrics::default()
            },
        }
    }

    #[test]
    fn test_human_document_format() {
        let outcome = outcome();
        let text = HumanDocument::new(&outcome).format();
        assert!(text.contains("# Training Steps"));
        assert!(text.contains("## Step 1: Configure billing alerts"));
        assert!(text.contains("1. Open the billing settings page"));
        assert!(text.contains("*Confidence: 82% (high)*"));
        assert!(text.contains("- Segment 4: persistent failure"));
    }

    #[test]
    fn test_machine_document_round_trips_to_json() {
        let outcome = outcome();
        let doc = MachineDocument::from_outcome(&outcome);
        let json = serde_json::to_string_pretty(&doc).unwrap();
        assert!(json.contains("\"steps_rejected\": 1"));
        assert!(json.contains("\"quality_indicator\": \"high\""));
    }

    #[test]
    fn test_write_files() {
        let outcome = outcome();
        let dir = tempfile::tempdir().unwrap();

        let json_path = dir.path().join("doc.json");
        MachineDocument::from_outcome(&outcome).write_json(&json_path).unwrap();
        assert!(json_path.exists());

        let md_path = dir.path().join("doc.md");
        HumanDocument::new(&outcome).write_file(&md_path).unwrap();
        assert!(std::fs::read_to_string(&md_path).unwrap().contains("# Training Steps"));
    }
}
