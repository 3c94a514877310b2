use futures_util::future::join_all;
use tracing::{info, warn};

use crate::knowledge::{KnowledgeConfig, KnowledgeFetcher};
use crate::llm::{StepGenerator, StepRequest};
use crate::models::{
    ConfigError, DocumentStep, DraftStep, Lexicon, TokenUsage, TopicSegment, TranscriptMetadata,
};
use crate::stages::{
    FilterConfig, Parser, ParserConfig, QASection, QaFilter, Ranker, RankingConfig,
    SegmentationConfig, Segmenter, TopicScore,
};
use crate::validate::{
    ConfidenceConfig, ConfidenceEnhancer, StepValidator, ValidationConfig, ValidationResult,
};

/// Top-level configuration for one pipeline instance.
///
/// Optional stages (Q&A filter, ranker, validator) run only when configured.
/// Everything is validated eagerly at construction.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub parser: ParserConfig,
    pub segmentation: SegmentationConfig,
    pub qa_filter: Option<FilterConfig>,
    pub ranking: Option<RankingConfig>,
    pub validation: Option<ValidationConfig>,
    pub confidence: ConfidenceConfig,
    pub knowledge: KnowledgeConfig,
    /// Desired writing tone for generated steps
    pub tone: String,
    /// Target audience for generated steps
    pub audience: String,
    /// Reference pages fetched once per run and offered to the generator
    pub knowledge_urls: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            parser: ParserConfig::default(),
            segmentation: SegmentationConfig::default(),
            qa_filter: Some(FilterConfig::default()),
            ranking: Some(RankingConfig::default()),
            validation: Some(ValidationConfig::default()),
            confidence: ConfidenceConfig::default(),
            knowledge: KnowledgeConfig::default(),
            tone: "Professional".to_string(),
            audience: "Technical Users".to_string(),
            knowledge_urls: Vec::new(),
        }
    }
}

/// A segment whose step generation failed even after the sequential retry
#[derive(Debug, Clone)]
pub struct SegmentFailure {
    pub segment_index: usize,
    pub error: String,
}

/// Counters for one pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineMetrics {
    pub total_sentences: usize,
    pub total_segments: usize,
    /// Segments remaining after Q&A filtering and ranking
    pub surviving_segments: usize,
    pub steps_generated: usize,
    /// Steps rejected by validation
    pub steps_rejected: usize,
    pub token_usage: TokenUsage,
}

/// Everything one run produces
#[derive(Debug)]
pub struct PipelineOutcome {
    /// Validated steps in segment order
    pub steps: Vec<DocumentStep>,
    /// One validation result per generated step, when the validator is
    /// configured
    pub validations: Vec<ValidationResult>,
    pub failures: Vec<SegmentFailure>,
    pub metadata: TranscriptMetadata,
    pub metrics: PipelineMetrics,
}

/// Segment-level report produced by `analyze`, no generator calls involved
#[derive(Debug)]
pub struct AnalysisReport {
    pub metadata: TranscriptMetadata,
    pub segments: Vec<SegmentSummary>,
    pub qa_sections: Vec<QASection>,
    pub scores: Vec<TopicScore>,
}

#[derive(Debug, Clone)]
pub struct SegmentSummary {
    pub segment_index: usize,
    pub sentence_count: usize,
    pub start_sentence_index: usize,
    pub end_sentence_index: usize,
    pub primary_speaker: Option<String>,
    pub action_density: f64,
    pub coherence_score: f64,
    pub question_count: usize,
    pub fallback_split: bool,
}

/// The full transcript-to-steps pipeline.
///
/// Parser, segmenter, filter, and ranker are pure, synchronous transforms
/// run once per transcript; only step generation and knowledge fetching
/// touch the network. Generic over the step generator so tests can run a
/// mock instead of the API client.
pub struct Pipeline<G> {
    config: PipelineConfig,
    lexicon: Lexicon,
    parser: Parser,
    segmenter: Segmenter,
    qa_filter: Option<QaFilter>,
    ranker: Option<Ranker>,
    validator: Option<StepValidator>,
    enhancer: ConfidenceEnhancer,
    fetcher: KnowledgeFetcher,
    generator: G,
}

impl<G: StepGenerator> Pipeline<G> {
    pub fn new(config: PipelineConfig, lexicon: Lexicon, generator: G) -> Result<Self, ConfigError> {
        let parser = Parser::new(config.parser.clone(), &lexicon)?;
        let segmenter = Segmenter::new(config.segmentation.clone(), lexicon.clone())?;
        let qa_filter = config
            .qa_filter
            .clone()
            .map(QaFilter::new)
            .transpose()?;
        let ranker = config
            .ranking
            .clone()
            .map(|c| Ranker::new(c, lexicon.clone()))
            .transpose()?;
        let validator = config
            .validation
            .clone()
            .map(StepValidator::new)
            .transpose()?;
        let enhancer = ConfidenceEnhancer::new(config.confidence.clone())?;
        let fetcher = KnowledgeFetcher::new(config.knowledge.clone())?;

        Ok(Self {
            config,
            lexicon,
            parser,
            segmenter,
            qa_filter,
            ranker,
            validator,
            enhancer,
            fetcher,
            generator,
        })
    }

    /// Run the full pipeline on one raw transcript.
    ///
    /// A transcript yielding zero surviving segments is a valid empty result.
    /// Generation failures that survive the sequential retry are recorded per
    /// segment; the rest of the batch still completes.
    pub async fn run(&self, raw_transcript: &str) -> PipelineOutcome {
        let (sentences, metadata) = self.parser.parse(raw_transcript);
        info!(
            "Parsed {} sentences from {} speakers",
            metadata.total_sentences, metadata.total_speakers
        );

        let segments = self.segmenter.segment(&sentences);
        let total_segments = segments.len();
        info!("Segmented into {} topic segments", total_segments);

        let mut surviving = segments;
        if let Some(filter) = &self.qa_filter {
            surviving = filter.filter_segments(surviving);
        }
        if let Some(ranker) = &self.ranker {
            surviving = ranker.rank_and_filter(surviving);
        }

        let mut metrics = PipelineMetrics {
            total_sentences: sentences.len(),
            total_segments,
            surviving_segments: surviving.len(),
            ..PipelineMetrics::default()
        };

        if surviving.is_empty() {
            info!("No segments survived filtering; returning empty result");
            return PipelineOutcome {
                steps: Vec::new(),
                validations: Vec::new(),
                failures: Vec::new(),
                metadata,
                metrics,
            };
        }

        let knowledge_snippets: Vec<String> = if self.config.knowledge_urls.is_empty() {
            Vec::new()
        } else {
            self.fetcher
                .fetch_urls(&self.config.knowledge_urls)
                .await
                .into_iter()
                .map(|s| s.text)
                .collect()
        };

        let requests: Vec<StepRequest> = surviving
            .iter()
            .enumerate()
            .map(|(i, segment)| StepRequest {
                segment_text: segment.text(),
                position: i + 1,
                total: surviving.len(),
                tone: self.config.tone.clone(),
                audience: self.config.audience.clone(),
                knowledge_snippets: knowledge_snippets.clone(),
            })
            .collect();

        let results = self.generate_all(&requests).await;

        let mut steps = Vec::new();
        let mut validations = Vec::new();
        let mut failures = Vec::new();

        for (segment, result) in surviving.iter().zip(results) {
            match result {
                Ok((draft, usage)) => {
                    metrics.token_usage.add(usage);
                    metrics.steps_generated += 1;
                    match self.finish_step(&draft, segment, &mut validations) {
                        Some(step) => steps.push(step),
                        None => metrics.steps_rejected += 1,
                    }
                }
                Err(e) => {
                    warn!("Segment {} failed: {}", segment.segment_index, e);
                    failures.push(SegmentFailure {
                        segment_index: segment.segment_index,
                        error: e.to_string(),
                    });
                }
            }
        }

        // Final numbering follows segment order, skipping rejected steps
        for (i, step) in steps.iter_mut().enumerate() {
            step.step_index = i;
        }

        info!(
            "Pipeline complete: {} steps, {} rejected, {} failures",
            steps.len(),
            metrics.steps_rejected,
            failures.len()
        );

        PipelineOutcome {
            steps,
            validations,
            failures,
            metadata,
            metrics,
        }
    }

    /// Parser and segmenter only, plus per-segment diagnostics. Never calls
    /// the generator.
    pub fn analyze(&self, raw_transcript: &str) -> AnalysisReport {
        let (sentences, metadata) = self.parser.parse(raw_transcript);
        let segments = self.segmenter.segment(&sentences);

        let qa_sections = match &self.qa_filter {
            Some(filter) => filter.identify_qa_sections(&segments),
            None => Vec::new(),
        };
        let scores = match &self.ranker {
            Some(ranker) => ranker.score_segments(&segments),
            None => Vec::new(),
        };

        let summaries = segments
            .iter()
            .map(|segment| SegmentSummary {
                segment_index: segment.segment_index,
                sentence_count: segment.sentence_count(),
                start_sentence_index: segment.start_sentence_index(),
                end_sentence_index: segment.end_sentence_index(),
                primary_speaker: segment.primary_speaker.clone(),
                action_density: segment.action_density,
                coherence_score: segment.coherence_score,
                question_count: segment.question_count,
                fallback_split: segment.fallback_split,
            })
            .collect();

        AnalysisReport {
            metadata,
            segments: summaries,
            qa_sections,
            scores,
        }
    }

    /// Scatter/gather with sequential fallback: await all generator calls
    /// concurrently; if any fails, discard that attempt entirely and rerun
    /// the same calls one at a time. Result order matches request order.
    async fn generate_all(
        &self,
        requests: &[StepRequest],
    ) -> Vec<anyhow::Result<(DraftStep, TokenUsage)>> {
        let concurrent =
            join_all(requests.iter().map(|r| self.generator.generate_step(r))).await;
        if concurrent.iter().all(|r| r.is_ok()) {
            return concurrent;
        }
        warn!("Concurrent step generation failed, retrying sequentially");

        let mut sequential = Vec::with_capacity(requests.len());
        for request in requests {
            sequential.push(self.generator.generate_step(request).await);
        }
        sequential
    }

    /// Validate a draft, enhance its confidence, and build the document step.
    /// Returns None when the validator rejects the draft.
    fn finish_step(
        &self,
        draft: &DraftStep,
        segment: &TopicSegment,
        validations: &mut Vec<ValidationResult>,
    ) -> Option<DocumentStep> {
        let source_confidence = self.source_confidence(draft, segment);

        let quality_score = match &self.validator {
            Some(validator) => {
                let result =
                    validator.validate(draft, segment.segment_index, source_confidence);
                let quality = result.quality_score;
                let valid = result.is_valid;
                validations.push(result);
                if !valid {
                    warn!(
                        "Step for segment {} failed validation",
                        segment.segment_index
                    );
                    return None;
                }
                quality
            }
            // Neutral quality when validation is disabled
            None => 0.5,
        };

        let confidence_score = self.enhancer.enhance(source_confidence, quality_score);
        let quality_indicator = self.enhancer.indicator_for(confidence_score);

        Some(DocumentStep {
            step_id: uuid::Uuid::new_v4().to_string(),
            step_index: 0,
            title: draft.title.clone(),
            summary: draft.summary.clone(),
            details: draft.details.clone(),
            actions: draft.actions.clone(),
            confidence_score,
            quality_score,
            quality_indicator,
            segment_index: segment.segment_index,
            start_sentence_index: segment.start_sentence_index(),
            end_sentence_index: segment.end_sentence_index(),
        })
    }

    /// Fraction of the draft step's keywords that appear in its originating
    /// segment. Proxy for how grounded the step is in what was actually said.
    fn source_confidence(&self, draft: &DraftStep, segment: &TopicSegment) -> f64 {
        let mut step_text = format!("{} {}", draft.title, draft.details);
        if let Some(summary) = &draft.summary {
            step_text.push(' ');
            step_text.push_str(summary);
        }
        for action in &draft.actions {
            step_text.push(' ');
            step_text.push_str(action);
        }

        let step_keywords = self.lexicon.keywords(&step_text);
        if step_keywords.is_empty() {
            return 0.0;
        }
        let segment_keywords = self.lexicon.keywords(&segment.text());
        let present = step_keywords
            .intersection(&segment_keywords)
            .count();
        present as f64 / step_keywords.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use anyhow::bail;

    use super::*;

    /// Builds a plausible step by echoing the segment text, so source
    /// confidence comes out high
    struct EchoGenerator;

    fn echo_step(request: &StepRequest) -> (DraftStep, TokenUsage) {
        let actions: Vec<String> = request
            .segment_text
            .split(". ")
            .map(|s| s.trim_end_matches('.').to_string())
            .filter(|s| !s.is_empty())
            .take(4)
            .collect();
        let step = DraftStep {
            title: format!("Work through topic {}", request.position),
            summary: None,
            details: request.segment_text.clone(),
            actions,
        };
        let usage = TokenUsage {
            input_tokens: 100,
            output_tokens: 50,
            total_tokens: 150,
        };
        (step, usage)
    }

    impl StepGenerator for EchoGenerator {
        async fn generate_step(&self, request: &StepRequest) -> anyhow::Result<(DraftStep, TokenUsage)> {
            Ok(echo_step(request))
        }
    }

    /// Fails every call of the first (concurrent) attempt, succeeds after
    struct FlakyGenerator {
        calls: AtomicUsize,
        fail_first: usize,
    }

    impl StepGenerator for FlakyGenerator {
        async fn generate_step(&self, request: &StepRequest) -> anyhow::Result<(DraftStep, TokenUsage)> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.fail_first {
                bail!("transient failure on call {}", n);
            }
            Ok(echo_step(request))
        }
    }

    /// Always fails for one specific segment position
    struct PartialGenerator {
        failing_position: usize,
    }

    impl StepGenerator for PartialGenerator {
        async fn generate_step(&self, request: &StepRequest) -> anyhow::Result<(DraftStep, TokenUsage)> {
            if request.position == self.failing_position {
                bail!("persistent failure");
            }
            Ok(echo_step(request))
        }
    }

    fn transcript() -> String {
        let mut lines = Vec::new();
        let topics = [
            "billing dashboard widgets and layout",
            "exporting invoices from the billing page",
            "configuring alert thresholds for exports",
        ];
        for (t, topic) in topics.iter().enumerate() {
            if t > 0 {
                lines.push(format!("Ana: Now let's talk about {}.", topic));
            } else {
                lines.push(format!("Ana: Today we cover {}.", topic));
            }
            for k in 0..3 {
                lines.push(format!(
                    "Ana: Click the option number {} related to {}.",
                    k, topic
                ));
            }
        }
        lines.join("\n")
    }

    fn config() -> PipelineConfig {
        PipelineConfig {
            // Small fixture transcripts should not be force-split
            segmentation: SegmentationConfig {
                min_total_segments: 1,
                ..SegmentationConfig::default()
            },
            ..PipelineConfig::default()
        }
    }

    #[tokio::test]
    async fn test_run_produces_steps_in_segment_order() {
        let pipeline = Pipeline::new(config(), Lexicon::default(), EchoGenerator).unwrap();
        let outcome = pipeline.run(&transcript()).await;

        assert!(outcome.failures.is_empty());
        assert!(!outcome.steps.is_empty());
        for (i, step) in outcome.steps.iter().enumerate() {
            assert_eq!(step.step_index, i);
            assert!((0.0..=1.0).contains(&step.confidence_score));
            if i > 0 {
                assert!(step.segment_index > outcome.steps[i - 1].segment_index);
            }
        }
        assert_eq!(outcome.metrics.steps_generated, outcome.steps.len());
        assert!(outcome.metrics.token_usage.total_tokens > 0);
    }

    #[tokio::test]
    async fn test_concurrent_failure_falls_back_to_sequential() {
        let generator = FlakyGenerator {
            calls: AtomicUsize::new(0),
            // One failed call poisons the whole concurrent attempt
            fail_first: 1,
        };
        let pipeline = Pipeline::new(config(), Lexicon::default(), generator).unwrap();
        let outcome = pipeline.run(&transcript()).await;

        // Sequential retry succeeds for every segment
        assert!(outcome.failures.is_empty());
        assert!(!outcome.steps.is_empty());
    }

    #[tokio::test]
    async fn test_persistent_failure_is_isolated() {
        let generator = PartialGenerator {
            failing_position: 1,
        };
        let pipeline = Pipeline::new(config(), Lexicon::default(), generator).unwrap();
        let outcome = pipeline.run(&transcript()).await;

        assert_eq!(outcome.failures.len(), 1);
        assert!(!outcome.steps.is_empty());
        // Remaining steps are still numbered contiguously from zero
        for (i, step) in outcome.steps.iter().enumerate() {
            assert_eq!(step.step_index, i);
        }
        // Validations stay keyed by segment index, which the renumbering
        // above never touches
        assert_eq!(outcome.validations.len(), outcome.steps.len());
        for (step, validation) in outcome.steps.iter().zip(&outcome.validations) {
            assert_eq!(validation.segment_index, step.segment_index);
        }
    }

    #[tokio::test]
    async fn test_empty_transcript_is_a_valid_empty_result() {
        let pipeline = Pipeline::new(config(), Lexicon::default(), EchoGenerator).unwrap();
        let outcome = pipeline.run("").await;
        assert!(outcome.steps.is_empty());
        assert!(outcome.failures.is_empty());
        assert_eq!(outcome.metrics.total_segments, 0);
    }

    #[test]
    fn test_bad_config_rejected_at_construction() {
        let mut config = config();
        config.segmentation.weight_pause = 0.9;
        let result = Pipeline::new(config, Lexicon::default(), EchoGenerator);
        assert!(result.is_err());
    }

    #[test]
    fn test_analyze_reports_without_generation() {
        let pipeline = Pipeline::new(config(), Lexicon::default(), EchoGenerator).unwrap();
        let report = pipeline.analyze(&transcript());

        assert!(!report.segments.is_empty());
        assert_eq!(report.scores.len(), report.segments.len());
        assert_eq!(report.metadata.primary_speaker.as_deref(), Some("Ana"));
    }
}
