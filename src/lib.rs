pub mod io;
pub mod knowledge;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod stages;
pub mod validate;

pub use io::{read_transcript, HumanDocument, MachineDocument};
pub use knowledge::{KnowledgeConfig, KnowledgeFetcher, KnowledgeSnippet};
pub use llm::{AnthropicClient, AnthropicConfig, StepGenerator, StepRequest};
pub use models::{
    AnnotatedSentence, ConfigError, DocumentStep, DraftStep, Lexicon, QualityIndicator,
    SpeakerRole, TokenUsage, TopicSegment, TranscriptMetadata,
};
pub use pipeline::{
    AnalysisReport, Pipeline, PipelineConfig, PipelineMetrics, PipelineOutcome, SegmentFailure,
};
pub use stages::{
    FilterConfig, Parser, ParserConfig, QASection, QaFilter, Ranker, RankingConfig,
    SegmentationConfig, Segmenter, TopicScore,
};
pub use validate::{
    ConfidenceConfig, ConfidenceEnhancer, StepValidator, ValidationConfig, ValidationResult,
};
