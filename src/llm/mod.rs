pub mod client;
pub mod prompts;

pub use client::*;
pub use prompts::*;

use anyhow::Result;

use crate::models::{DraftStep, TokenUsage};

/// Inputs for generating one draft step from a topic segment
#[derive(Debug, Clone)]
pub struct StepRequest {
    /// Full text of the segment, transcript order
    pub segment_text: String,
    /// 1-based position among the surviving segments, for the prompt
    pub position: usize,
    /// Total surviving segments
    pub total: usize,
    /// Desired writing tone (e.g. "Professional")
    pub tone: String,
    /// Target audience (e.g. "Technical Users")
    pub audience: String,
    /// Reference snippets fetched from knowledge URLs
    pub knowledge_snippets: Vec<String>,
}

/// Draft-step generation seam, so the pipeline can run against a mock in
/// tests instead of the network
pub trait StepGenerator {
    fn generate_step(
        &self,
        request: &StepRequest,
    ) -> impl std::future::Future<Output = Result<(DraftStep, TokenUsage)>>;
}
