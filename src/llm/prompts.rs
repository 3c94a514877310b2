use super::StepRequest;

/// System prompt for step generation (non-negotiable constraints)
pub const SYSTEM_PROMPT: &str = r#"You are an expert technical trainer turning session transcripts into step-by-step instructions. You MUST follow these rules:

1. Extract the step DIRECTLY from the transcript content - do not invent or generalize.
2. Use the exact phrases, button names, URLs, and terminology the transcript uses. If it says "Click on 'Create a resource'", write that exactly.
3. Every action must be grounded in something actually said in the transcript.
4. Ignore off-topic content (personal stories, scheduling chatter, tangents).
5. Output MUST be submitted through the provided tool, matching its schema.

Your step must be:
- Grounded in transcript content, not generic
- Clear, actionable, and in the order described
- Well-structured: title, summary, details, actions"#;

/// Build the user prompt for one segment
pub fn build_segment_prompt(request: &StepRequest) -> String {
    let mut prompt = String::new();

    prompt.push_str(&format!(
        "Create one step-by-step training instruction from transcript segment {} of {}.\n\n",
        request.position, request.total
    ));
    prompt.push_str(&format!("TARGET AUDIENCE: {}\n", request.audience));
    prompt.push_str(&format!("TONE: {}\n\n", request.tone));

    if !request.knowledge_snippets.is_empty() {
        prompt.push_str("## Reference Material\n");
        prompt.push_str("Use this only to verify terminology, never as a source of actions:\n\n");
        for (i, snippet) in request.knowledge_snippets.iter().enumerate() {
            prompt.push_str(&format!("### Source {}\n{}\n\n", i + 1, snippet));
        }
    }

    prompt.push_str("## Transcript Segment\n");
    prompt.push_str(&request.segment_text);
    prompt.push_str("\n\nSubmit the step with the submit_step tool.");

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> StepRequest {
        StepRequest {
            segment_text: "Click the export button. Then select CSV format.".to_string(),
            position: 2,
            total: 5,
            tone: "Professional".to_string(),
            audience: "Technical Users".to_string(),
            knowledge_snippets: vec!["Exports are limited to 10k rows.".to_string()],
        }
    }

    #[test]
    fn test_prompt_includes_segment_and_context() {
        let prompt = build_segment_prompt(&request());
        assert!(prompt.contains("segment 2 of 5"));
        assert!(prompt.contains("TARGET AUDIENCE: Technical Users"));
        assert!(prompt.contains("TONE: Professional"));
        assert!(prompt.contains("Click the export button."));
        assert!(prompt.contains("Exports are limited to 10k rows."));
    }

    #[test]
    fn test_prompt_omits_empty_knowledge_section() {
        let mut r = request();
        r.knowledge_snippets.clear();
        let prompt = build_segment_prompt(&r);
        assert!(!prompt.contains("Reference Material"));
    }
}
