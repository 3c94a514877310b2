use std::path::Path;

use anyhow::{Context, Result};

/// Read a raw transcript file. Normalizes Windows line endings; everything
/// else is the parser's problem.
pub fn read_transcript(path: &Path) -> Result<String> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read transcript: {:?}", path))?;
    Ok(content.replace("\r\n", "\n"))
}
