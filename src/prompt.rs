// ABOUTME: System prompt loading — reads the `systemPrompt` field of a JSON file.
// ABOUTME: No file configured means an empty system prompt.

use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct SystemPromptFile {
    #[serde(rename = "systemPrompt", default)]
    system_prompt: String,
}

/// Load the system prompt from `path`, or return an empty prompt when unset.
pub fn load_system_prompt(path: Option<&Path>) -> anyhow::Result<String> {
    let Some(path) = path else {
        return Ok(String::new());
    };

    let data = fs::read_to_string(path)
        .with_context(|| format!("error reading system prompt file {}", path.display()))?;
    let file: SystemPromptFile = serde_json::from_str(&data)
        .with_context(|| format!("error parsing system prompt file {}", path.display()))?;
    Ok(file.system_prompt)
}
