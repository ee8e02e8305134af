//! Commit message generation and output normalization.

use tracing::debug;

use crate::error::GenerationError;
use crate::llm::LanguageModel;

/// Echoed command prefixes the model sometimes emits, lowercase.
const COMMAND_PREFIXES: &[&str] = &["git commit -m", "git commit --message=", "git commit "];

const QUOTE_CHARS: &[char] = &['"', '\'', '`'];

/// Ask the model for a message and reduce its answer to one clean line.
pub async fn generate_commit_message<L: LanguageModel + ?Sized>(
    llm: &L,
    prompt: &str,
) -> Result<String, GenerationError> {
    let raw = llm.generate(prompt).await?;
    debug!("Raw model response: {:?}", raw);

    let message = normalize_message(&raw);
    if message.is_empty() {
        return Err(GenerationError::EmptyResponse);
    }

    Ok(message)
}

/// Reduce raw model output to a single commit message line.
///
/// Takes the first line with content (skipping bare fence lines), trims it,
/// and repeatedly strips echoed `git commit` prefixes, inline fences and
/// wrapping quote pairs until nothing changes, so the result is stable under
/// re-application.
pub fn normalize_message(raw: &str) -> String {
    let line = raw
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty() && !is_fence_line(l))
        .unwrap_or("");

    let mut current = line.to_string();
    loop {
        let next = strip_fence(strip_quotes(strip_command_prefix(&current)))
            .trim()
            .to_string();
        if next == current {
            return current;
        }
        current = next;
    }
}

fn strip_command_prefix(text: &str) -> &str {
    let lower = text.to_ascii_lowercase();
    for prefix in COMMAND_PREFIXES {
        if lower.starts_with(prefix) {
            return text[prefix.len()..].trim_start();
        }
    }
    text
}

/// A line holding only a fence: "```" with an optional one-word language tag.
fn is_fence_line(line: &str) -> bool {
    line.strip_prefix("```").is_some_and(|tag| {
        tag.chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '+' | '.'))
    })
}

fn strip_fence(text: &str) -> &str {
    let text = if text.starts_with("```") {
        text.trim_start_matches('`')
    } else {
        text
    };
    if text.ends_with("```") {
        text.trim_end_matches('`')
    } else {
        text
    }
}

fn strip_quotes(text: &str) -> &str {
    let mut chars = text.chars();
    match (chars.next(), chars.next_back()) {
        (Some(first), Some(last)) if first == last && QUOTE_CHARS.contains(&first) => {
            &text[first.len_utf8()..text.len() - last.len_utf8()]
        }
        _ => text,
    }
}
