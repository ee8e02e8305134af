//! Prompt construction for commit message generation.

use crate::commit::diff::DiffPayload;
use crate::notes::Note;

const TYPES: &str = "feat, fix, docs, style, refactor, perf, test, build, ci, chore, revert";

/// Build the model prompt from the change payload and developer notes.
///
/// Pure and deterministic: the same payload and notes always produce the
/// same text.
pub fn build_commit_prompt(payload: &DiffPayload, notes: &[Note]) -> String {
    let has_notes = !notes.is_empty();

    let framing = if payload.is_summary() {
        "The full diff is too large to include. Write a commit message for the \
         changes described by the following summary of changed files and line statistics."
    } else {
        "Write a commit message for the changes in the following diff."
    };

    let length_rule = if has_notes {
        "- Aim for about 50 characters, but you may go up to 100 characters when \
         needed to capture the developer context"
    } else {
        "- Keep the entire message under 50 characters"
    };

    let mut prompt = format!(
        r#"You are an expert software engineer writing a git commit message.

{framing}

## Rules
- Use the Conventional Commits format: type(scope): description
- Type must be one of: {TYPES}
- Scope is optional; when used, name the primary module or area affected
- Write the description in the present tense, imperative mood ("add", not "added")
- Respond with a single line only, no body and no explanation
- Do not wrap the message in quotes or backticks
- Do not include "git commit" or any other command text
{length_rule}
"#
    );

    if has_notes {
        prompt.push_str(
            "- The developer context below explains the intent behind these changes; \
             reflect it in the message even at the cost of brevity\n",
        );
        prompt.push_str("\n--- DEVELOPER CONTEXT ---\n");
        for note in notes {
            prompt.push_str("- ");
            prompt.push_str(&single_line(&note.message));
            prompt.push('\n');
        }
        prompt.push_str("--- END DEVELOPER CONTEXT ---\n");
    }

    let (open, close) = if payload.is_summary() {
        ("--- CHANGE SUMMARY ---", "--- END CHANGE SUMMARY ---")
    } else {
        ("--- DIFF ---", "--- END DIFF ---")
    };

    prompt.push('\n');
    prompt.push_str(open);
    prompt.push('\n');
    prompt.push_str(payload.text().trim_end());
    prompt.push('\n');
    prompt.push_str(close);
    prompt.push_str("\n\nCommit message:");

    prompt
}

/// Join a multi-line note into one line so it cannot break out of its block.
fn single_line(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
