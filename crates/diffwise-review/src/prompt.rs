use diffwise_core::DiffwiseError;
use tracing::{info, warn};

use crate::llm::{ChatMessage, CompletionClient};

const REVIEW_PREAMBLE: &str = "Check this PR code, find logic issues that are not easily found by SonarQube, order them by severity.";

/// Build the instruction sent to the model for a diff.
///
/// The diff is embedded verbatim, without fencing, so the model sees exactly
/// what git printed.
///
/// # Examples
///
/// ```
/// use diffwise_review::prompt::build_review_prompt;
///
/// let prompt = build_review_prompt("+let x = 1;");
/// assert!(prompt.starts_with("Check this PR code"));
/// assert!(prompt.contains("+let x = 1;"));
/// ```
pub fn build_review_prompt(diff: &str) -> String {
    format!("{REVIEW_PREAMBLE}\nPlease review the following diff:\n{diff}\n\n")
}

/// Ask `client` to review `diff` with `model`.
///
/// Returns the trimmed text of the first choice, or an empty string when the
/// provider returned no content.
///
/// # Errors
///
/// Propagates any error from the completion client; nothing is retried.
pub async fn request_review(
    client: &dyn CompletionClient,
    model: &str,
    diff: &str,
) -> Result<String, DiffwiseError> {
    let prompt = build_review_prompt(diff);
    info!(model, diff_bytes = diff.len(), "requesting review");

    let content = client.chat(model, vec![ChatMessage::user(prompt)]).await?;
    let feedback = content.as_deref().map(str::trim).unwrap_or_default();
    if feedback.is_empty() {
        warn!(model, "completion returned no content");
    }
    Ok(feedback.to_string())
}
