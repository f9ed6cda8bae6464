use diffwise_core::constants::COMMENT_MARKER;
use diffwise_core::{DiffwiseError, IssueComment, PublishOutcome};
use tracing::info;

use crate::github::PullRequestTracker;

/// Body of the review comment: the marker on its own line, then the review.
///
/// # Examples
///
/// ```
/// use diffwise_review::publish::render_comment_body;
///
/// assert_eq!(
///     render_comment_body("Looks fine."),
///     "<!-- GPT-BOT-COMMENT -->\nLooks fine."
/// );
/// ```
pub fn render_comment_body(feedback: &str) -> String {
    format!("{COMMENT_MARKER}\n{feedback}")
}

/// First comment written by a bot account that carries the marker.
pub fn find_bot_comment(comments: &[IssueComment]) -> Option<&IssueComment> {
    comments.iter().find(|c| c.is_bot_review())
}

/// Put `feedback` on the pull request, keeping a single diffwise comment.
///
/// An earlier diffwise comment is overwritten in full; otherwise a new one
/// is created.
///
/// # Errors
///
/// Propagates GitHub API errors.
pub async fn publish_feedback(
    tracker: &dyn PullRequestTracker,
    pr_number: u64,
    feedback: &str,
) -> Result<PublishOutcome, DiffwiseError> {
    let body = render_comment_body(feedback);
    let comments = tracker.list_comments(pr_number).await?;

    match find_bot_comment(&comments) {
        Some(existing) => {
            tracker.update_comment(existing.id, &body).await?;
            info!(pr_number, comment_id = existing.id, "updated review comment");
            Ok(PublishOutcome::Updated {
                comment_id: existing.id,
            })
        }
        None => {
            let comment_id = tracker.create_comment(pr_number, &body).await?;
            info!(pr_number, comment_id, "created review comment");
            Ok(PublishOutcome::Created { comment_id })
        }
    }
}
